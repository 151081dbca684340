//! Linear-backoff retry for transient fetch failures.
//!
//! Only errors for which [`ScraperError::is_transient`] holds are retried.
//! Bot walls, bad statuses and unparsable bodies are returned on the first
//! attempt: they mean "no usable document this cycle", not "try again".

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Executes `operation` up to `max_attempts` times in total.
///
/// After the n-th failed attempt (1-based) the wait is `backoff_secs × n`:
///
/// | Attempt | Sleep before next attempt |
/// |---------|---------------------------|
/// | 1       | 1 × backoff               |
/// | 2       | 2 × backoff               |
/// | 3       | none, last error returned |
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    backoff_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= max_attempts {
                    return Err(err);
                }
                let delay_secs = backoff_secs.saturating_mul(u64::from(attempt));
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_secs,
                    error = %err,
                    "transient fetch error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                attempt += 1;
            }
        }
    }
}
