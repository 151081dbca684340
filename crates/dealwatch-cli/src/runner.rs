//! Target runner: fetch → extract → decide → notify → persist, per target.
//!
//! Each target runs to completion independently. Failures are folded into
//! a [`TargetOutcome`] so one broken target never aborts the batch, and the
//! batch reports outcomes in configuration order regardless of concurrency.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use dealwatch_core::{
    decide, message, PersistedState, SignalOutcome, TargetConfig, TargetEntry, TransitionPolicy,
};
use dealwatch_notify::Notifier;
use dealwatch_scraper::{
    extractor_for, CatalogOptions, DocumentFetcher, ScraperError, SignalExtractor,
};
use dealwatch_store::StateStore;

/// Where notifications go.
pub enum Delivery {
    /// Compute and print, never send or persist.
    DryRun,
    Live(Box<dyn Notifier>),
}

impl Delivery {
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Delivery::DryRun)
    }
}

/// Everything a batch needs, built once per invocation.
pub struct RunContext {
    pub fetcher: DocumentFetcher,
    pub store: StateStore,
    pub delivery: Delivery,
    pub policy: TransitionPolicy,
    pub catalog: CatalogOptions,
    /// Send a short notice when a target ends in `ERROR` (live mode only).
    pub notify_on_error: bool,
    /// Total attempts of the fetch+extract unit on transient failures.
    pub max_attempts: u32,
    pub retry_sleep: Duration,
    /// Targets polled at once; 1 is strictly sequential.
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    NoChange,
    Notify(usize),
    WouldNotify(usize),
    Error(String),
}

impl TargetOutcome {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, TargetOutcome::Error(_))
    }
}

impl fmt::Display for TargetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetOutcome::NoChange => f.write_str("NO_CHANGE"),
            TargetOutcome::Notify(n) => write!(f, "NOTIFY ({n} items)"),
            TargetOutcome::WouldNotify(n) => write!(f, "WOULD_NOTIFY ({n} items)"),
            TargetOutcome::Error(detail) => write!(f, "ERROR {detail}"),
        }
    }
}

/// Result of one target, plus any dry-run message bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub id: String,
    pub outcome: TargetOutcome,
    pub previews: Vec<String>,
}

impl TargetReport {
    /// `<id>: <OUTCOME>`
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!("{}: {}", self.id, self.outcome)
    }

    /// Summary line followed by any dry-run message bodies.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self.summary_line();
        for text in &self.previews {
            out.push_str(&format!("\n[DRY_RUN] Would send for {}:\n{text}", self.id));
        }
        out
    }
}

/// Runs every entry, at most `ctx.max_concurrent` at a time, and returns
/// reports in input order.
pub async fn run_batch(ctx: &RunContext, entries: &[TargetEntry]) -> Vec<TargetReport> {
    stream::iter(entries)
        .map(|entry| run_target(ctx, entry))
        .buffered(ctx.max_concurrent.max(1))
        .collect()
        .await
}

/// Drives one target through a full poll.
pub async fn run_target(ctx: &RunContext, entry: &TargetEntry) -> TargetReport {
    let id = entry.display_id();
    let target = match entry.validate() {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(target_id = %id, error = %e, "skipping target");
            return finish_with_error(ctx, id, e.to_string()).await;
        }
    };

    let previous = ctx.store.load(&target.key);

    let signal = match poll_with_retry(ctx, &target).await {
        Ok(signal) => signal,
        Err(e) => {
            tracing::error!(target_id = %id, error = %e, "poll failed after retries");
            return finish_with_error(ctx, id, e.to_string()).await;
        }
    };

    let observation = match signal {
        SignalOutcome::Observed(observation) => observation,
        SignalOutcome::NoSignal(reason) => {
            tracing::info!(target_id = %id, reason = %reason, "no usable signal, state left untouched");
            return TargetReport {
                id,
                outcome: TargetOutcome::NoChange,
                previews: Vec::new(),
            };
        }
    };

    let transition = decide(&target, &previous, &observation, &ctx.policy, Utc::now());
    tracing::info!(
        target_id = %id,
        kind = ?transition.kind,
        favorable = observation.condition.favorable,
        signature = %observation.condition.signature,
        "target polled"
    );
    let count = transition.notifications.len();

    match &ctx.delivery {
        Delivery::DryRun => TargetReport {
            id,
            outcome: if count == 0 {
                TargetOutcome::NoChange
            } else {
                TargetOutcome::WouldNotify(count)
            },
            previews: transition.notifications,
        },
        Delivery::Live(notifier) => {
            for text in &transition.notifications {
                if let Err(e) = notifier.send(text).await {
                    // State is still persisted below so the next run does not
                    // repeat the alert.
                    tracing::error!(target_id = %id, error = %e, "notification delivery failed");
                }
            }
            if let Err(e) = persist(&ctx.store, &target, &transition.next_state) {
                return finish_with_error(ctx, id, e).await;
            }
            TargetReport {
                id,
                outcome: if count == 0 {
                    TargetOutcome::NoChange
                } else {
                    TargetOutcome::Notify(count)
                },
                previews: Vec::new(),
            }
        }
    }
}

/// Fetch + extract, retried on transient failures with a fixed sleep.
///
/// Non-transient fetch failures (bot wall, bad status, wrong content type,
/// unparsable body) become `NoSignal` right away.
async fn poll_with_retry(
    ctx: &RunContext,
    target: &TargetConfig,
) -> Result<SignalOutcome, ScraperError> {
    let max_attempts = ctx.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match poll_once(ctx, target).await {
            Err(e) if e.is_transient() && attempt < max_attempts => {
                tracing::warn!(
                    target_id = %target.id,
                    attempt,
                    max_attempts,
                    delay_secs = ctx.retry_sleep.as_secs(),
                    error = %e,
                    "transient failure, retrying target"
                );
                tokio::time::sleep(ctx.retry_sleep).await;
                attempt += 1;
            }
            Err(e) if !e.is_transient() => {
                tracing::warn!(target_id = %target.id, error = %e, "document unusable this cycle");
                return Ok(SignalOutcome::NoSignal(e.to_string()));
            }
            other => return other,
        }
    }
}

async fn poll_once(ctx: &RunContext, target: &TargetConfig) -> Result<SignalOutcome, ScraperError> {
    let document = ctx.fetcher.fetch_document(target, &ctx.catalog).await?;
    extractor_for(target).extract(&document)
}

fn persist(store: &StateStore, target: &TargetConfig, state: &PersistedState) -> Result<(), String> {
    store.save(&target.key, state).map_err(|e| {
        tracing::error!(target_id = %target.id, error = %e, "failed to persist state");
        format!("failed to persist state: {e}")
    })
}

/// Builds an `ERROR` report, sending the optional notice first.
async fn finish_with_error(ctx: &RunContext, id: String, detail: String) -> TargetReport {
    if ctx.notify_on_error {
        if let Delivery::Live(notifier) = &ctx.delivery {
            if let Err(e) = notifier.send(&message::error_notice(&id, &detail)).await {
                tracing::warn!(target_id = %id, error = %e, "error notice not delivered");
            }
        }
    }
    TargetReport {
        id,
        outcome: TargetOutcome::Error(detail),
        previews: Vec::new(),
    }
}
