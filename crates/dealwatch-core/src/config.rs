use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; defaults mirror the values the watcher has
/// always run with (25 s timeout, 3 attempts, 3 s backoff unit, top 5 deals).
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let non_empty = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_flag = |var: &str| -> bool { lookup(var).is_ok_and(|v| parse_bool(&v)) };

    let targets_path = PathBuf::from(or_default(
        "DEALWATCH_TARGETS_PATH",
        "./config/targets.yaml",
    ));
    let state_dir = PathBuf::from(or_default("DEALWATCH_STATE_DIR", "./data"));
    let log_level = or_default("DEALWATCH_LOG_LEVEL", "info");

    // `DRY_RUN` is the historical name; either one switches dry-run on.
    let dry_run = parse_flag("DEALWATCH_DRY_RUN") || parse_flag("DRY_RUN");
    let notify_on_end = parse_flag("DEALWATCH_NOTIFY_ON_END");
    let notify_on_error = parse_flag("DEALWATCH_NOTIFY_ON_ERROR");

    let request_timeout_secs = parse_u64("DEALWATCH_REQUEST_TIMEOUT_SECS", "25")?;
    let user_agent = or_default("DEALWATCH_USER_AGENT", DEFAULT_USER_AGENT);
    let fetch_max_attempts = parse_u32("DEALWATCH_FETCH_MAX_ATTEMPTS", "3")?;
    let fetch_backoff_secs = parse_u64("DEALWATCH_FETCH_BACKOFF_SECS", "3")?;
    let runner_max_attempts = parse_u32("DEALWATCH_RUNNER_MAX_ATTEMPTS", "3")?;
    let runner_retry_sleep_secs = parse_u64("DEALWATCH_RUNNER_RETRY_SLEEP_SECS", "3")?;
    let top_n = parse_usize("DEALWATCH_TOP_N", "5")?;
    let catalog_page_limit = parse_u32("DEALWATCH_CATALOG_PAGE_LIMIT", "250")?;
    let catalog_max_pages = parse_usize("DEALWATCH_CATALOG_MAX_PAGES", "10")?;
    let max_concurrent_targets = parse_usize("DEALWATCH_MAX_CONCURRENT_TARGETS", "1")?;

    for (var, value) in [
        ("DEALWATCH_FETCH_MAX_ATTEMPTS", fetch_max_attempts),
        ("DEALWATCH_RUNNER_MAX_ATTEMPTS", runner_max_attempts),
    ] {
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
    }

    let telegram_bot_token = non_empty("TELEGRAM_BOT_TOKEN");
    let telegram_chat_id = non_empty("TELEGRAM_CHAT_ID");

    Ok(AppConfig {
        targets_path,
        state_dir,
        log_level,
        dry_run,
        notify_on_end,
        notify_on_error,
        request_timeout_secs,
        user_agent,
        fetch_max_attempts,
        fetch_backoff_secs,
        runner_max_attempts,
        runner_retry_sleep_secs,
        top_n,
        catalog_page_limit,
        catalog_max_pages,
        max_concurrent_targets,
        telegram_bot_token,
        telegram_chat_id,
    })
}

/// Interprets the usual truthy spellings: `1`, `true`, `yes`, `y`, `on`.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
