//! Handlers behind each CLI sub-command. They return their stdout text so
//! `main` stays a thin dispatcher.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use dealwatch_core::{load_targets, sanitize_target_key, AppConfig, ConfigError, TransitionPolicy};
use dealwatch_notify::TelegramNotifier;
use dealwatch_scraper::{CatalogOptions, DocumentFetcher};
use dealwatch_store::StateStore;

use crate::runner::{run_batch, Delivery, RunContext, TargetReport};

/// Options for `dealwatch run`.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub target: Option<String>,
}

/// Builds the shared run context from configuration.
///
/// # Errors
///
/// Fails when live delivery is requested without Telegram credentials, or
/// when an HTTP client cannot be built.
pub fn build_context(config: &AppConfig, dry_run: bool) -> anyhow::Result<RunContext> {
    let delivery = if dry_run {
        Delivery::DryRun
    } else {
        let token = config
            .telegram_bot_token
            .clone()
            .ok_or_else(|| ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".to_string()))?;
        let chat_id = config
            .telegram_chat_id
            .clone()
            .ok_or_else(|| ConfigError::MissingEnvVar("TELEGRAM_CHAT_ID".to_string()))?;
        let notifier = TelegramNotifier::new(token, chat_id, config.request_timeout_secs)
            .context("failed to build Telegram notifier")?;
        Delivery::Live(Box::new(notifier))
    };

    let fetcher = DocumentFetcher::from_config(config).context("failed to build HTTP client")?;

    Ok(RunContext {
        fetcher,
        store: StateStore::new(&config.state_dir),
        delivery,
        policy: TransitionPolicy {
            notify_on_end: config.notify_on_end,
            top_n: config.top_n,
        },
        catalog: CatalogOptions::from_config(config),
        notify_on_error: config.notify_on_error,
        max_attempts: config.runner_max_attempts,
        retry_sleep: Duration::from_secs(config.runner_retry_sleep_secs),
        max_concurrent: config.max_concurrent_targets,
    })
}

/// Polls the configured targets once.
///
/// # Errors
///
/// Fails on an unreadable or malformed targets file, or when `--target`
/// names an id that is not configured. Per-target failures are reported in
/// the returned reports, never as an error.
pub async fn run(
    ctx: &RunContext,
    targets_path: &Path,
    options: &RunOptions,
) -> anyhow::Result<Vec<TargetReport>> {
    let file = load_targets(targets_path)?;
    let entries = match options.target.as_deref() {
        Some(wanted) => {
            let wanted = wanted.trim();
            let selected: Vec<_> = file
                .targets
                .into_iter()
                .filter(|e| e.display_id() == wanted)
                .collect();
            if selected.is_empty() {
                anyhow::bail!("no target with id '{wanted}' in {}", targets_path.display());
            }
            selected
        }
        None => file.targets,
    };

    tracing::info!(
        targets = entries.len(),
        dry_run = ctx.delivery.is_dry_run(),
        "starting poll cycle"
    );
    Ok(run_batch(ctx, &entries).await)
}

/// Checks the targets file and lists each entry with its state file, or the
/// reason it would be skipped.
///
/// # Errors
///
/// Fails on file-level problems only.
pub fn validate(targets_path: &Path) -> anyhow::Result<(String, usize)> {
    let file = load_targets(targets_path)?;
    let mut lines = Vec::with_capacity(file.targets.len());
    let mut invalid = 0usize;
    for entry in &file.targets {
        match entry.validate() {
            Ok(target) => lines.push(format!(
                "{}: OK ({}) state_{}.json",
                target.id, target.kind, target.key
            )),
            Err(e) => {
                invalid += 1;
                lines.push(format!("{}: ERROR {e}", entry.display_id()));
            }
        }
    }
    Ok((lines.join("\n"), invalid))
}

/// Pretty JSON of the persisted state for target `id`, normalized the way a
/// poll would read it.
///
/// # Errors
///
/// Fails only if the state cannot be serialized.
pub fn show_state(state_dir: &Path, id: &str) -> anyhow::Result<String> {
    let key = sanitize_target_key(id.trim());
    let state = StateStore::new(state_dir).load(&key);
    serde_json::to_string_pretty(&state).context("failed to serialize state")
}
