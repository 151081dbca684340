use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub targets_path: PathBuf,
    pub state_dir: PathBuf,
    pub log_level: String,
    pub dry_run: bool,
    pub notify_on_end: bool,
    pub notify_on_error: bool,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub fetch_max_attempts: u32,
    pub fetch_backoff_secs: u64,
    pub runner_max_attempts: u32,
    pub runner_retry_sleep_secs: u64,
    pub top_n: usize,
    pub catalog_page_limit: u32,
    pub catalog_max_pages: usize,
    pub max_concurrent_targets: usize,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("targets_path", &self.targets_path)
            .field("state_dir", &self.state_dir)
            .field("log_level", &self.log_level)
            .field("dry_run", &self.dry_run)
            .field("notify_on_end", &self.notify_on_end)
            .field("notify_on_error", &self.notify_on_error)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("fetch_max_attempts", &self.fetch_max_attempts)
            .field("fetch_backoff_secs", &self.fetch_backoff_secs)
            .field("runner_max_attempts", &self.runner_max_attempts)
            .field("runner_retry_sleep_secs", &self.runner_retry_sleep_secs)
            .field("top_n", &self.top_n)
            .field("catalog_page_limit", &self.catalog_page_limit)
            .field("catalog_max_pages", &self.catalog_max_pages)
            .field("max_concurrent_targets", &self.max_concurrent_targets)
            .field(
                "telegram_bot_token",
                &self.telegram_bot_token.as_ref().map(|_| "[redacted]"),
            )
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}
