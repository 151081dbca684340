//! Outbound notification delivery.

pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

pub use telegram::TelegramNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// Network failure. The request URL is stripped since it embeds the bot token.
    #[error("notification request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("notification rejected with HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("notification rejected by API: {description}")]
    Rejected { description: String },
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

/// Something that can deliver a plain-text message.
///
/// Delivery is best effort; callers decide whether a failure matters.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}
