//! Telegram Bot API `sendMessage` delivery.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Notifier, NotifyError};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Characters of the error body kept in [`NotifyError::UnexpectedStatus`].
const MAX_ERROR_BODY: usize = 200;

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_base", &self.api_base)
            .field("token", &"[redacted]")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn new(
        token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, NotifyError> {
        Self::with_api_base(DEFAULT_API_BASE, token, chat_id, timeout_secs)
    }

    /// Same as [`Self::new`] against a different API host (used by tests).
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn with_api_base(
        api_base: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            disable_web_page_preview: false,
        };

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(NotifyError::UnexpectedStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        // A 2xx with an unreadable body counts as delivered; only an explicit
        // `"ok": false` is a rejection.
        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(ApiResponse { ok: false, description }) => Err(NotifyError::Rejected {
                description: description.unwrap_or_else(|| "no description".to_string()),
            }),
            _ => {
                tracing::debug!(chat_id = %self.chat_id, chars = text.chars().count(), "telegram message delivered");
                Ok(())
            }
        }
    }
}
