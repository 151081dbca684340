//! HTTP fetching for product pages and catalog feeds.
//!
//! Every failure mode (non-200, network error, bot wall, non-JSON feed) comes
//! back as a typed [`ScraperError`]. Callers treat any error as "no usable
//! document this cycle", never as an empty result.

mod block;
mod catalog;

use std::time::Duration;

use dealwatch_core::{AppConfig, TargetConfig, TargetKind};
use reqwest::{Client, StatusCode};

use crate::error::ScraperError;
use crate::retry::retry_with_backoff;
use crate::types::CatalogProduct;

pub use block::{find_block_marker, BLOCK_MARKERS};
pub use catalog::{catalog_feed_url, extract_store_origin};

/// A fetched document, shaped for the extractor that will read it.
#[derive(Debug, Clone)]
pub enum Document {
    Html {
        url: String,
        body: String,
    },
    Catalog {
        /// Store origin used to build product URLs.
        base_url: String,
        products: Vec<CatalogProduct>,
    },
}

/// Page size and pagination guard for catalog feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogOptions {
    pub page_limit: u32,
    pub max_pages: usize,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            page_limit: 250,
            max_pages: 10,
        }
    }
}

impl CatalogOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            page_limit: config.catalog_page_limit,
            max_pages: config.catalog_max_pages,
        }
    }
}

/// One decoded JSON response plus its raw `Link` header.
#[derive(Debug)]
pub(crate) struct JsonPage {
    pub body: serde_json::Value,
    pub link_header: Option<String>,
}

/// Shared HTTP client with a fixed user agent, timeout and retry policy.
pub struct DocumentFetcher {
    client: Client,
    /// Total attempts for transient failures, including the first.
    max_attempts: u32,
    /// Linear backoff unit in seconds.
    backoff_secs: u64,
}

impl DocumentFetcher {
    /// Creates a fetcher. Redirects are followed (reqwest's default policy).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_attempts: u32,
        backoff_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_attempts: max_attempts.max(1),
            backoff_secs,
        })
    }

    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.request_timeout_secs,
            &config.user_agent,
            config.fetch_max_attempts,
            config.fetch_backoff_secs,
        )
    }

    /// Fetches an HTML page and rejects bot walls.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::UnexpectedStatus`] for anything but 200 (not retried).
    /// - [`ScraperError::Blocked`] when the body carries a bot-wall marker.
    /// - [`ScraperError::Http`] after all attempts fail at the network level.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        retry_with_backoff(self.max_attempts, self.backoff_secs, || async move {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if status != StatusCode::OK {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            let body = response.text().await?;
            if let Some(marker) = find_block_marker(&body) {
                tracing::warn!(url, marker, "bot wall detected");
                return Err(ScraperError::Blocked {
                    url: url.to_owned(),
                    marker,
                });
            }
            Ok(body)
        })
        .await
    }

    /// Fetches a JSON endpoint, validating content type and body.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::UnexpectedStatus`] for anything but 200.
    /// - [`ScraperError::InvalidContentType`] unless the content type mentions JSON.
    /// - [`ScraperError::Deserialize`] when the body is not valid JSON.
    /// - [`ScraperError::Http`] after all attempts fail at the network level.
    pub(crate) async fn fetch_json(&self, url: &str) -> Result<JsonPage, ScraperError> {
        retry_with_backoff(self.max_attempts, self.backoff_secs, || async move {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if status != StatusCode::OK {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            let headers = response.headers();
            let content_type = headers
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_ascii_lowercase();
            if !content_type.contains("json") {
                return Err(ScraperError::InvalidContentType {
                    url: url.to_owned(),
                    content_type,
                });
            }
            let link_header = headers
                .get(reqwest::header::LINK)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            let text = response.text().await?;
            let body = serde_json::from_str::<serde_json::Value>(&text).map_err(|e| {
                ScraperError::Deserialize {
                    context: format!("JSON from {url}"),
                    source: e,
                }
            })?;
            Ok(JsonPage { body, link_header })
        })
        .await
    }

    /// Fetches whatever document `target`'s extractor needs.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::fetch_html`] and the catalog fetch.
    pub async fn fetch_document(
        &self,
        target: &TargetConfig,
        options: &CatalogOptions,
    ) -> Result<Document, ScraperError> {
        match target.kind {
            TargetKind::StructuredMetadata | TargetKind::LinkDiscovery => {
                let body = self.fetch_html(&target.url).await?;
                Ok(Document::Html {
                    url: target.url.clone(),
                    body,
                })
            }
            TargetKind::CatalogJson => {
                let feed_url = catalog_feed_url(target);
                let products = self.fetch_catalog(&feed_url, options).await?;
                Ok(Document::Catalog {
                    base_url: extract_store_origin(&target.url),
                    products,
                })
            }
        }
    }
}
