use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("bot wall detected at {url} (marker \"{marker}\")")]
    Blocked { url: String, marker: &'static str },

    #[error("expected JSON from {url} but got content-type \"{content_type}\"")]
    InvalidContentType { url: String, content_type: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("pagination limit reached for {url}: exceeded {max_pages} pages")]
    PaginationLimit { url: String, max_pages: usize },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ScraperError {
    /// `true` for network-level failures worth another attempt.
    ///
    /// Everything else (bot walls, bad status, wrong content type, unparsable
    /// bodies) means "no usable document this cycle" and is never retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ScraperError::Http(e) => !e.is_builder(),
            ScraperError::UnexpectedStatus { .. }
            | ScraperError::Blocked { .. }
            | ScraperError::InvalidContentType { .. }
            | ScraperError::Deserialize { .. }
            | ScraperError::PaginationLimit { .. }
            | ScraperError::InvalidUrl { .. } => false,
        }
    }
}
