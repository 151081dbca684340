//! Multi-page catalog fetch and feed URL construction.

use dealwatch_core::TargetConfig;

use crate::error::ScraperError;
use crate::pagination::extract_next_cursor;
use crate::types::{CatalogProduct, CatalogResponse};

use super::{CatalogOptions, DocumentFetcher};

impl DocumentFetcher {
    /// Fetches every page of a catalog feed, following `Link` cursors.
    ///
    /// All-or-nothing: any page failure discards earlier pages. A partial
    /// product list would under-report deals and could flip a sale to "ended".
    ///
    /// # Errors
    ///
    /// Propagates any error from the page fetch, returns
    /// [`ScraperError::Deserialize`] for a body without a `products` list, and
    /// [`ScraperError::PaginationLimit`] past `options.max_pages` pages.
    pub async fn fetch_catalog(
        &self,
        feed_url: &str,
        options: &CatalogOptions,
    ) -> Result<Vec<CatalogProduct>, ScraperError> {
        let mut products = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > options.max_pages {
                return Err(ScraperError::PaginationLimit {
                    url: feed_url.to_owned(),
                    max_pages: options.max_pages,
                });
            }

            let url = page_url(feed_url, options.page_limit, cursor.as_deref())?;
            let page = self.fetch_json(&url).await?;
            let response = serde_json::from_value::<CatalogResponse>(page.body).map_err(|e| {
                ScraperError::Deserialize {
                    context: format!("catalog page from {url}"),
                    source: e,
                }
            })?;
            tracing::debug!(url, products = response.products.len(), "catalog page fetched");
            products.extend(response.products);

            cursor = extract_next_cursor(page.link_header.as_deref());
            if cursor.is_none() {
                break;
            }
        }

        Ok(products)
    }
}

/// Feed URL for a catalog target: the explicit `feed_url`, else
/// `<origin>/products.json`.
#[must_use]
pub fn catalog_feed_url(target: &TargetConfig) -> String {
    match &target.feed_url {
        Some(url) => url.clone(),
        None => format!("{}/products.json", extract_store_origin(&target.url)),
    }
}

/// Scheme and host of a store URL.
///
/// `"https://shop.example/collections/sale"` → `"https://shop.example"`.
#[must_use]
pub fn extract_store_origin(store_url: &str) -> String {
    reqwest::Url::parse(store_url).map_or_else(
        |e| {
            tracing::warn!(store_url, error = %e, "could not parse store url, using it verbatim");
            store_url.trim_end_matches('/').to_owned()
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Sets `limit` and (when paging) `page_info` on the feed URL, replacing any
/// values already present.
fn page_url(feed_url: &str, limit: u32, page_info: Option<&str>) -> Result<String, ScraperError> {
    let mut url = reqwest::Url::parse(feed_url).map_err(|e| ScraperError::InvalidUrl {
        url: feed_url.to_owned(),
        reason: e.to_string(),
    })?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "limit" && k != "page_info")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("limit", &limit.to_string());
        if let Some(cursor) = page_info {
            pairs.append_pair("page_info", cursor);
        }
    }
    Ok(url.to_string())
}
