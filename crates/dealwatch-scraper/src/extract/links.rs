//! Listing pages scanned for anchors whose text mentions a keyword.

use std::collections::HashSet;
use std::sync::LazyLock;

use dealwatch_core::{DiscoveredItem, ObservedCondition, Observation, SignalOutcome, TargetConfig};
use regex::Regex;
use reqwest::Url;

use crate::client::Document;
use crate::error::ScraperError;

use super::html::{decode_entities, text_content};
use super::SignalExtractor;

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("valid regex"));

static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).expect("valid regex")
});

#[derive(Debug, Clone)]
pub struct LinkDiscoveryExtractor {
    /// Lowercased.
    keywords: Vec<String>,
}

impl LinkDiscoveryExtractor {
    #[must_use]
    pub fn from_target(target: &TargetConfig) -> Self {
        Self {
            keywords: target.keywords.clone(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

impl SignalExtractor for LinkDiscoveryExtractor {
    fn extract(&self, document: &Document) -> Result<SignalOutcome, ScraperError> {
        let Document::Html { url, body } = document else {
            return Ok(SignalOutcome::NoSignal("expected an HTML document".to_string()));
        };
        let base = Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for cap in ANCHOR_RE.captures_iter(body) {
            let attrs = cap.get(1).map_or("", |m| m.as_str());
            let inner = cap.get(2).map_or("", |m| m.as_str());

            let title = text_content(inner);
            if !self.matches(&title) {
                continue;
            }
            let Some(href) = href_of(attrs) else {
                continue;
            };
            let Some(absolute) = resolve(&base, &href) else {
                continue;
            };
            if seen.insert(absolute.clone()) {
                items.push(DiscoveredItem {
                    id: absolute,
                    title,
                });
            }
        }

        let favorable = !items.is_empty();
        Ok(SignalOutcome::Observed(Observation {
            condition: ObservedCondition {
                current_price: None,
                reference_price: None,
                favorable,
                signature: format!("items={}", items.len()),
            },
            deals: Vec::new(),
            discounted_products: 0,
            items,
        }))
    }
}

fn href_of(attrs: &str) -> Option<String> {
    let cap = HREF_RE.captures(attrs)?;
    let raw = cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3))?.as_str();
    let href = decode_entities(raw.trim());
    (!href.is_empty()).then_some(href)
}

/// Absolute http(s) URL for `href`, or `None` for fragments and
/// non-navigational schemes.
fn resolve(base: &Url, href: &str) -> Option<String> {
    let lowered = href.to_ascii_lowercase();
    if href.starts_with('#')
        || ["mailto:", "javascript:", "tel:", "data:"]
            .iter()
            .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }
    let mut joined = base.join(href).ok()?;
    if !matches!(joined.scheme(), "http" | "https") {
        return None;
    }
    joined.set_fragment(None);
    Some(joined.to_string())
}
