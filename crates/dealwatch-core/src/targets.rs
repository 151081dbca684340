use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Markup class of the struck-through "original price" element on product pages.
pub const DEFAULT_REFERENCE_PRICE_CLASS: &str = "productDescription__priceOriginal";

/// Document shape a target is polled as; selects the signal extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Product page with embedded `application/ld+json` product metadata.
    StructuredMetadata,
    /// Storefront exposing a `products.json` catalog feed.
    CatalogJson,
    /// Listing page scanned for anchors whose text matches keywords.
    LinkDiscovery,
}

impl TargetKind {
    /// `true` for variants judged by the seen-set instead of the sale edge.
    #[must_use]
    pub fn uses_seen_set(self) -> bool {
        matches!(self, TargetKind::LinkDiscovery)
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::StructuredMetadata => write!(f, "structured_metadata"),
            TargetKind::CatalogJson => write!(f, "catalog_json"),
            TargetKind::LinkDiscovery => write!(f, "link_discovery"),
        }
    }
}

impl FromStr for TargetKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "structured_metadata" | "jsonld" | "product_page" => Ok(TargetKind::StructuredMetadata),
            "catalog_json" | "shopify" | "catalog" => Ok(TargetKind::CatalogJson),
            "link_discovery" | "links" => Ok(TargetKind::LinkDiscovery),
            other => Err(ConfigError::Validation(format!(
                "unknown target kind '{other}'"
            ))),
        }
    }
}

/// One target exactly as written in the targets file.
///
/// Every field is optional so that a single incomplete entry is reported and
/// skipped by the runner instead of rejecting the whole file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "currency_expected")]
    pub currency: Option<String>,
    #[serde(default)]
    pub reference_price_class: Option<String>,
    #[serde(default)]
    pub price_threshold: Option<serde_yaml::Value>,
    #[serde(default)]
    pub fx_rates: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub feed_url: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A validated polling target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    /// Stable identity as configured.
    pub id: String,
    /// Filesystem-safe key derived from `id`; names the persisted state file.
    pub key: String,
    pub label: String,
    pub kind: TargetKind,
    pub url: String,
    /// ISO 4217 code. Required for structured metadata, display-only elsewhere.
    pub currency: Option<String>,
    pub reference_price_class: String,
    pub price_threshold: Option<Decimal>,
    /// Conversion rates into `currency`, keyed by the offer's currency code.
    pub fx_rates: BTreeMap<String, Decimal>,
    pub feed_url: Option<String>,
    /// Lowercased, non-empty keywords for link discovery.
    pub keywords: Vec<String>,
}

impl TargetEntry {
    /// Trimmed id, or `"unknown"` when absent. Used for summary lines.
    #[must_use]
    pub fn display_id(&self) -> String {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
            .to_string()
    }

    /// Sanitized key for this entry, if it has a non-empty id.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(sanitize_target_key)
    }

    /// Validates the entry into a [`TargetConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first missing or invalid field.
    pub fn validate(&self) -> Result<TargetConfig, ConfigError> {
        let id = trimmed(self.id.as_deref())
            .ok_or_else(|| ConfigError::Validation("target id must be non-empty".to_string()))?;
        let key = sanitize_target_key(&id);

        let url = trimmed(self.url.as_deref())
            .map(|u| u.trim_end_matches('/').to_string())
            .ok_or_else(|| ConfigError::Validation(format!("target '{id}' has no url")))?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "target '{id}' url must start with http:// or https://"
            )));
        }

        let kind = match trimmed(self.kind.as_deref()) {
            Some(raw) => raw.parse::<TargetKind>()?,
            None => TargetKind::StructuredMetadata,
        };

        let currency = trimmed(self.currency.as_deref()).map(|c| c.to_ascii_uppercase());
        if kind == TargetKind::StructuredMetadata && currency.is_none() {
            return Err(ConfigError::Validation(format!(
                "target '{id}' is structured_metadata and needs a currency"
            )));
        }

        let keywords: Vec<String> = self
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if kind == TargetKind::LinkDiscovery && keywords.is_empty() {
            return Err(ConfigError::Validation(format!(
                "target '{id}' is link_discovery and needs at least one keyword"
            )));
        }

        let price_threshold = self
            .price_threshold
            .as_ref()
            .map(|v| parse_decimal_value(v, &format!("target '{id}' price_threshold")))
            .transpose()?;

        let mut fx_rates = BTreeMap::new();
        for (code, value) in &self.fx_rates {
            let rate = parse_decimal_value(value, &format!("target '{id}' fx rate for {code}"))?;
            if rate <= Decimal::ZERO {
                return Err(ConfigError::Validation(format!(
                    "target '{id}' fx rate for {code} must be positive"
                )));
            }
            fx_rates.insert(code.trim().to_ascii_uppercase(), rate);
        }

        Ok(TargetConfig {
            label: trimmed(self.label.as_deref()).unwrap_or_else(|| id.clone()),
            id,
            key,
            kind,
            url,
            currency,
            reference_price_class: trimmed(self.reference_price_class.as_deref())
                .unwrap_or_else(|| DEFAULT_REFERENCE_PRICE_CLASS.to_string()),
            price_threshold,
            fx_rates,
            feed_url: trimmed(self.feed_url.as_deref()),
            keywords,
        })
    }
}

/// The targets file. Accepts either `{ targets: [...] }` or a bare list.
#[derive(Debug, Default)]
pub struct TargetsFile {
    pub targets: Vec<TargetEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TargetsDocument {
    Wrapped { targets: Vec<TargetEntry> },
    Bare(Vec<TargetEntry>),
}

/// Load the targets file and run file-level validation.
///
/// Entry-level validation is deferred to [`TargetEntry::validate`] so the
/// runner can skip one broken target and keep polling the rest.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or if two
/// target ids sanitize to the same state key.
pub fn load_targets(path: &Path) -> Result<TargetsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TargetsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_targets(&content)
}

/// Parse targets from YAML (or JSON) text. See [`load_targets`].
///
/// # Errors
///
/// Returns `ConfigError` on parse failure or key collisions.
pub fn parse_targets(content: &str) -> Result<TargetsFile, ConfigError> {
    let doc: TargetsDocument =
        serde_yaml::from_str(content).map_err(ConfigError::TargetsFileParse)?;
    let targets = match doc {
        TargetsDocument::Wrapped { targets } | TargetsDocument::Bare(targets) => targets,
    };
    let file = TargetsFile { targets };
    validate_keys(&file)?;
    Ok(file)
}

fn validate_keys(file: &TargetsFile) -> Result<(), ConfigError> {
    let mut seen: HashMap<String, String> = HashMap::new();
    for entry in &file.targets {
        let Some(key) = entry.key() else { continue };
        let id = entry.display_id();
        if let Some(previous) = seen.insert(key.clone(), id.clone()) {
            return Err(ConfigError::Validation(format!(
                "targets '{previous}' and '{id}' both map to state key '{key}'"
            )));
        }
    }
    Ok(())
}

/// Turn a target id into a stable, filesystem-safe key.
///
/// Trims the id, then replaces every run of characters outside
/// `[A-Za-z0-9_-]` with a single `_`.
#[must_use]
pub fn sanitize_target_key(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut in_run = false;
    for c in id.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_decimal_value(value: &serde_yaml::Value, what: &str) -> Result<Decimal, ConfigError> {
    let raw = match value {
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.trim().to_string(),
        _ => {
            return Err(ConfigError::Validation(format!(
                "{what} must be a number"
            )))
        }
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|e| ConfigError::Validation(format!("{what} is not a decimal: {e}")))
}

#[cfg(test)]
#[path = "targets_test.rs"]
mod tests;
