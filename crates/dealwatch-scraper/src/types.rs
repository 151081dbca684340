//! Response types for `products.json`-style catalog feeds.
//!
//! ### `compare_at_price`
//! `null` when the variant is not discounted. Stores disagree on whether
//! prices are JSON strings (`"162.00"`) or numbers (`162.0`), so both price
//! fields are captured as their textual form and parsed later.
//!
//! ### `products`
//! Required. A body without it is not a catalog (often an error object or a
//! storefront password page rendered as JSON) and must not be read as
//! "zero products".

use serde::{Deserialize, Deserializer};

/// Top-level response from a catalog feed page.
#[derive(Debug, Deserialize)]
pub struct CatalogResponse {
    pub products: Vec<CatalogProduct>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogProduct {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub title: Option<String>,

    /// URL slug for the product page.
    #[serde(default)]
    pub handle: Option<String>,

    #[serde(default)]
    pub variants: Vec<CatalogVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogVariant {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<String>,

    #[serde(default, deserialize_with = "lenient_price")]
    pub compare_at_price: Option<String>,

    #[serde(default)]
    pub available: Option<bool>,
}

/// Accepts `"12.50"`, `12.5` or `null`.
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
