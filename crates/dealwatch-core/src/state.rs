//! Durable per-target record of the last observed condition.
//!
//! Reading is lenient: each field is recovered independently and anything
//! missing or of the wrong type falls back to the safe default (inactive,
//! no prices, empty seen-set). A corrupt record must never stop a poll.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistedState {
    pub sale_active: bool,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub last_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub last_reference_price: Option<Decimal>,
    pub last_signature: String,
    /// Item identifiers already announced. Grows for the target's lifetime.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub seen: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl PersistedState {
    /// Recovers a state from arbitrary JSON, normalizing anything malformed.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let sale_active = obj
            .get("sale_active")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let last_price = obj.get("last_price").and_then(decimal_from_value);
        let last_reference_price = obj
            .get("last_reference_price")
            // Older records used this name.
            .or_else(|| obj.get("last_original_price"))
            .and_then(decimal_from_value);
        let last_signature = obj
            .get("last_signature")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let seen = obj
            .get("seen")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let last_checked_at = obj
            .get("last_checked_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Self {
            sale_active,
            last_price,
            last_reference_price,
            last_signature,
            seen,
            last_checked_at,
        }
    }

    /// Parses a state file's contents; unparsable text yields the default.
    #[must_use]
    pub fn from_json_str(text: &str) -> Self {
        serde_json::from_str::<Value>(text)
            .map(|v| Self::from_value(&v))
            .unwrap_or_default()
    }
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let raw = n.to_string();
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .ok()
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}
