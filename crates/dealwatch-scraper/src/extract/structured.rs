//! Product pages with schema.org JSON-LD metadata.
//!
//! The current price is the lowest `Product` offer in the expected currency
//! (or a currency with a configured conversion rate). The reference price
//! comes from the struck-through price element identified by a CSS class.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use dealwatch_core::{price_signature, ObservedCondition, Observation, SignalOutcome, TargetConfig};
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::client::Document;
use crate::error::ScraperError;
use crate::normalize::{parse_machine_price, parse_price};

use super::html::text_content;
use super::{SignalExtractor, PRICE_TOLERANCE};

static LD_JSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

#[derive(Debug, Clone)]
pub struct StructuredMetadataExtractor {
    currency: String,
    fx_rates: BTreeMap<String, Decimal>,
    /// Matches the first `<s>`/`<del>` element carrying the reference class.
    reference_re: Regex,
    price_threshold: Option<Decimal>,
}

impl StructuredMetadataExtractor {
    #[must_use]
    pub fn from_target(target: &TargetConfig) -> Self {
        Self::new(
            target.currency.clone().unwrap_or_default(),
            target.fx_rates.clone(),
            &target.reference_price_class,
            target.price_threshold,
        )
    }

    fn new(
        currency: String,
        fx_rates: BTreeMap<String, Decimal>,
        reference_price_class: &str,
        price_threshold: Option<Decimal>,
    ) -> Self {
        let pattern = format!(
            r#"(?is)<(?:s|del)\b[^>]*class\s*=\s*["'][^"']*{}[^"']*["'][^>]*>(.*?)</(?:s|del)>"#,
            regex::escape(reference_price_class)
        );
        Self {
            currency,
            fx_rates,
            reference_re: Regex::new(&pattern).expect("valid regex"),
            price_threshold,
        }
    }

    /// Lowest matching offer price across all `Product` nodes.
    fn current_price(&self, html: &str) -> Option<Decimal> {
        let mut candidates = Vec::new();

        for cap in LD_JSON_RE.captures_iter(html) {
            let Some(text) = cap.get(1).map(|m| m.as_str().trim()) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            let Ok(parsed) = serde_json::from_str::<Value>(text) else {
                tracing::debug!("skipping unparsable ld+json block");
                continue;
            };

            let mut nodes = Vec::new();
            collect_objects(&parsed, &mut nodes);
            for node in nodes.into_iter().filter(|n| is_product(n)) {
                for offer in offers_of(node) {
                    if let Some(price) = self.offer_price(offer) {
                        candidates.push(price);
                    }
                }
            }
        }

        candidates.into_iter().min()
    }

    /// An offer's price in the expected currency, converting via `fx_rates`.
    /// Zero, negative and unrepresentable amounts are not prices.
    fn offer_price(&self, offer: &Value) -> Option<Decimal> {
        let currency = offer
            .get("priceCurrency")
            .and_then(Value::as_str)
            .map(|c| c.trim().to_ascii_uppercase())?;
        let raw = offer
            .get("price")
            .filter(|v| !v.is_null())
            .or_else(|| offer.get("lowPrice"))?;
        let amount = match raw {
            Value::String(s) => parse_machine_price(s)?,
            Value::Number(n) => parse_machine_price(&n.to_string())?,
            _ => return None,
        };

        let amount = if currency == self.currency {
            amount
        } else {
            let rate = self.fx_rates.get(&currency)?;
            amount.checked_mul(*rate)?.round_dp(2)
        };
        (amount > Decimal::ZERO).then_some(amount)
    }

    fn reference_price(&self, html: &str) -> Option<Decimal> {
        let inner = self.reference_re.captures(html)?.get(1)?.as_str();
        parse_price(&text_content(inner))
    }
}

impl SignalExtractor for StructuredMetadataExtractor {
    fn extract(&self, document: &Document) -> Result<SignalOutcome, ScraperError> {
        let Document::Html { body, .. } = document else {
            return Ok(SignalOutcome::NoSignal("expected an HTML document".to_string()));
        };

        let Some(current) = self.current_price(body) else {
            return Ok(SignalOutcome::NoSignal(format!(
                "no product offer in {}",
                self.currency
            )));
        };
        let reference = self.reference_price(body);

        let discounted = reference
            .zip(current.checked_add(PRICE_TOLERANCE))
            .is_some_and(|(r, floor)| r > floor);
        let below_threshold = self.price_threshold.is_some_and(|t| current < t);
        let favorable = discounted || below_threshold;

        Ok(SignalOutcome::Observed(Observation {
            condition: ObservedCondition {
                current_price: Some(current),
                reference_price: reference,
                favorable,
                signature: price_signature(Some(current), reference, favorable),
            },
            ..Observation::default()
        }))
    }
}

/// Depth-first list of every JSON object in `value`, itself included.
fn collect_objects<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            out.push(value);
            for child in map.values() {
                collect_objects(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_objects(item, out);
            }
        }
        _ => {}
    }
}

/// `@type` may be a string or an array of strings.
fn is_product(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t.eq_ignore_ascii_case("product"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.eq_ignore_ascii_case("product")),
        _ => false,
    }
}

fn offers_of(node: &Value) -> Vec<&Value> {
    match node.get("offers") {
        Some(offer @ Value::Object(_)) => vec![offer],
        Some(Value::Array(offers)) => offers.iter().filter(|o| o.is_object()).collect(),
        _ => Vec::new(),
    }
}
