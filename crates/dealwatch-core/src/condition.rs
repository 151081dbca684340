//! What one poll observed, in the shape every extractor projects into.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Snapshot of a target produced by one successful poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedCondition {
    pub current_price: Option<Decimal>,
    pub reference_price: Option<Decimal>,
    /// Sale active, price below threshold, or matching items present.
    pub favorable: bool,
    /// Diagnostic summary of the observed prices. Never used for transitions.
    pub signature: String,
}

/// One discounted catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub title: String,
    pub url: String,
    pub item_id: String,
    pub current: Decimal,
    pub reference: Decimal,
    pub discount_abs: Decimal,
    pub discount_pct: Decimal,
}

impl Deal {
    /// Builds a deal and computes its discount figures.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        item_id: impl Into<String>,
        current: Decimal,
        reference: Decimal,
    ) -> Self {
        let (discount_abs, discount_pct) = crate::rank::compute_discount(reference, current);
        Self {
            title: title.into(),
            url: url.into(),
            item_id: item_id.into(),
            current,
            reference,
            discount_abs,
            discount_pct,
        }
    }
}

/// A link found by keyword discovery. `id` is the absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredItem {
    pub id: String,
    pub title: String,
}

/// Everything an extractor hands to the transition engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    pub condition: ObservedCondition,
    /// Ranked discounted entries (catalog feeds only).
    pub deals: Vec<Deal>,
    /// Products with at least one discounted variant.
    pub discounted_products: usize,
    /// Keyword-matching links (link discovery only), in document order.
    pub items: Vec<DiscoveredItem>,
}

/// Result of running an extractor over a fetched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    Observed(Observation),
    /// The document was usable but carried no price signal; state is left alone.
    NoSignal(String),
}

/// Formats the diagnostic signature for a price snapshot.
#[must_use]
pub fn price_signature(
    current: Option<Decimal>,
    reference: Option<Decimal>,
    favorable: bool,
) -> String {
    let fmt = |d: Option<Decimal>| d.map(|v| format!("{v:.2}")).unwrap_or_default();
    format!(
        "sale={}|current={}|original={}",
        u8::from(favorable),
        fmt(current),
        fmt(reference)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_formats_prices_with_two_decimals() {
        let sig = price_signature(Some(Decimal::new(1999, 1)), Some(Decimal::new(250, 0)), true);
        assert_eq!(sig, "sale=1|current=199.90|original=250.00");
    }

    #[test]
    fn signature_leaves_missing_prices_empty() {
        assert_eq!(price_signature(None, None, false), "sale=0|current=|original=");
    }

    #[test]
    fn deal_new_computes_discount() {
        let deal = Deal::new("Hoodie", "https://x/products/h", "7", Decimal::new(75, 0), Decimal::new(100, 0));
        assert_eq!(deal.discount_abs, Decimal::new(25, 0));
        assert_eq!(deal.discount_pct, Decimal::new(25, 0));
    }
}
