//! Notification text. Output depends only on its inputs so repeated runs over
//! unchanged data produce identical messages.

use rust_decimal::Decimal;

use crate::condition::{Deal, DiscoveredItem, ObservedCondition, Observation};
use crate::targets::TargetConfig;

/// One bullet for a ranked deal.
#[must_use]
pub fn format_deal_line(deal: &Deal) -> String {
    format!(
        "• {}\n  {:.2} → {:.2}  (-{:.2} / {:.1}%)\n  {}",
        deal.title, deal.reference, deal.current, deal.discount_abs, deal.discount_pct, deal.url
    )
}

/// Messages for a catalog feed whose sale just started: a summary with the
/// top `top_n` deals, then a follow-up with the next `top_n`.
#[must_use]
pub fn catalog_sale_started(
    target: &TargetConfig,
    observation: &Observation,
    top_n: usize,
) -> Vec<String> {
    let top_n = top_n.max(1);
    let top: Vec<&Deal> = observation.deals.iter().take(top_n).collect();
    let next: Vec<&Deal> = observation
        .deals
        .iter()
        .skip(top_n)
        .take(top_n)
        .collect();
    let discounted_variants = observation.deals.len();

    let mut first = format!(
        "🚨 {}: sale detected!\n\n📦 Discounted products: {}\n🏷️ Discounted variants: {}\n🔗 {}/\n\n🔥 Top {} deals:\n",
        target.label,
        observation.discounted_products,
        discounted_variants,
        target.url,
        if top.is_empty() { top_n } else { top.len() },
    );
    if top.is_empty() {
        first.push_str("• (no details available)");
    } else {
        first.push_str(&join_deals(&top));
    }

    let remaining = discounted_variants.saturating_sub(top.len());
    let mut second = format!(
        "📩 More info:\n• Further discounted variants (after top {}): {remaining}\n",
        top.len()
    );
    if next.is_empty() {
        second.push_str("\n(No further deals in the next slots.)");
    } else {
        second.push_str("\n➡️ Next deals:\n");
        second.push_str(&join_deals(&next));
    }

    vec![first, second]
}

/// Message for a product page that went on sale or dropped below threshold.
#[must_use]
pub fn page_sale_started(target: &TargetConfig, condition: &ObservedCondition) -> String {
    let currency = target.currency.as_deref().unwrap_or_default();
    let mut text = format!("{}: sale started\n", target.label);
    if let Some(current) = condition.current_price {
        text.push_str(&format!("Current: {} {currency}\n", money(current)));
    }
    if let Some(reference) = condition.reference_price {
        text.push_str(&format!("Original: {} {currency}\n", money(reference)));
    }
    if let (Some(threshold), Some(current)) = (target.price_threshold, condition.current_price) {
        if current < threshold {
            text.push_str(&format!("Below threshold: {} {currency}\n", money(threshold)));
        }
    }
    text.push_str(&target.url);
    text
}

/// Message for a favorable condition that disappeared.
#[must_use]
pub fn condition_ended(target: &TargetConfig) -> String {
    format!(
        "✅ {}: sale appears to have ended (no discount found anymore).\n{}",
        target.label, target.url
    )
}

/// Message for one newly discovered listing.
#[must_use]
pub fn new_item(target: &TargetConfig, item: &DiscoveredItem) -> String {
    if item.title.is_empty() {
        format!("🆕 {}: new listing\n{}", target.label, item.id)
    } else {
        format!("🆕 {}: new listing\n{}\n{}", target.label, item.title, item.id)
    }
}

/// Short notice sent when a target could not be polled.
#[must_use]
pub fn error_notice(target_id: &str, detail: &str) -> String {
    format!("dealwatch error on {target_id}: {detail}")
}

fn join_deals(deals: &[&Deal]) -> String {
    deals
        .iter()
        .map(|d| format_deal_line(d))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn money(value: Decimal) -> String {
    format!("{value:.2}")
}
