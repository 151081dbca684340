//! Catalog feeds: every variant whose compare-at price beats its price.

use std::collections::HashSet;

use dealwatch_core::{rank_deals, Deal, ObservedCondition, Observation, SignalOutcome};

use rust_decimal::Decimal;

use crate::client::Document;
use crate::error::ScraperError;
use crate::normalize::parse_machine_price;
use crate::types::CatalogProduct;

use super::{SignalExtractor, PRICE_TOLERANCE};

#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogExtractor;

impl SignalExtractor for CatalogExtractor {
    fn extract(&self, document: &Document) -> Result<SignalOutcome, ScraperError> {
        let Document::Catalog { base_url, products } = document else {
            return Ok(SignalOutcome::NoSignal("expected a catalog document".to_string()));
        };

        let (deals, discounted_products) = collect_deals(products, base_url);
        let deals = rank_deals(deals);
        let favorable = !deals.is_empty();
        let signature = deals
            .iter()
            .map(|d| format!("{}|{:.2}>{:.2}", d.item_id, d.reference, d.current))
            .collect::<Vec<_>>()
            .join(";");
        let best = deals.first();

        Ok(SignalOutcome::Observed(Observation {
            condition: ObservedCondition {
                current_price: best.map(|d| d.current),
                reference_price: best.map(|d| d.reference),
                favorable,
                signature,
            },
            deals,
            discounted_products,
            items: Vec::new(),
        }))
    }
}

/// Unranked deals plus the number of products with at least one of them.
///
/// Variants are deduplicated by id across the whole feed; a variant without
/// an id is keyed by its product and position.
fn collect_deals(products: &[CatalogProduct], base_url: &str) -> (Vec<Deal>, usize) {
    let mut deals = Vec::new();
    let mut discounted_products = 0usize;
    let mut seen: HashSet<String> = HashSet::new();

    for (product_index, product) in products.iter().enumerate() {
        let title = product
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Product");
        let url = match product.handle.as_deref().map(str::trim) {
            Some(handle) if !handle.is_empty() => format!("{base_url}/products/{handle}"),
            _ => format!("{base_url}/"),
        };

        let mut product_discounted = false;
        for (variant_index, variant) in product.variants.iter().enumerate() {
            let item_id = match (variant.id, product.id) {
                (Some(id), _) => id.to_string(),
                (None, Some(pid)) => format!("{pid}:{variant_index}"),
                (None, None) => format!("#{product_index}:{variant_index}"),
            };
            if !seen.insert(item_id.clone()) {
                continue;
            }

            let price = variant.price.as_deref().and_then(parse_machine_price);
            let compare_at = variant.compare_at_price.as_deref().and_then(parse_machine_price);
            let (Some(price), Some(compare_at)) = (price, compare_at) else {
                continue;
            };
            if price <= Decimal::ZERO {
                continue;
            }

            if price.checked_add(PRICE_TOLERANCE).is_some_and(|floor| compare_at > floor) {
                product_discounted = true;
                deals.push(Deal::new(title, url.clone(), item_id, price, compare_at));
            }
        }

        if product_discounted {
            discounted_products += 1;
        }
    }

    (deals, discounted_products)
}
