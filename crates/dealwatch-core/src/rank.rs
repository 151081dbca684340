//! Discount computation and deterministic deal ranking.
//!
//! Ranking is a total order over deals so that two runs over the same input
//! produce byte-identical notification text.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::condition::Deal;

/// Returns `(discount_abs, discount_pct)` for a reference/current price pair.
///
/// The percentage is `0` when `reference <= 0`. The absolute discount
/// saturates at the `Decimal` bounds.
#[must_use]
pub fn compute_discount(reference: Decimal, current: Decimal) -> (Decimal, Decimal) {
    let discount_abs = reference.saturating_sub(current);
    if reference <= Decimal::ZERO {
        return (discount_abs, Decimal::ZERO);
    }
    let discount_pct = discount_abs
        .checked_div(reference)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO);
    (discount_abs, discount_pct)
}

/// Sorts deals by percentage discount (desc), absolute discount (desc),
/// current price (asc), then item identifier (asc).
#[must_use]
pub fn rank_deals(mut deals: Vec<Deal>) -> Vec<Deal> {
    deals.sort_by(compare_deals);
    deals
}

fn compare_deals(a: &Deal, b: &Deal) -> Ordering {
    b.discount_pct
        .cmp(&a.discount_pct)
        .then_with(|| b.discount_abs.cmp(&a.discount_abs))
        .then_with(|| a.current.cmp(&b.current))
        .then_with(|| compare_item_ids(&a.item_id, &b.item_id))
}

/// Numeric ids compare as numbers (`"9" < "10"`); anything else falls back
/// to plain string order, with numeric ids first.
fn compare_item_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u128>(), b.parse::<u128>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
