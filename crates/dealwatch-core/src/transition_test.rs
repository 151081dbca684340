use std::collections::BTreeMap;

use chrono::TimeZone;
use rust_decimal::Decimal;

use super::*;
use crate::condition::{Deal, DiscoveredItem, ObservedCondition};
use crate::targets::DEFAULT_REFERENCE_PRICE_CLASS;

fn target(kind: TargetKind) -> TargetConfig {
    TargetConfig {
        id: "t".to_string(),
        key: "t".to_string(),
        label: "Target".to_string(),
        kind,
        url: "https://shop.example".to_string(),
        currency: Some("CHF".to_string()),
        reference_price_class: DEFAULT_REFERENCE_PRICE_CLASS.to_string(),
        price_threshold: None,
        fx_rates: BTreeMap::new(),
        feed_url: None,
        keywords: vec!["garmin".to_string()],
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn page(current: i64, reference: Option<i64>) -> Observation {
    let current = Decimal::new(current, 0);
    let reference = reference.map(|r| Decimal::new(r, 0));
    let favorable = reference.is_some_and(|r| r > current + Decimal::new(1, 2));
    Observation {
        condition: ObservedCondition {
            current_price: Some(current),
            reference_price: reference,
            favorable,
            signature: crate::condition::price_signature(Some(current), reference, favorable),
        },
        ..Observation::default()
    }
}

/// Feeds observations through `decide`, persisting each next state, and
/// returns how many notifications each poll produced.
fn run_sequence(target: &TargetConfig, policy: &TransitionPolicy, polls: &[Observation]) -> Vec<usize> {
    let mut state = PersistedState::default();
    polls
        .iter()
        .map(|obs| {
            let t = decide(target, &state, obs, policy, now());
            state = t.next_state;
            t.notifications.len()
        })
        .collect()
}

#[test]
fn inactive_active_active_notifies_exactly_once() {
    let t = target(TargetKind::StructuredMetadata);
    let counts = run_sequence(
        &t,
        &TransitionPolicy::default(),
        &[page(100, None), page(80, Some(100)), page(80, Some(100))],
    );
    assert_eq!(counts, [0, 1, 0]);
}

#[test]
fn repeated_active_poll_notifies_at_most_once() {
    let t = target(TargetKind::StructuredMetadata);
    let counts = run_sequence(
        &t,
        &TransitionPolicy::default(),
        &[page(80, Some(100)), page(80, Some(100))],
    );
    assert_eq!(counts.iter().sum::<usize>(), 1);
}

#[test]
fn price_drift_within_active_state_is_silent() {
    let t = target(TargetKind::StructuredMetadata);
    let counts = run_sequence(
        &t,
        &TransitionPolicy::default(),
        &[page(80, Some(100)), page(70, Some(100)), page(60, Some(110))],
    );
    assert_eq!(counts, [1, 0, 0]);
}

#[test]
fn end_of_sale_is_silent_by_default_but_rearms() {
    let t = target(TargetKind::StructuredMetadata);
    let counts = run_sequence(
        &t,
        &TransitionPolicy::default(),
        &[page(80, Some(100)), page(100, None), page(80, Some(100))],
    );
    assert_eq!(counts, [1, 0, 1]);
}

#[test]
fn end_of_sale_notifies_when_enabled() {
    let t = target(TargetKind::StructuredMetadata);
    let policy = TransitionPolicy {
        notify_on_end: true,
        ..TransitionPolicy::default()
    };
    let prev = PersistedState {
        sale_active: true,
        ..PersistedState::default()
    };
    let tr = decide(&t, &prev, &page(100, None), &policy, now());
    assert_eq!(tr.kind, TransitionKind::Ended);
    assert_eq!(tr.notifications.len(), 1);
    assert!(tr.notifications[0].contains("ended"));
    assert!(!tr.next_state.sale_active);
}

#[test]
fn next_state_records_prices_signature_and_time() {
    let t = target(TargetKind::StructuredMetadata);
    let tr = decide(
        &t,
        &PersistedState::default(),
        &page(80, Some(100)),
        &TransitionPolicy::default(),
        now(),
    );
    assert_eq!(tr.kind, TransitionKind::Started);
    assert!(tr.next_state.sale_active);
    assert_eq!(tr.next_state.last_price, Some(Decimal::new(80, 0)));
    assert_eq!(tr.next_state.last_reference_price, Some(Decimal::new(100, 0)));
    assert_eq!(tr.next_state.last_signature, "sale=1|current=80.00|original=100.00");
    assert_eq!(tr.next_state.last_checked_at, Some(now()));
}

#[test]
fn catalog_start_produces_two_messages() {
    let t = target(TargetKind::CatalogJson);
    let obs = Observation {
        condition: ObservedCondition {
            favorable: true,
            ..ObservedCondition::default()
        },
        deals: vec![Deal::new(
            "Hoodie",
            "https://shop.example/products/hoodie",
            "1",
            Decimal::new(75, 0),
            Decimal::new(100, 0),
        )],
        discounted_products: 1,
        items: Vec::new(),
    };
    let tr = decide(&t, &PersistedState::default(), &obs, &TransitionPolicy::default(), now());
    assert_eq!(tr.kind, TransitionKind::Started);
    assert_eq!(tr.notifications.len(), 2);
}

fn links(ids: &[&str]) -> Observation {
    Observation {
        condition: ObservedCondition {
            favorable: !ids.is_empty(),
            ..ObservedCondition::default()
        },
        items: ids
            .iter()
            .map(|id| DiscoveredItem {
                id: (*id).to_string(),
                title: String::new(),
            })
            .collect(),
        ..Observation::default()
    }
}

#[test]
fn new_items_notify_once_each_and_are_remembered() {
    let t = target(TargetKind::LinkDiscovery);
    let counts = run_sequence(
        &t,
        &TransitionPolicy::default(),
        &[
            links(&["https://a/1", "https://a/2"]),
            links(&["https://a/1", "https://a/2"]),
            links(&["https://a/2", "https://a/3"]),
        ],
    );
    assert_eq!(counts, [2, 0, 1]);
}

#[test]
fn seen_set_survives_items_disappearing() {
    let t = target(TargetKind::LinkDiscovery);
    let counts = run_sequence(
        &t,
        &TransitionPolicy::default(),
        &[links(&["https://a/1"]), links(&[]), links(&["https://a/1"])],
    );
    assert_eq!(counts, [1, 0, 0]);
}

#[test]
fn duplicate_links_in_one_document_notify_once() {
    let t = target(TargetKind::LinkDiscovery);
    let tr = decide(
        &t,
        &PersistedState::default(),
        &links(&["https://a/1", "https://a/1"]),
        &TransitionPolicy::default(),
        now(),
    );
    assert_eq!(tr.kind, TransitionKind::NewItems(1));
    assert_eq!(tr.next_state.seen.len(), 1);
}
