//! Edge-triggered transition engine.
//!
//! Sale-style targets hold one boolean: Inactive or Active. Only the
//! Inactive→Active edge notifies (plus Active→Inactive when enabled); price
//! drift inside a state never does. Link-discovery targets instead notify once
//! per identifier missing from the seen-set and then remember it forever.
//!
//! The engine is pure: callers decide whether the returned state is persisted
//! and whether the notifications are sent.

use chrono::{DateTime, Utc};

use crate::condition::Observation;
use crate::message;
use crate::state::PersistedState;
use crate::targets::{TargetConfig, TargetKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPolicy {
    /// Send a "condition ended" message on Active→Inactive.
    pub notify_on_end: bool,
    /// Deals per catalog message.
    pub top_n: usize,
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self {
            notify_on_end: false,
            top_n: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Unchanged,
    Started,
    Ended,
    NewItems(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub kind: TransitionKind,
    pub notifications: Vec<String>,
    pub next_state: PersistedState,
}

/// Compares an observation against the stored state.
#[must_use]
pub fn decide(
    target: &TargetConfig,
    previous: &PersistedState,
    observation: &Observation,
    policy: &TransitionPolicy,
    now: DateTime<Utc>,
) -> Transition {
    let condition = &observation.condition;

    let mut next_state = previous.clone();
    next_state.sale_active = condition.favorable;
    next_state.last_price = condition.current_price;
    next_state.last_reference_price = condition.reference_price;
    next_state.last_signature.clone_from(&condition.signature);
    next_state.last_checked_at = Some(now);

    if target.kind.uses_seen_set() {
        let mut notifications = Vec::new();
        for item in &observation.items {
            // `insert` also dedupes repeated links within one document.
            if next_state.seen.insert(item.id.clone()) {
                notifications.push(message::new_item(target, item));
            }
        }
        let kind = if notifications.is_empty() {
            TransitionKind::Unchanged
        } else {
            TransitionKind::NewItems(notifications.len())
        };
        return Transition {
            kind,
            notifications,
            next_state,
        };
    }

    let (kind, notifications) = match (previous.sale_active, condition.favorable) {
        (false, true) => {
            let notifications = match target.kind {
                TargetKind::CatalogJson => {
                    message::catalog_sale_started(target, observation, policy.top_n)
                }
                TargetKind::StructuredMetadata | TargetKind::LinkDiscovery => {
                    vec![message::page_sale_started(target, condition)]
                }
            };
            (TransitionKind::Started, notifications)
        }
        (true, false) => {
            let notifications = if policy.notify_on_end {
                vec![message::condition_ended(target)]
            } else {
                Vec::new()
            };
            (TransitionKind::Ended, notifications)
        }
        _ => (TransitionKind::Unchanged, Vec::new()),
    };

    Transition {
        kind,
        notifications,
        next_state,
    }
}

#[cfg(test)]
#[path = "transition_test.rs"]
mod tests;
