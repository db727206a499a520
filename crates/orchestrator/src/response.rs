use std::collections::HashSet;

use common::EventId;
use ledger::{Ledger, PaymentEvent, PaymentStatus};
use serde::{Deserialize, Serialize};

/// Outcome of one orchestration operation.
///
/// Carries the events generated by this invocation and the input ledger
/// with those events appended. Persisting the updated ledger is the
/// caller's responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentApiResponse {
    pub events: Vec<PaymentEvent>,
    pub ledger: Ledger,
}

impl PaymentApiResponse {
    /// Builds a response by appending the generated events to the base
    /// ledger; the returned events carry their assigned sequence numbers.
    pub fn new(base: &Ledger, events: Vec<PaymentEvent>) -> Self {
        let guids: HashSet<EventId> = events.iter().map(|event| event.guid).collect();
        let ledger = base.append(events);
        let events = ledger
            .events()
            .iter()
            .filter(|event| guids.contains(&event.guid))
            .cloned()
            .collect();
        Self { events, ledger }
    }

    /// True when every generated event was approved by its gateway.
    ///
    /// An empty invocation (nothing to do) counts as fully approved.
    pub fn all_approved(&self) -> bool {
        self.events.iter().all(PaymentEvent::is_approved)
    }

    /// Events that did not come back approved.
    pub fn unapproved_events(&self) -> Vec<&PaymentEvent> {
        self.events
            .iter()
            .filter(|event| event.status != PaymentStatus::Approved)
            .collect()
    }
}
