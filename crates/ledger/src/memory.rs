use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use common::{OrderInstrumentId, OrderNumber};

use crate::{Ledger, LedgerStore, LedgerStoreError, PaymentEvent, Result};

/// In-memory ledger store implementation for testing.
///
/// Holds ledger values keyed by order number and enforces the same
/// append-only contract a durable implementation must.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    ledgers: Arc<RwLock<HashMap<OrderNumber, Ledger>>>,
}

impl InMemoryLedgerStore {
    /// Creates a new empty in-memory ledger store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders with a stored ledger.
    pub async fn order_count(&self) -> usize {
        self.ledgers.read().await.len()
    }

    /// Clears all stored ledgers.
    pub async fn clear(&self) {
        self.ledgers.write().await.clear();
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn save(&self, ledger: &Ledger) -> Result<()> {
        let mut ledgers = self.ledgers.write().await;

        if let Some(existing) = ledgers.get(ledger.reference_id()) {
            for event in existing.events() {
                if !ledger.contains(event.guid) {
                    return Err(LedgerStoreError::AppendOnlyViolation {
                        reference_id: ledger.reference_id().clone(),
                        detail: format!("stored event {} is missing from the new value", event.guid),
                    });
                }
            }
        }

        let appended = ledger.len()
            - ledgers
                .get(ledger.reference_id())
                .map_or(0, |existing| existing.len());
        ledgers.insert(ledger.reference_id().clone(), ledger.clone());

        metrics::counter!("ledger_events_persisted_total").increment(appended as u64);
        tracing::debug!(
            order = %ledger.reference_id(),
            appended,
            total = ledger.len(),
            "ledger saved"
        );
        Ok(())
    }

    async fn load(&self, reference_id: &OrderNumber) -> Result<Option<Ledger>> {
        Ok(self.ledgers.read().await.get(reference_id).cloned())
    }

    async fn events_for_instrument(
        &self,
        reference_id: &OrderNumber,
        instrument: OrderInstrumentId,
    ) -> Result<Vec<PaymentEvent>> {
        let ledgers = self.ledgers.read().await;
        Ok(ledgers
            .get(reference_id)
            .map(|ledger| {
                ledger
                    .events()
                    .iter()
                    .filter(|event| event.instrument_guid() == instrument)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
