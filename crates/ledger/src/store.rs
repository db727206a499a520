use async_trait::async_trait;

use common::{OrderInstrumentId, OrderNumber};

use crate::{Ledger, PaymentEvent, Result};

/// Persistence port for ledgers.
///
/// The core never persists anything itself; callers hand the updated ledger
/// value to an implementation of this trait. Implementations must preserve
/// the append-only contract: once an event is stored for an order it is
/// never edited or removed. All implementations must be thread-safe
/// (Send + Sync).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persists a ledger value, replacing the stored one for the same order.
    ///
    /// Fails with `AppendOnlyViolation` if the new value does not contain
    /// every event already stored for that order.
    async fn save(&self, ledger: &Ledger) -> Result<()>;

    /// Loads the ledger for an order, or None if the order is unknown.
    async fn load(&self, reference_id: &OrderNumber) -> Result<Option<Ledger>>;

    /// Loads one instrument's events for an order, ordered like the ledger.
    ///
    /// This is the `(referenceId, instrument guid)` index query backing the
    /// per-instrument fold paths.
    async fn events_for_instrument(
        &self,
        reference_id: &OrderNumber,
        instrument: OrderInstrumentId,
    ) -> Result<Vec<PaymentEvent>>;
}

/// Extension trait providing convenience methods for ledger stores.
#[async_trait]
pub trait LedgerStoreExt: LedgerStore {
    /// Checks if any events are stored for an order.
    async fn order_exists(&self, reference_id: &OrderNumber) -> Result<bool> {
        Ok(self
            .load(reference_id)
            .await?
            .is_some_and(|ledger| !ledger.is_empty()))
    }
}

// Blanket implementation for all LedgerStore implementations
impl<T: LedgerStore + ?Sized> LedgerStoreExt for T {}
