//! Append-only payment event ledger.
//!
//! This crate provides the source of truth for an order's payment state:
//! - [`PaymentEvent`], one immutable record per attempted gateway operation
//! - [`Ledger`], the ordered event log with its balance fold queries
//! - [`LedgerStore`], the persistence port, with an in-memory double

pub mod error;
pub mod event;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod memory;
pub mod store;

pub use error::{LedgerStoreError, Result};
pub use event::{
    EVENT_DATA_ERROR_DETAIL, EVENT_DATA_PROVIDER_REFERENCE, EVENT_DATA_TIMEOUT, PaymentEvent,
    PaymentStatus, TransactionType,
};
pub use ledger::{ChainState, Ledger};
pub use memory::InMemoryLedgerStore;
pub use store::{LedgerStore, LedgerStoreExt};
