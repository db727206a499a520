//! Shared types for the payment orchestration ledger.

pub mod money;
pub mod types;

pub use money::{Money, MoneyError};
pub use types::{
    EventId, IdempotencyKey, InstrumentId, OrderInstrumentId, OrderNumber, ProviderConfigId,
};
