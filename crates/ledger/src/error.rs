use common::OrderNumber;
use thiserror::Error;

/// Errors that can occur when interacting with a ledger store.
///
/// Business-rule failures never appear here; they are rejected by the
/// orchestrator before anything reaches storage. A store only fails on
/// mechanical grounds or when a caller tries to make it break the
/// append-only contract.
#[derive(Debug, Error)]
pub enum LedgerStoreError {
    /// A write would drop or rewrite events already persisted for an order.
    #[error("Append-only violation for order {reference_id}: {detail}")]
    AppendOnlyViolation {
        reference_id: OrderNumber,
        detail: String,
    },

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage backend failed.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for ledger store operations.
pub type Result<T> = std::result::Result<T, LedgerStoreError>;
