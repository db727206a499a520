//! Orchestration error types.

use common::{EventId, Money, MoneyError};
use thiserror::Error;

/// Failures raised before any gateway call is made.
///
/// Every variant carries the violated constraint's numbers so callers can
/// render a precise message. Gateway declines and failures are never errors;
/// they come back as payment events with the matching status.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestrationError {
    /// The request named no payment instruments.
    #[error("No payment instruments selected")]
    NoInstrumentsSelected,

    /// The request amount is not in the ledger's currency.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    /// A charge asked for more than the selected instruments have reserved.
    #[error("Charge of {requested} exceeds the available reservation of {available}")]
    ChargeExceedsReservation { requested: Money, available: Money },

    /// A downward modification would no longer cover what has been charged.
    #[error("Reservation of {requested} would drop below the charged amount of {charged}")]
    ReservationBelowChargedAmount { requested: Money, charged: Money },

    /// A cancellation asked for more than the named events still hold open.
    #[error("Cancellation of {requested} exceeds the open amount of {open}")]
    OverCancellation { requested: Money, open: Money },

    /// A credit asked for more than has been charged and not yet credited.
    #[error("Credit of {requested} exceeds the refundable charged amount of {refundable}")]
    CreditExceedsCharged { requested: Money, refundable: Money },

    /// The selected instruments cannot cover the requested amount.
    #[error("Selected instruments cannot cover {requested}; only {available} is reservable")]
    InsufficientInstrumentCapacity { requested: Money, available: Money },

    /// A request named a payment event the ledger does not contain.
    #[error("Payment event {0} is not present in the ledger")]
    UnknownPaymentEvent(EventId),
}

impl From<MoneyError> for OrchestrationError {
    fn from(err: MoneyError) -> Self {
        match err {
            MoneyError::CurrencyMismatch { left, right } => {
                Self::CurrencyMismatch { left, right }
            }
            // Split errors cannot escape: the orchestrator never splits by
            // weights it did not derive from positive balances.
            MoneyError::EmptySplit | MoneyError::InvalidWeights => Self::NoInstrumentsSelected,
        }
    }
}

/// Result type for orchestration operations.
pub type Result<T> = std::result::Result<T, OrchestrationError>;
