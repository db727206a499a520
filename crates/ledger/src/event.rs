use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{EventId, Money, OrderNumber};
use instrument::OrderPaymentInstrument;
use serde::{Deserialize, Serialize};

/// Event data key set to `"true"` when a gateway call timed out.
pub const EVENT_DATA_TIMEOUT: &str = "timeout";

/// Event data key carrying the gateway's own reference for the call.
pub const EVENT_DATA_PROVIDER_REFERENCE: &str = "providerReferenceId";

/// Event data key carrying the gateway's decline or error detail.
pub const EVENT_DATA_ERROR_DETAIL: &str = "errorDetail";

/// The kind of payment operation an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// A hold placed on an instrument's available limit.
    Reserve,
    /// Replacement of a standing reservation's open amount.
    ModifyReserve,
    /// Release of part or all of a reservation's open amount.
    CancelReserve,
    /// Settlement of a reserved amount.
    Charge,
    /// Reversal of a settled charge.
    Credit,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransactionType::Reserve => "RESERVE",
            TransactionType::ModifyReserve => "MODIFY_RESERVE",
            TransactionType::CancelReserve => "CANCEL_RESERVE",
            TransactionType::Charge => "CHARGE",
            TransactionType::Credit => "CREDIT",
        };
        write!(f, "{name}")
    }
}

/// Outcome of the gateway call an event records.
///
/// Only `Approved` events move money; the others are the audit trail of
/// declines, provider failures and skipped release attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Approved,
    Declined,
    Skipped,
    Failed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PaymentStatus::Approved => "APPROVED",
            PaymentStatus::Declined => "DECLINED",
            PaymentStatus::Skipped => "SKIPPED",
            PaymentStatus::Failed => "FAILED",
        };
        write!(f, "{name}")
    }
}

/// One immutable ledger entry: the outcome of a single attempted operation
/// against a single instrument.
///
/// Events are created exactly once by the orchestrator, appended to the
/// ledger, and never mutated or deleted; corrections are expressed as new
/// events. `parent_guid` links a derived event (a charge, cancellation,
/// modification or credit) to the event it consumes, forming chains rooted
/// at reservations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    pub guid: EventId,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_guid: Option<EventId>,

    /// The order number this event belongs to.
    pub reference_id: OrderNumber,

    pub order_payment_instrument: OrderPaymentInstrument,

    /// True when the instrument was explicitly selected in the triggering
    /// request, false when it was reached only through ledger history.
    pub original_instrument: bool,

    /// Always non-negative; a credit's direction is implied by its type,
    /// never by the sign of the stored number.
    pub amount: Money,

    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    pub status: PaymentStatus,

    pub timestamp: DateTime<Utc>,

    /// Assigned by the ledger at append time; breaks timestamp ties
    /// deterministically.
    #[serde(default)]
    pub sequence: u64,

    /// Free-form gateway data (provider reference, decline detail, timeout
    /// marker), forwarded back on follow-up calls against this event.
    #[serde(default)]
    pub event_data: HashMap<String, String>,
}

impl PaymentEvent {
    /// Creates an event with a fresh guid and the current timestamp.
    ///
    /// The reference is taken from the instrument's order binding; parent
    /// linkage and event data are filled in by the caller where needed.
    pub fn new(
        transaction_type: TransactionType,
        status: PaymentStatus,
        order_payment_instrument: OrderPaymentInstrument,
        amount: Money,
    ) -> Self {
        Self {
            guid: EventId::new(),
            parent_guid: None,
            reference_id: order_payment_instrument.order_number.clone(),
            order_payment_instrument,
            original_instrument: true,
            amount,
            transaction_type,
            status,
            timestamp: Utc::now(),
            sequence: 0,
            event_data: HashMap::new(),
        }
    }

    /// True when the gateway approved the recorded operation.
    pub fn is_approved(&self) -> bool {
        self.status == PaymentStatus::Approved
    }

    /// The order-scoped instrument this event was recorded against.
    pub fn instrument_guid(&self) -> common::OrderInstrumentId {
        self.order_payment_instrument.guid
    }
}
