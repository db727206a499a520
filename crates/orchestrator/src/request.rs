//! Request records accepted by the orchestration API.
//!
//! All requests are plain immutable records: the caller supplies the
//! selected instruments, the amount, the prior ledger snapshot and the
//! order context. Serialization is lossless and uses the wire field names
//! of the orchestration API.

use std::collections::HashMap;

use common::{EventId, Money, OrderNumber};
use instrument::OrderPaymentInstrument;
use ledger::Ledger;
use serde::{Deserialize, Serialize};

/// One order line, carried on gateway calls as metadata only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub sku: String,
    pub display_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Order details forwarded to gateways with every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderContext {
    pub order_number: OrderNumber,
    pub currency_code: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl OrderContext {
    /// Creates a context with no line items.
    pub fn new(order_number: OrderNumber, currency_code: impl Into<String>) -> Self {
        Self {
            order_number,
            currency_code: currency_code.into(),
            line_items: Vec::new(),
        }
    }
}

/// Places holds for an amount across the selected instruments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRequest {
    /// Instruments in customer/business priority order.
    pub instruments: Vec<OrderPaymentInstrument>,
    pub amount: Money,
    pub ledger: Ledger,
    pub order_context: OrderContext,
    #[serde(default)]
    pub custom_request_data: HashMap<String, String>,
}

/// Settles up to the given total against standing reservations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    pub instruments: Vec<OrderPaymentInstrument>,
    pub total_chargeable_amount: Money,
    pub ledger: Ledger,
    pub order_context: OrderContext,
    #[serde(default)]
    pub custom_request_data: HashMap<String, String>,
}

/// Adjusts the standing reservations to a new total without charging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyReservationRequest {
    pub instruments: Vec<OrderPaymentInstrument>,
    /// The new desired total (open plus already charged).
    pub amount: Money,
    pub ledger: Ledger,
    pub order_context: OrderContext,
    #[serde(default)]
    pub custom_request_data: HashMap<String, String>,
}

/// Releases an amount held by specifically named reservation events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationRequest {
    pub instruments: Vec<OrderPaymentInstrument>,
    /// Prior RESERVE/MODIFY_RESERVE events to release.
    pub selected_payment_events_to_cancel: Vec<EventId>,
    pub amount: Money,
    pub ledger: Ledger,
    pub order_context: OrderContext,
    #[serde(default)]
    pub custom_request_data: HashMap<String, String>,
}

/// Releases every open reservation on the given instruments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAllReservationsRequest {
    pub instruments: Vec<OrderPaymentInstrument>,
    pub ledger: Ledger,
    pub order_context: OrderContext,
    #[serde(default)]
    pub custom_request_data: HashMap<String, String>,
}

/// Reverses settled charges on the selected instruments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditRequest {
    /// All instruments attached to the order, for context.
    pub instruments: Vec<OrderPaymentInstrument>,
    /// Instruments to credit, in priority order.
    pub selected_order_payment_instruments: Vec<OrderPaymentInstrument>,
    pub amount: Money,
    pub ledger: Ledger,
    pub order_context: OrderContext,
    #[serde(default)]
    pub custom_request_data: HashMap<String, String>,
}
