//! Payment gateway port and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{IdempotencyKey, Money, OrderInstrumentId};
use instrument::OrderPaymentInstrument;
use ledger::TransactionType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::OrderContext;

/// One transaction request sent to a payment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub instrument: OrderPaymentInstrument,
    pub amount: Money,
    pub order_context: OrderContext,
    pub idempotency_key: IdempotencyKey,
    /// Gateway data of the reservation this call settles or adjusts.
    #[serde(default)]
    pub reservation_data: HashMap<String, String>,
    #[serde(default)]
    pub custom_request_data: HashMap<String, String>,
}

/// Provider's verdict on a transaction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayStatus {
    Approved,
    Declined,
    Error,
}

/// Outcome of one gateway call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status: GatewayStatus,
    pub provider_reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_detail: Option<String>,
    /// Provider data echoed into the resulting event's data map.
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl GatewayResponse {
    /// An approved outcome with the given provider reference.
    pub fn approved(provider_reference_id: impl Into<String>) -> Self {
        Self {
            status: GatewayStatus::Approved,
            provider_reference_id: provider_reference_id.into(),
            error_detail: None,
            data: HashMap::new(),
        }
    }

    /// A declined outcome with the provider's stated reason.
    pub fn declined(provider_reference_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status: GatewayStatus::Declined,
            provider_reference_id: provider_reference_id.into(),
            error_detail: Some(detail.into()),
            data: HashMap::new(),
        }
    }
}

/// Errors a gateway call can fail with before producing a verdict.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The provider could not be reached or dropped the connection.
    #[error("Gateway transport error: {0}")]
    Transport(String),

    /// The provider configuration is unusable for this call.
    #[error("Gateway configuration error: {0}")]
    Configuration(String),
}

/// Trait for single-instrument transaction execution, supplied by gateway
/// plugins.
///
/// The orchestrator makes at most one call per (operation, instrument)
/// pair; `idempotency_key` lets providers deduplicate network-level
/// retries of the same physical call.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Executes one transaction against one instrument's provider.
    async fn execute(&self, request: GatewayRequest) -> Result<GatewayResponse, GatewayError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    declines: HashSet<OrderInstrumentId>,
    failures: HashSet<OrderInstrumentId>,
    delays: HashMap<OrderInstrumentId, Duration>,
    requests: Vec<GatewayRequest>,
    next_reference: u32,
}

/// In-memory payment gateway for testing.
///
/// Approves everything by default; individual instruments can be scripted
/// to decline, fail at the transport level, or respond slowly. Records
/// every request it receives for assertions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new gateway that approves every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the given instrument to be declined.
    pub fn decline_instrument(&self, instrument: OrderInstrumentId) {
        self.state.write().unwrap().declines.insert(instrument);
    }

    /// Scripts the given instrument to fail at the transport level.
    pub fn fail_instrument(&self, instrument: OrderInstrumentId) {
        self.state.write().unwrap().failures.insert(instrument);
    }

    /// Scripts the given instrument to answer after a delay.
    pub fn delay_instrument(&self, instrument: OrderInstrumentId, delay: Duration) {
        self.state.write().unwrap().delays.insert(instrument, delay);
    }

    /// Returns the number of calls received.
    pub fn request_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    /// Returns every request received so far, in call order.
    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.state.read().unwrap().requests.clone()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn execute(&self, request: GatewayRequest) -> Result<GatewayResponse, GatewayError> {
        let delay = self
            .state
            .read()
            .unwrap()
            .delays
            .get(&request.instrument.guid)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();
        let instrument_guid = request.instrument.guid;
        state.requests.push(request);

        if state.failures.contains(&instrument_guid) {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }

        state.next_reference += 1;
        let reference = format!("TXN-{:04}", state.next_reference);
        if state.declines.contains(&instrument_guid) {
            Ok(GatewayResponse::declined(reference, "Insufficient funds"))
        } else {
            Ok(GatewayResponse::approved(reference))
        }
    }
}
