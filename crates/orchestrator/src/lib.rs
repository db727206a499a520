//! Payment transaction orchestration.
//!
//! This crate coordinates reservation, charge, modification, cancellation
//! and credit operations across the payment instruments attached to one
//! order:
//! - [`allocator`] splits a requested amount across instruments
//! - [`Orchestrator`] runs the six operations against a [`PaymentGateway`]
//! - request/response records form the orchestration API surface
//!
//! The orchestrator holds no shared mutable state; each invocation
//! transforms an immutable ledger snapshot plus a request into new payment
//! events. Serializing writes per order is the caller's concern.

pub mod allocator;
pub mod error;
pub mod gateway;
#[allow(clippy::module_inception)]
pub mod orchestrator;
pub mod request;
pub mod response;

pub use allocator::{Allocation, allocate};
pub use error::{OrchestrationError, Result};
pub use gateway::{
    GatewayError, GatewayRequest, GatewayResponse, GatewayStatus, InMemoryPaymentGateway,
    PaymentGateway,
};
pub use orchestrator::Orchestrator;
pub use request::{
    CancelAllReservationsRequest, CancelReservationRequest, ChargeRequest, CreditRequest,
    LineItem, ModifyReservationRequest, OrderContext, ReserveRequest,
};
pub use response::PaymentApiResponse;
