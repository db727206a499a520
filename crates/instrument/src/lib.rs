//! Payment instruments and their order-scoped bindings.
//!
//! A [`PaymentInstrument`] is a reusable payment method; an
//! [`OrderPaymentInstrument`] attaches one to a single order with a spending
//! limit and billing details. Both are immutable records consumed by the
//! ledger and orchestrator crates.

pub mod address;
#[allow(clippy::module_inception)]
pub mod instrument;
pub mod order_instrument;

pub use address::BillingAddress;
pub use instrument::PaymentInstrument;
pub use order_instrument::OrderPaymentInstrument;
