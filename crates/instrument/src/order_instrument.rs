use std::collections::HashMap;

use common::{Money, OrderInstrumentId, OrderNumber};
use serde::{Deserialize, Serialize};

use crate::{BillingAddress, PaymentInstrument};

/// Binds a [`PaymentInstrument`] to one order, with an optional spending
/// ceiling.
///
/// Created at checkout when the customer selects payment methods; immutable
/// for the life of the order, though additional bindings may be added later
/// for returns and adjustments. A zero `limit` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPaymentInstrument {
    pub guid: OrderInstrumentId,
    pub order_number: OrderNumber,
    pub instrument: PaymentInstrument,

    /// Spending ceiling for this order; zero means unlimited.
    pub limit: Money,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<BillingAddress>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    /// Per-order instrument data forwarded verbatim to the gateway.
    #[serde(default)]
    pub instrument_data: HashMap<String, String>,
}

impl OrderPaymentInstrument {
    /// Creates a binding with no billing address or email attached.
    pub fn new(
        order_number: OrderNumber,
        instrument: PaymentInstrument,
        limit: Money,
    ) -> Self {
        Self {
            guid: OrderInstrumentId::new(),
            order_number,
            instrument,
            limit,
            billing_address: None,
            customer_email: None,
            instrument_data: HashMap::new(),
        }
    }

    /// True when this binding carries no spending ceiling.
    pub fn is_unlimited(&self) -> bool {
        self.limit.is_zero()
    }
}
