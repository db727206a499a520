use std::collections::HashMap;

use common::{InstrumentId, ProviderConfigId};
use serde::{Deserialize, Serialize};

/// A reusable payment method, independent of any particular order.
///
/// Typically a tokenized card or account held by a payment provider.
/// Immutable once created; order-scoped concerns (spending limit, billing
/// address) live on [`crate::OrderPaymentInstrument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstrument {
    pub guid: InstrumentId,

    /// Human-readable name shown to customers and agents.
    pub display_name: String,

    /// The provider configuration this instrument transacts through.
    pub provider_config_guid: ProviderConfigId,

    /// Provider capability flags and hints, opaque to the core.
    #[serde(default)]
    pub capability_data: HashMap<String, String>,

    /// The provider only supports one standing reservation at a time on
    /// this instrument; allocation skips it rather than stacking holds.
    pub single_reserve_per_instrument: bool,

    /// The provider allows more than one charge against this instrument
    /// for the same order (split shipments, later adjustments).
    pub supports_multi_charge: bool,
}

impl PaymentInstrument {
    /// Creates an instrument with no capability restrictions.
    pub fn new(display_name: impl Into<String>, provider_config_guid: ProviderConfigId) -> Self {
        Self {
            guid: InstrumentId::new(),
            display_name: display_name.into(),
            provider_config_guid,
            capability_data: HashMap::new(),
            single_reserve_per_instrument: false,
            supports_multi_charge: true,
        }
    }
}
