use serde::{Deserialize, Serialize};

/// Billing address attached to an order payment instrument, forwarded to
/// gateways as call metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAddress {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_extension: Option<String>,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub postal_code: String,
    pub country_code: String,
}
