use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a payment event in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<EventId> for Uuid {
    fn from(id: EventId) -> Self {
        id.0
    }
}

/// Unique identifier for a reusable payment instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(Uuid);

impl InstrumentId {
    /// Creates a new random instrument ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an instrument ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for InstrumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for InstrumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<InstrumentId> for Uuid {
    fn from(id: InstrumentId) -> Self {
        id.0
    }
}

/// Unique identifier for an order-scoped payment instrument binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderInstrumentId(Uuid);

impl OrderInstrumentId {
    /// Creates a new random order instrument ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an order instrument ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrderInstrumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderInstrumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OrderInstrumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<OrderInstrumentId> for Uuid {
    fn from(id: OrderInstrumentId) -> Self {
        id.0
    }
}

/// Identifier of the payment provider configuration an instrument is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderConfigId(Uuid);

impl ProviderConfigId {
    /// Creates a new random provider configuration ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a provider configuration ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ProviderConfigId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProviderConfigId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ProviderConfigId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ProviderConfigId> for Uuid {
    fn from(id: ProviderConfigId) -> Self {
        id.0
    }
}

/// Order number used as the ledger reference ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Creates a new order number from a string.
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Returns the order number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Key a gateway uses to deduplicate retried calls representing the same
/// physical operation.
///
/// Derived from the guid of the payment event the call produces, so replays
/// of one call collapse while a fresh caller retry (fresh event, fresh guid)
/// goes through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Derives the idempotency key for the gateway call producing `event_id`.
    pub fn from_event(event_id: EventId) -> Self {
        Self(event_id.as_uuid().to_string())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
