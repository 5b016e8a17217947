//! Broker publish contract.

use std::error::Error;
use std::fmt;

/// A message handed to the broker.
///
/// Carries a stable identifier equal to the originating outbox row's
/// identity and a type tag equal to the event type name, so downstream
/// consumers can deduplicate and dispatch without decoding the payload.
#[derive(Clone, Debug)]
pub struct Event {
    /// Stable, dedup-friendly identifier.
    pub id: String,
    /// Event type tag (e.g. "SeatsReserved").
    pub event_type: String,
    /// Originating service (e.g. "ride", "booking").
    pub source: String,
    /// Serialized payload.
    pub payload: Vec<u8>,
    /// Optional headers (correlation ids, trace context).
    pub metadata: Option<Vec<(String, String)>>,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        event_type: impl Into<String>,
        source: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            source: source.into(),
            payload,
            metadata: None,
        }
    }

    /// Routing key: `<service>.<eventType>`.
    pub fn routing_key(&self) -> String {
        format!("{}.{}", self.source, self.event_type)
    }

    /// Decode the payload from its compact binary form.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, bitcode::Error> {
        bitcode::deserialize(&self.payload)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }
}

/// Error type for publish operations.
#[derive(Debug)]
pub enum PublishError {
    /// No connection to the broker.
    Disconnected,
    /// The broker rejected the message.
    Rejected(String),
    /// Timeout waiting for broker acknowledgment.
    Timeout,
    /// Other transport error.
    Other(Box<dyn Error + Send + Sync>),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Disconnected => write!(f, "broker connection unavailable"),
            PublishError::Rejected(msg) => write!(f, "message rejected: {}", msg),
            PublishError::Timeout => write!(f, "publish timeout"),
            PublishError::Other(e) => write!(f, "publish error: {}", e),
        }
    }
}

impl Error for PublishError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PublishError::Other(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Trait for publishing events to a message broker.
///
/// Implementations deliver with persistent semantics where the transport
/// supports it; the outbox layer supplies retry, so `publish` should fail
/// fast rather than retry internally.
pub trait Publisher: Send + Sync {
    /// Publish a single event.
    fn publish(&self, event: Event) -> Result<(), PublishError>;

    /// Whether a broker connection is currently available.
    ///
    /// The outbox publisher checks this before claiming work: with no
    /// connection it skips the whole cycle rather than burn retry budget.
    fn is_connected(&self) -> bool {
        true
    }
}

/// Pull-based consumption from a broker.
pub trait Subscriber: Send + Sync {
    /// Poll for the next event, blocking until one is available or timeout.
    fn poll(&self, timeout_ms: u64) -> Result<Option<Event>, PublishError>;

    /// Acknowledge that an event has been processed.
    fn ack(&self, event_id: &str) -> Result<(), PublishError>;

    /// Reject an event (redelivery or dead-letter is up to the transport).
    fn nack(&self, event_id: &str, reason: &str) -> Result<(), PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_key_is_service_dot_event_type() {
        let event = Event::new("ride-1:SeatsReserved:2", "SeatsReserved", "ride", vec![]);
        assert_eq!(event.routing_key(), "ride.SeatsReserved");
    }

    #[test]
    fn metadata_accumulates() {
        let event = Event::new("e-1", "BookingCreated", "booking", vec![])
            .with_metadata("correlation-id", "req-9")
            .with_metadata("trace-id", "t-1");
        let meta = event.metadata.unwrap();
        assert_eq!(meta.len(), 2);
        assert_eq!(meta[0].0, "correlation-id");
    }
}
