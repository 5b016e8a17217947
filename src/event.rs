//! Domain event contract.
//!
//! Aggregates return the events they raise as explicit values from each
//! mutating call; there is no hidden event buffer on the aggregate. The
//! command handler that applied the mutation turns the events into outbox
//! rows and commits them in the same transaction as the aggregate write.

/// A domain event that can be serialized into an outbox row or bus message.
pub trait DomainEvent {
    /// Stable type tag, e.g. "SeatsReserved". Used for routing keys and
    /// idempotent consumption downstream.
    fn event_type(&self) -> &'static str;

    /// Serialize the payload to compact binary.
    fn encode(&self) -> Result<Vec<u8>, bitcode::Error>;
}
