//! Service bus - the broker publish contract and its included transports.
//!
//! One topic-style destination per originating service; routing key
//! `<service>.<eventType>`; every message carries a stable identifier
//! equal to its outbox row's identity, enabling idempotent consumption
//! downstream.

mod bus;
#[cfg(feature = "emitter")]
mod emitter;
mod in_memory_queue;
mod publisher;

pub use bus::Bus;
#[cfg(feature = "emitter")]
pub use emitter::EmitterPublisher;
pub use in_memory_queue::InMemoryQueue;
pub use publisher::{Event, PublishError, Publisher, Subscriber};
