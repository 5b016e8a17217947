//! Transactional outbox.
//!
//! Command handlers insert one row per raised domain event in the same
//! local transaction as the aggregate write (see `store`), so a crash
//! between commit and broker publish never loses an event. The
//! background worker claims rows under a lease, publishes them to the
//! broker, and stamps or retries them. Delivery is at-least-once with
//! dedup-friendly message identities, never more than max_retries
//! attempts, and nothing is ever deleted automatically.

mod message;
mod store;
mod thread;
mod worker;

pub use message::{OutboxMessage, OutboxStatus};
pub use store::OutboxStore;
pub use thread::{OutboxWorkerThread, WorkerStats};
pub use worker::{CycleResult, OutboxWorker};
