use std::time::Duration;

use crate::store::StoreError;

use super::OutboxMessage;

/// Outbox operations a store must expose for the background publisher.
///
/// Claiming is the write side of the horizontal-scaling story: a claim
/// atomically flips matching rows to in-flight under a lease, so two
/// publisher instances polling the same store never pick up the same row.
pub trait OutboxStore {
    /// Claim up to `max` claimable rows in creation order.
    ///
    /// Rows are claimable when pending (or abandoned under an expired
    /// lease) and still under the retry ceiling. Published and failed
    /// rows are never returned.
    fn claim_pending(
        &self,
        worker_id: &str,
        max: usize,
        lease: Duration,
        max_retries: u32,
    ) -> Result<Vec<OutboxMessage>, StoreError>;

    /// Mark a row published, stamping `processed_at`.
    fn complete_message(&self, id: &str) -> Result<(), StoreError>;

    /// Return a row to the pending pool after a failed publish,
    /// incrementing its attempt counter. Returns the new attempt count.
    fn release_message(&self, id: &str, error: &str) -> Result<u32, StoreError>;

    /// Park a row permanently for operator attention.
    fn fail_message(&self, id: &str, error: &str) -> Result<(), StoreError>;

    /// All rows awaiting delivery, in creation order.
    fn pending_messages(&self) -> Result<Vec<OutboxMessage>, StoreError>;

    /// Rows that exhausted their retry budget and need manual intervention.
    fn failed_messages(&self) -> Result<Vec<OutboxMessage>, StoreError>;

    /// Look up a single row.
    fn message(&self, id: &str) -> Result<Option<OutboxMessage>, StoreError>;
}
