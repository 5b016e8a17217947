use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

/// Delivery status of an outbox row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxStatus {
    #[default]
    Pending,
    InFlight,
    Published,
    Failed,
}

/// A durably queued domain event, written in the same transaction as the
/// aggregate mutation that raised it.
///
/// The identity is deterministic (`{aggregate_id}:{event_type}:{version}`),
/// so a consumer seeing the same message twice can deduplicate.
/// `worker_id` and `leased_until` implement the claim mechanism that lets
/// several publisher instances drain the same outbox without double
/// publishing; an expired lease makes the row claimable again.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: String,
    pub event_type: String,
    pub payload: Vec<u8>,
    pub status: OutboxStatus,
    pub created_at: SystemTime,
    pub processed_at: Option<SystemTime>,
    pub last_error: Option<String>,
    pub attempts: u32,
    pub worker_id: Option<String>,
    pub leased_until: Option<SystemTime>,
    /// Creation order within the owning service, assigned at commit.
    pub seq: u64,
}

impl OutboxMessage {
    /// Build one row for a raised domain event.
    pub fn for_event<E: DomainEvent>(
        aggregate_id: &str,
        version: u64,
        event: &E,
        now: SystemTime,
    ) -> Result<Self, bitcode::Error> {
        Ok(OutboxMessage {
            id: format!("{}:{}:{}", aggregate_id, event.event_type(), version),
            event_type: event.event_type().to_string(),
            payload: event.encode()?,
            status: OutboxStatus::Pending,
            created_at: now,
            processed_at: None,
            last_error: None,
            attempts: 0,
            worker_id: None,
            leased_until: None,
            seq: 0,
        })
    }

    /// Build one row per raised event, in order.
    pub fn from_events<E: DomainEvent>(
        aggregate_id: &str,
        version: u64,
        events: &[E],
        now: SystemTime,
    ) -> Result<Vec<Self>, bitcode::Error> {
        events
            .iter()
            .map(|event| Self::for_event(aggregate_id, version, event, now))
            .collect()
    }

    /// Decode the payload back into its typed form.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, bitcode::Error> {
        bitcode::deserialize(&self.payload)
    }

    pub fn is_pending(&self) -> bool {
        self.status == OutboxStatus::Pending
    }

    pub fn is_published(&self) -> bool {
        self.status == OutboxStatus::Published
    }

    pub fn is_failed(&self) -> bool {
        self.status == OutboxStatus::Failed
    }

    fn lease_expired(&self, now: SystemTime) -> bool {
        match self.leased_until {
            Some(until) => now >= until,
            None => true,
        }
    }

    /// Whether a worker may take this row: pending, or in flight under a
    /// lease that has expired (a crashed worker's claim).
    pub fn is_claimable(&self, now: SystemTime) -> bool {
        match self.status {
            OutboxStatus::Pending => true,
            OutboxStatus::InFlight => self.lease_expired(now),
            OutboxStatus::Published | OutboxStatus::Failed => false,
        }
    }

    /// Take the row for publishing under a lease. No-op unless the row
    /// is claimable, so a published row can never re-enter flight.
    pub fn claim(&mut self, worker_id: impl Into<String>, lease: Duration, now: SystemTime) {
        if !self.is_claimable(now) {
            return;
        }
        self.status = OutboxStatus::InFlight;
        self.worker_id = Some(worker_id.into());
        self.leased_until = Some(now + lease);
    }

    /// Publish succeeded: stamp `processed_at`. A published row is never
    /// claimable again.
    pub fn complete(&mut self, now: SystemTime) {
        self.status = OutboxStatus::Published;
        self.processed_at = Some(now);
        self.worker_id = None;
        self.leased_until = None;
    }

    /// Publish failed: count the attempt, record the error, return the
    /// row to the pending pool.
    pub fn release(&mut self, error: impl Into<String>) {
        self.status = OutboxStatus::Pending;
        self.attempts += 1;
        self.last_error = Some(error.into());
        self.worker_id = None;
        self.leased_until = None;
    }

    /// Retry budget exhausted: park the row for operator attention. Never
    /// applied to published rows.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.status == OutboxStatus::Published {
            return;
        }
        self.status = OutboxStatus::Failed;
        self.last_error = Some(error.into());
        self.worker_id = None;
        self.leased_until = None;
    }
}
