use std::time::Duration;

use crate::bus::{Event, Publisher};

use super::{OutboxMessage, OutboxStore};
use crate::store::StoreError;

/// Outcome of one polling cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleResult {
    /// The broker was unreachable; nothing was claimed or touched.
    pub skipped: bool,
    pub claimed: usize,
    pub published: usize,
    pub released: usize,
    pub failed: usize,
}

/// Drains the outbox and publishes to a broker.
///
/// Each cycle claims a batch of pending rows under a lease and publishes
/// them independently: one failing message never stops the rest of the
/// batch. Publish failures stay inside the worker. By the time a row
/// exists the originating command already succeeded, so errors here are
/// retried, then surfaced to operators, never to the original caller.
pub struct OutboxWorker<P> {
    publisher: P,
    service: String,
    worker_id: String,
    batch_size: usize,
    lease: Duration,
    max_retries: u32,
}

impl<P> OutboxWorker<P> {
    /// Create a worker publishing on behalf of `service` (the routing-key
    /// prefix for every event it delivers).
    pub fn new(publisher: P, service: impl Into<String>) -> Self {
        Self {
            publisher,
            service: service.into(),
            worker_id: format!("outbox-worker-{}", std::process::id()),
            batch_size: 10,
            lease: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    pub fn with_worker_id(mut self, id: impl Into<String>) -> Self {
        self.worker_id = id.into();
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}

impl<P: Publisher> OutboxWorker<P> {
    /// Run one polling cycle against the store.
    ///
    /// With no broker connection the cycle is skipped entirely: no rows
    /// claimed, no attempt counters touched.
    pub fn run_cycle<R: OutboxStore>(&self, store: &R) -> Result<CycleResult, StoreError> {
        if !self.publisher.is_connected() {
            tracing::debug!(service = %self.service, "broker unavailable, skipping outbox cycle");
            return Ok(CycleResult {
                skipped: true,
                ..CycleResult::default()
            });
        }

        let batch = store.claim_pending(
            &self.worker_id,
            self.batch_size,
            self.lease,
            self.max_retries,
        )?;

        let mut result = CycleResult {
            claimed: batch.len(),
            ..CycleResult::default()
        };

        for message in batch {
            match self.publisher.publish(self.to_event(&message)) {
                Ok(()) => {
                    store.complete_message(&message.id)?;
                    result.published += 1;
                }
                Err(err) => {
                    let error = err.to_string();
                    let attempts = store.release_message(&message.id, &error)?;
                    if attempts >= self.max_retries {
                        store.fail_message(&message.id, &error)?;
                        result.failed += 1;
                        tracing::error!(
                            id = %message.id,
                            event_type = %message.event_type,
                            attempts,
                            error = %error,
                            "outbox message exhausted its retry budget, flagged for operator attention"
                        );
                    } else {
                        result.released += 1;
                        tracing::warn!(
                            id = %message.id,
                            attempts,
                            error = %error,
                            "outbox publish failed, will retry"
                        );
                    }
                }
            }
        }

        Ok(result)
    }

    fn to_event(&self, message: &OutboxMessage) -> Event {
        Event::new(
            &message.id,
            &message.event_type,
            &self.service,
            message.payload.clone(),
        )
    }
}
