use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use crate::outbox::{OutboxMessage, OutboxStatus, OutboxStore};

use super::{Aggregate, Store, StoreError};

struct Inner<A> {
    aggregates: HashMap<String, A>,
    outbox: Vec<OutboxMessage>,
    outbox_seq: u64,
}

/// In-memory per-service store.
///
/// `Clone` creates another handle onto the same storage (shared via
/// `Arc<RwLock<_>>`), so command handlers and the outbox worker can hold
/// handles concurrently. Aggregate writes and their outbox rows land
/// under a single write lock, the in-memory rendition of "one local
/// transaction".
pub struct MemoryStore<A> {
    inner: Arc<RwLock<Inner<A>>>,
}

impl<A> Clone for MemoryStore<A> {
    fn clone(&self) -> Self {
        MemoryStore {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> Default for MemoryStore<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> MemoryStore<A> {
    pub fn new() -> Self {
        MemoryStore {
            inner: Arc::new(RwLock::new(Inner {
                aggregates: HashMap::new(),
                outbox: Vec::new(),
                outbox_seq: 0,
            })),
        }
    }

    /// Append outbox rows outside an aggregate commit. Administrative
    /// seam, mainly for seeding in tests.
    pub fn append_outbox_rows(&self, rows: Vec<OutboxMessage>) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::LockPoisoned("outbox append"))?;
        append_rows(&mut inner, rows);
        Ok(())
    }

    /// Every outbox row, including published and failed ones. Rows are
    /// retained for audit; the worker never deletes.
    pub fn outbox_messages(&self) -> Result<Vec<OutboxMessage>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::LockPoisoned("outbox read"))?;
        Ok(inner.outbox.clone())
    }
}

fn append_rows<A>(inner: &mut Inner<A>, rows: Vec<OutboxMessage>) {
    for mut row in rows {
        inner.outbox_seq += 1;
        row.seq = inner.outbox_seq;
        inner.outbox.push(row);
    }
}

impl<A: Aggregate> Store<A> for MemoryStore<A> {
    fn get(&self, id: &str) -> Result<Option<A>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(inner.aggregates.get(id).map(|stored| {
            let mut copy = stored.clone();
            copy.mark_committed();
            copy
        }))
    }

    fn commit_with_events(
        &self,
        aggregate: &mut A,
        rows: Vec<OutboxMessage>,
    ) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;

        let stored_version = inner
            .aggregates
            .get(aggregate.id())
            .map(Aggregate::version)
            .unwrap_or(0);
        if stored_version != aggregate.committed_version() {
            return Err(StoreError::VersionConflict {
                id: aggregate.id().to_string(),
                expected: aggregate.committed_version(),
                actual: stored_version,
            });
        }

        aggregate.mark_committed();
        inner
            .aggregates
            .insert(aggregate.id().to_string(), aggregate.clone());
        append_rows(&mut inner, rows);
        Ok(())
    }
}

impl<A: Aggregate> OutboxStore for MemoryStore<A> {
    fn claim_pending(
        &self,
        worker_id: &str,
        max: usize,
        lease: Duration,
        max_retries: u32,
    ) -> Result<Vec<OutboxMessage>, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::LockPoisoned("outbox claim"))?;
        let now = SystemTime::now();

        let mut claimed = Vec::new();
        for row in inner.outbox.iter_mut() {
            if claimed.len() >= max {
                break;
            }
            if row.is_claimable(now) && row.attempts < max_retries {
                row.claim(worker_id, lease, now);
                claimed.push(row.clone());
            }
        }
        Ok(claimed)
    }

    fn complete_message(&self, id: &str) -> Result<(), StoreError> {
        self.with_message(id, |row| row.complete(SystemTime::now()))
    }

    fn release_message(&self, id: &str, error: &str) -> Result<u32, StoreError> {
        let mut attempts = 0;
        self.with_message(id, |row| {
            row.release(error);
            attempts = row.attempts;
        })?;
        Ok(attempts)
    }

    fn fail_message(&self, id: &str, error: &str) -> Result<(), StoreError> {
        self.with_message(id, |row| row.fail(error))
    }

    fn pending_messages(&self) -> Result<Vec<OutboxMessage>, StoreError> {
        Ok(self
            .outbox_messages()?
            .into_iter()
            .filter(|m| m.status == OutboxStatus::Pending)
            .collect())
    }

    fn failed_messages(&self) -> Result<Vec<OutboxMessage>, StoreError> {
        Ok(self
            .outbox_messages()?
            .into_iter()
            .filter(|m| m.status == OutboxStatus::Failed)
            .collect())
    }

    fn message(&self, id: &str) -> Result<Option<OutboxMessage>, StoreError> {
        Ok(self
            .outbox_messages()?
            .into_iter()
            .find(|m| m.id == id))
    }
}

impl<A> MemoryStore<A> {
    fn with_message(
        &self,
        id: &str,
        apply: impl FnOnce(&mut OutboxMessage),
    ) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::LockPoisoned("outbox update"))?;
        let row = inner
            .outbox
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StoreError::MessageNotFound(id.to_string()))?;
        apply(row);
        Ok(())
    }
}
