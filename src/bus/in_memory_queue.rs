//! In-memory queue for tests and single-process deployments.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use super::{Event, PublishError, Publisher, Subscriber};

/// Thread-safe in-memory queue implementing both `Publisher` and
/// `Subscriber`.
///
/// Events live in an append-only log shared by all clones; each
/// subscriber handle tracks its own read position. The connection flag
/// simulates broker outages: while disconnected, publishes fail with
/// `PublishError::Disconnected` and `is_connected()` reports false.
#[derive(Clone)]
pub struct InMemoryQueue {
    log: Arc<RwLock<Vec<Event>>>,
    position: Arc<Mutex<usize>>,
    acked: Arc<Mutex<Vec<String>>>,
    connected: Arc<AtomicBool>,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            log: Arc::new(RwLock::new(Vec::new())),
            position: Arc::new(Mutex::new(0)),
            acked: Arc::new(Mutex::new(Vec::new())),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Create an independent subscriber over the same log.
    pub fn new_subscriber(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
            position: Arc::new(Mutex::new(0)),
            acked: Arc::new(Mutex::new(Vec::new())),
            connected: Arc::clone(&self.connected),
        }
    }

    /// Toggle the simulated broker connection. Affects all clones.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<Event> {
        match self.log.read() {
            Ok(log) => log.clone(),
            Err(_) => Vec::new(),
        }
    }

    pub fn event_types(&self) -> Vec<String> {
        self.events().iter().map(|e| e.event_type.clone()).collect()
    }

    pub fn routing_keys(&self) -> Vec<String> {
        self.events().iter().map(Event::routing_key).collect()
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find_all_by_type(&self, event_type: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }
}

impl Publisher for InMemoryQueue {
    fn publish(&self, event: Event) -> Result<(), PublishError> {
        if !self.is_connected() {
            return Err(PublishError::Disconnected);
        }
        let mut log = self
            .log
            .write()
            .map_err(|e| PublishError::Other(e.to_string().into()))?;
        log.push(event);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Subscriber for InMemoryQueue {
    fn poll(&self, timeout_ms: u64) -> Result<Option<Event>, PublishError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        loop {
            {
                let log = self
                    .log
                    .read()
                    .map_err(|e| PublishError::Other(e.to_string().into()))?;
                let mut pos = self
                    .position
                    .lock()
                    .map_err(|e| PublishError::Other(e.to_string().into()))?;

                if *pos < log.len() {
                    let event = log[*pos].clone();
                    *pos += 1;
                    return Ok(Some(event));
                }
            }

            if Instant::now() >= deadline {
                return Ok(None);
            }

            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn ack(&self, event_id: &str) -> Result<(), PublishError> {
        let mut acked = self
            .acked
            .lock()
            .map_err(|e| PublishError::Other(e.to_string().into()))?;
        acked.push(event_id.to_string());
        Ok(())
    }

    fn nack(&self, _event_id: &str, _reason: &str) -> Result<(), PublishError> {
        // Events stay in the log; in-memory queue has no redelivery.
        Ok(())
    }
}
