//! In-process fan-out to notification consumers via `EventEmitter`.

use std::sync::{Arc, Mutex};

use event_emitter_rs::EventEmitter;

use super::{Event, PublishError, Publisher};

/// A publisher that emits events on an in-process `EventEmitter`.
///
/// Listeners register per event type and receive the raw payload bytes.
/// Useful for wiring notification consumers inside a single process
/// without a broker.
pub struct EmitterPublisher {
    emitter: Arc<Mutex<EventEmitter>>,
}

impl EmitterPublisher {
    pub fn new(emitter: Arc<Mutex<EventEmitter>>) -> Self {
        Self { emitter }
    }
}

impl Publisher for EmitterPublisher {
    fn publish(&self, event: Event) -> Result<(), PublishError> {
        let mut emitter = self
            .emitter
            .lock()
            .map_err(|e| PublishError::Other(e.to_string().into()))?;
        emitter.emit(&event.routing_key(), event.payload);
        Ok(())
    }
}
