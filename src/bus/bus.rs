use super::{Event, PublishError, Publisher, Subscriber};

/// Per-service bus handle wrapping a publisher and a subscriber.
pub struct Bus<P: Publisher, S: Subscriber> {
    publisher: P,
    subscriber: S,
}

impl<P: Publisher, S: Subscriber> Bus<P, S> {
    pub fn new(publisher: P, subscriber: S) -> Self {
        Self {
            publisher,
            subscriber,
        }
    }

    pub fn publish(&self, event: Event) -> Result<(), PublishError> {
        self.publisher.publish(event)
    }

    pub fn poll(&self, timeout_ms: u64) -> Result<Option<Event>, PublishError> {
        self.subscriber.poll(timeout_ms)
    }

    pub fn ack(&self, event_id: &str) -> Result<(), PublishError> {
        self.subscriber.ack(event_id)
    }

    pub fn nack(&self, event_id: &str, reason: &str) -> Result<(), PublishError> {
        self.subscriber.nack(event_id, reason)
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn subscriber(&self) -> &S {
        &self.subscriber
    }
}

impl<T: Publisher + Subscriber + Clone> Bus<T, T> {
    /// Build a bus from a transport that handles both directions, like
    /// `InMemoryQueue` or a broker client.
    pub fn from_queue(queue: T) -> Self {
        Self {
            publisher: queue.clone(),
            subscriber: queue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryQueue;

    #[test]
    fn bus_round_trip() {
        let bus = Bus::from_queue(InMemoryQueue::new());
        bus.publish(Event::new("e-1", "RideStarted", "ride", vec![]))
            .unwrap();

        let event = bus.poll(50).unwrap().unwrap();
        assert_eq!(event.id, "e-1");
        bus.ack(&event.id).unwrap();
    }
}
