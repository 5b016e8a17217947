//! Outbox-to-broker delivery: one worker thread per service, a shared
//! in-memory broker, and downstream consumers reading off the bus.

mod support;

use std::sync::Arc;
use std::time::Duration;

use ridepool::booking::BookingCreated;
use ridepool::{
    BookingService, Bus, InMemoryQueue, InProcessRideClient, MemoryStore, OutboxStore,
    OutboxWorker, OutboxWorkerThread,
};

use support::{init_tracing, ride_service_with, wait_for};

#[test]
fn events_flow_from_both_services_to_the_broker() {
    init_tracing();
    let rides = ride_service_with("ride-1", 4, false);
    let bookings = Arc::new(BookingService::new(
        MemoryStore::new(),
        InProcessRideClient::new(rides.clone()),
    ));

    let broker = InMemoryQueue::new();
    let ride_worker = OutboxWorkerThread::spawn(
        rides.store().clone(),
        OutboxWorker::new(broker.clone(), "ride").with_worker_id("ride-w1"),
        Duration::from_millis(10),
    );
    let booking_worker = OutboxWorkerThread::spawn(
        bookings.store().clone(),
        OutboxWorker::new(broker.clone(), "booking").with_worker_id("booking-w1"),
        Duration::from_millis(10),
    );

    let booking = bookings.create_booking("passenger-1", "ride-1", 2).unwrap();
    bookings.confirm_booking("driver-1", booking.id()).unwrap();

    // RideCreated + SeatsReserved on the ride topic, BookingCreated +
    // BookingConfirmed on the booking topic.
    assert!(wait_for(Duration::from_secs(5), || broker.len() >= 4));

    let ride_stats = ride_worker.stop();
    let booking_stats = booking_worker.stop();
    assert_eq!(ride_stats.published, 2);
    assert_eq!(booking_stats.published, 2);
    assert_eq!(ride_stats.failed + booking_stats.failed, 0);

    let keys = broker.routing_keys();
    assert!(keys.contains(&"ride.RideCreated".to_string()));
    assert!(keys.contains(&"ride.SeatsReserved".to_string()));
    assert!(keys.contains(&"booking.BookingCreated".to_string()));
    assert!(keys.contains(&"booking.BookingConfirmed".to_string()));

    // Booking-side delivery follows creation order.
    let booking_keys: Vec<String> = keys
        .iter()
        .filter(|k| k.starts_with("booking."))
        .cloned()
        .collect();
    assert_eq!(booking_keys, ["booking.BookingCreated", "booking.BookingConfirmed"]);
}

#[test]
fn published_rows_are_never_redelivered() {
    let rides = ride_service_with("ride-1", 4, false);
    let broker = InMemoryQueue::new();
    let worker = OutboxWorker::new(broker.clone(), "ride").with_worker_id("w-1");

    let first = worker.run_cycle(rides.store()).unwrap();
    assert_eq!(first.published, 1); // RideCreated

    // Processed rows stay in the store for audit but are never claimed
    // or delivered again.
    for _ in 0..3 {
        let cycle = worker.run_cycle(rides.store()).unwrap();
        assert_eq!(cycle.claimed, 0);
    }
    assert_eq!(broker.len(), 1);
    assert_eq!(rides.store().outbox_messages().unwrap().len(), 1);
    assert!(rides.store().outbox_messages().unwrap()[0].is_published());
}

#[test]
fn broker_outage_leaves_rows_completely_untouched() {
    init_tracing();
    let rides = ride_service_with("ride-1", 4, false);
    rides.reserve_seats("ride-1", 1).unwrap();

    let broker = InMemoryQueue::new();
    broker.set_connected(false);

    let worker_thread = OutboxWorkerThread::spawn(
        rides.store().clone(),
        OutboxWorker::new(broker.clone(), "ride"),
        Duration::from_millis(5),
    );

    // Let several cycles elapse against the dead broker.
    std::thread::sleep(Duration::from_millis(60));

    let pending = rides.store().pending_messages().unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|m| m.attempts == 0));
    assert!(pending.iter().all(|m| m.processed_at.is_none()));
    assert!(pending.iter().all(|m| m.worker_id.is_none()));
    assert!(broker.is_empty());

    // Connection restored: the backlog drains in order.
    broker.set_connected(true);
    assert!(wait_for(Duration::from_secs(5), || broker.len() == 2));

    let stats = worker_thread.stop();
    assert!(stats.skipped_cycles > 0);
    assert_eq!(stats.published, 2);
    assert_eq!(
        broker.routing_keys(),
        ["ride.RideCreated", "ride.SeatsReserved"]
    );
}

#[test]
fn downstream_consumer_decodes_booking_events_idempotently() {
    let rides = ride_service_with("ride-1", 4, true);
    let bookings = BookingService::new(
        MemoryStore::new(),
        InProcessRideClient::new(rides.clone()),
    );

    let broker = InMemoryQueue::new();
    let worker = OutboxWorker::new(broker.clone(), "booking");

    let booking = bookings.create_booking("passenger-1", "ride-1", 2).unwrap();
    worker.run_cycle(bookings.store()).unwrap();

    // A notification consumer reads from its own subscription.
    let notifications = Bus::from_queue(broker.new_subscriber());
    let mut seen = Vec::new();
    while let Some(event) = notifications.poll(20).unwrap() {
        if event.event_type == "BookingCreated" {
            let payload: BookingCreated = event.decode().unwrap();
            assert_eq!(payload.booking_id, booking.id());
            assert_eq!(payload.seats, 2);
            assert!(payload.auto_confirmed);
        }
        // The stable message id is what a consumer would dedup on.
        assert!(event.id.starts_with(booking.id()));
        seen.push(event.id.clone());
        notifications.ack(&event.id).unwrap();
    }

    assert_eq!(seen.len(), 2); // BookingCreated + BookingConfirmed
    seen.dedup();
    assert_eq!(seen.len(), 2);
}
