//! Seat inventory consistency under concurrent booking traffic.

mod support;

use std::sync::Arc;
use std::thread;

use ridepool::{
    AuthRecord, BookingService, BookingStatus, HandlerError, InMemoryUserDirectory,
    InProcessRideClient, MemoryStore,
};

use support::ride_service_with;

#[test]
fn two_concurrent_bookings_fill_the_ride_and_a_third_is_refused() {
    let rides = ride_service_with("ride-1", 4, false);
    let bookings = Arc::new(BookingService::new(
        MemoryStore::new(),
        InProcessRideClient::new(rides.clone()),
    ));

    // Two passengers race for 2 seats each on a 4-seat ride.
    let mut handles = Vec::new();
    for passenger in ["passenger-1", "passenger-2"] {
        let bookings = Arc::clone(&bookings);
        handles.push(thread::spawn(move || {
            bookings.create_booking(passenger, "ride-1", 2)
        }));
    }

    for handle in handles {
        let booking = handle.join().unwrap().unwrap();
        assert_eq!(booking.status(), BookingStatus::Pending);
        assert_eq!(booking.seats(), 2);
    }
    assert_eq!(rides.get("ride-1").unwrap().available_seats(), 0);

    // The ride is full: one more seat is a capacity refusal, and the
    // refusal changes nothing.
    let err = bookings
        .create_booking("passenger-3", "ride-1", 1)
        .unwrap_err();
    assert!(matches!(err, HandlerError::Capacity(_)));
    assert_eq!(rides.get("ride-1").unwrap().available_seats(), 0);

    // Exactly the two successful bookings exist.
    let created = bookings
        .store()
        .outbox_messages()
        .unwrap()
        .iter()
        .filter(|m| m.event_type == "BookingCreated")
        .count();
    assert_eq!(created, 2);
}

#[test]
fn every_booking_mutation_produces_matching_outbox_rows() {
    let rides = ride_service_with("ride-1", 4, false);
    let bookings = BookingService::new(
        MemoryStore::new(),
        InProcessRideClient::new(rides.clone()),
    );

    let booking = bookings.create_booking("passenger-1", "ride-1", 2).unwrap();
    bookings.confirm_booking("driver-1", booking.id()).unwrap();
    bookings.complete_booking("driver-1", booking.id()).unwrap();

    let types: Vec<String> = bookings
        .store()
        .outbox_messages()
        .unwrap()
        .iter()
        .map(|m| m.event_type.clone())
        .collect();
    assert_eq!(
        types,
        ["BookingCreated", "BookingConfirmed", "BookingCompleted"]
    );

    // Ride side: the reservation left its own row.
    let ride_types: Vec<String> = rides
        .store()
        .outbox_messages()
        .unwrap()
        .iter()
        .map(|m| m.event_type.clone())
        .collect();
    assert_eq!(ride_types, ["RideCreated", "SeatsReserved"]);
}

#[test]
fn passenger_validation_gates_booking_creation() {
    let rides = ride_service_with("ride-1", 4, false);
    let directory = InMemoryUserDirectory::new();
    directory.insert(AuthRecord {
        subject: "passenger-ok".into(),
        email: "ok@example.com".into(),
        email_verified: true,
        display_name: None,
        disabled: false,
    });
    directory.insert(AuthRecord {
        subject: "passenger-locked".into(),
        email: "locked@example.com".into(),
        email_verified: true,
        display_name: None,
        disabled: true,
    });

    let bookings = BookingService::new(
        MemoryStore::new(),
        InProcessRideClient::new(rides.clone()),
    )
    .with_user_directory(Arc::new(directory));

    assert!(bookings
        .create_booking("passenger-ok", "ride-1", 1)
        .is_ok());

    let err = bookings
        .create_booking("passenger-locked", "ride-1", 1)
        .unwrap_err();
    assert!(matches!(err, HandlerError::Rejected(_)));

    let err = bookings
        .create_booking("passenger-ghost", "ride-1", 1)
        .unwrap_err();
    assert!(matches!(err, HandlerError::NotFound(_)));

    // Rejected passengers never touched the inventory.
    assert_eq!(rides.get("ride-1").unwrap().available_seats(), 3);
}
