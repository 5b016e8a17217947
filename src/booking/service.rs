use std::sync::Arc;
use std::time::SystemTime;

use crate::outbox::OutboxMessage;
use crate::rpc::RideClient;
use crate::service::HandlerError;
use crate::store::{MemoryStore, Store};
use crate::users::UserDirectory;

use super::coordinator::{CompensationPolicy, ReconciliationCase, ReservationCoordinator};
use super::{Booking, BookingEvent};

const MAX_CONFLICT_RETRIES: u32 = 5;

/// Command handlers of the Booking service.
///
/// Creation goes through the reservation saga; the rest are local state
/// transitions committed with their outbox rows. Reject and cancel hand
/// the booked seats back to the ride through the same bounded-retry
/// release path the saga's compensation uses.
pub struct BookingService<C: RideClient + Clone> {
    store: MemoryStore<Booking>,
    coordinator: ReservationCoordinator<C, MemoryStore<Booking>>,
    users: Option<Arc<dyn UserDirectory>>,
}

impl<C: RideClient + Clone> BookingService<C> {
    pub fn new(store: MemoryStore<Booking>, rides: C) -> Self {
        let coordinator = ReservationCoordinator::new(rides, store.clone());
        Self {
            store,
            coordinator,
            users: None,
        }
    }

    pub fn with_compensation_policy(mut self, policy: CompensationPolicy) -> Self {
        self.coordinator = self.coordinator.with_compensation_policy(policy);
        self
    }

    /// Validate passengers against the user service before booking.
    pub fn with_user_directory(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn store(&self) -> &MemoryStore<Booking> {
        &self.store
    }

    pub fn pending_reconciliations(&self) -> Vec<ReconciliationCase> {
        self.coordinator.pending_reconciliations()
    }

    pub fn get(&self, booking_id: &str) -> Result<Booking, HandlerError> {
        self.store
            .get(booking_id)?
            .ok_or_else(|| HandlerError::NotFound(booking_id.to_string()))
    }

    /// Book seats on a ride for the acting passenger.
    pub fn create_booking(
        &self,
        actor: &str,
        ride_id: &str,
        seats: u32,
    ) -> Result<Booking, HandlerError> {
        if let Some(users) = &self.users {
            let validation = users.validate_user(actor)?;
            if !validation.exists {
                return Err(HandlerError::NotFound(format!("user {}", actor)));
            }
            if !validation.is_valid {
                return Err(HandlerError::Rejected(
                    "passenger account is not in good standing".into(),
                ));
            }
        }

        Ok(self.coordinator.create_booking(actor, ride_id, seats)?)
    }

    /// Driver accepts a pending booking.
    pub fn confirm_booking(&self, actor: &str, booking_id: &str) -> Result<Booking, HandlerError> {
        self.apply(booking_id, |booking| {
            require_driver(booking, actor)?;
            Ok(booking.confirm(SystemTime::now())?)
        })
    }

    /// Driver declines a pending booking; the seats go back to the ride.
    pub fn reject_booking(
        &self,
        actor: &str,
        booking_id: &str,
        reason: &str,
    ) -> Result<Booking, HandlerError> {
        let booking = self.apply(booking_id, |booking| {
            require_driver(booking, actor)?;
            Ok(booking.reject(reason)?)
        })?;
        self.coordinator
            .release_seats(booking.ride_id(), booking.seats(), "booking rejected");
        Ok(booking)
    }

    /// Passenger or driver withdraws a booking; the seats go back to the
    /// ride.
    pub fn cancel_booking(
        &self,
        actor: &str,
        booking_id: &str,
        reason: &str,
    ) -> Result<Booking, HandlerError> {
        let booking = self.apply(booking_id, |booking| {
            let by_passenger = actor == booking.passenger_id();
            if !by_passenger && actor != booking.driver_id() {
                return Err(HandlerError::Unauthorized(
                    "only the passenger or the driver can cancel a booking".into(),
                ));
            }
            Ok(booking.cancel(reason, by_passenger, SystemTime::now())?)
        })?;
        self.coordinator
            .release_seats(booking.ride_id(), booking.seats(), "booking cancelled");
        Ok(booking)
    }

    /// Driver marks a confirmed booking fulfilled.
    pub fn complete_booking(&self, actor: &str, booking_id: &str) -> Result<Booking, HandlerError> {
        self.apply(booking_id, |booking| {
            require_driver(booking, actor)?;
            Ok(booking.complete(SystemTime::now())?)
        })
    }

    fn apply(
        &self,
        booking_id: &str,
        mutate: impl Fn(&mut Booking) -> Result<Vec<BookingEvent>, HandlerError>,
    ) -> Result<Booking, HandlerError> {
        let mut last_conflict = None;
        for _ in 0..MAX_CONFLICT_RETRIES {
            let mut booking = self.get(booking_id)?;
            let events = mutate(&mut booking)?;
            let now = SystemTime::now();
            let rows = OutboxMessage::from_events(booking.id(), booking.version(), &events, now)?;
            match self.store.commit_with_events(&mut booking, rows) {
                Ok(()) => return Ok(booking),
                Err(err) if err.is_retryable() => {
                    last_conflict = Some(err);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(last_conflict
            .map(HandlerError::from)
            .unwrap_or_else(|| HandlerError::Internal("conflict retry loop exhausted".into())))
    }
}

fn require_driver(booking: &Booking, actor: &str) -> Result<(), HandlerError> {
    if booking.driver_id() != actor {
        return Err(HandlerError::Unauthorized(
            "only the ride's driver can respond to this booking".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::booking::BookingStatus;
    use crate::domain::{Currency, Location, Money};
    use crate::ride::{NewRide, RideService};
    use crate::rpc::InProcessRideClient;

    fn setup(seats: u32, auto_confirm: bool) -> (RideService, BookingService<InProcessRideClient>) {
        let rides = RideService::new(MemoryStore::new());
        rides
            .create_ride(
                "driver-1",
                NewRide {
                    id: "ride-1".into(),
                    driver_id: "driver-1".into(),
                    origin: Location::new("Lyon", 45.76, 4.83).unwrap(),
                    destination: Location::new("Paris", 48.85, 2.35).unwrap(),
                    departure: SystemTime::now() + Duration::from_secs(3600),
                    total_seats: seats,
                    price_per_seat: Money::new(2000, Currency::new("EUR").unwrap()),
                    auto_confirm,
                },
            )
            .unwrap();
        let bookings = BookingService::new(
            MemoryStore::new(),
            InProcessRideClient::new(rides.clone()),
        );
        (rides, bookings)
    }

    #[test]
    fn booking_reserves_seats_and_writes_outbox() {
        let (rides, bookings) = setup(4, false);

        let booking = bookings.create_booking("passenger-1", "ride-1", 2).unwrap();
        assert_eq!(booking.status(), BookingStatus::Pending);
        assert_eq!(rides.get("ride-1").unwrap().available_seats(), 2);

        let types: Vec<String> = bookings
            .store()
            .outbox_messages()
            .unwrap()
            .iter()
            .map(|m| m.event_type.clone())
            .collect();
        assert_eq!(types, ["BookingCreated"]);
    }

    #[test]
    fn auto_confirm_writes_both_rows() {
        let (_, bookings) = setup(4, true);
        let booking = bookings.create_booking("passenger-1", "ride-1", 1).unwrap();
        assert_eq!(booking.status(), BookingStatus::Confirmed);

        let types: Vec<String> = bookings
            .store()
            .outbox_messages()
            .unwrap()
            .iter()
            .map(|m| m.event_type.clone())
            .collect();
        assert_eq!(types, ["BookingCreated", "BookingConfirmed"]);
    }

    #[test]
    fn driver_cannot_book_own_ride() {
        let (rides, bookings) = setup(4, false);
        let err = bookings.create_booking("driver-1", "ride-1", 1).unwrap_err();
        assert!(matches!(err, HandlerError::Rejected(_)));
        assert_eq!(rides.get("ride-1").unwrap().available_seats(), 4);
    }

    #[test]
    fn capacity_refusal_leaves_no_booking() {
        let (rides, bookings) = setup(2, false);
        bookings.create_booking("passenger-1", "ride-1", 2).unwrap();

        let err = bookings
            .create_booking("passenger-2", "ride-1", 1)
            .unwrap_err();
        assert!(matches!(err, HandlerError::Capacity(_)));
        assert_eq!(rides.get("ride-1").unwrap().available_seats(), 0);
        // Only the first booking's row exists.
        assert_eq!(bookings.store().outbox_messages().unwrap().len(), 1);
    }

    #[test]
    fn confirm_is_driver_only() {
        let (_, bookings) = setup(4, false);
        let booking = bookings.create_booking("passenger-1", "ride-1", 1).unwrap();

        let err = bookings
            .confirm_booking("passenger-1", booking.id())
            .unwrap_err();
        assert!(matches!(err, HandlerError::Unauthorized(_)));

        let confirmed = bookings.confirm_booking("driver-1", booking.id()).unwrap();
        assert_eq!(confirmed.status(), BookingStatus::Confirmed);
    }

    #[test]
    fn confirm_after_cancel_is_rejected() {
        let (_, bookings) = setup(4, false);
        let booking = bookings.create_booking("passenger-1", "ride-1", 1).unwrap();
        bookings
            .cancel_booking("passenger-1", booking.id(), "change of plans")
            .unwrap();

        let err = bookings
            .confirm_booking("driver-1", booking.id())
            .unwrap_err();
        assert!(matches!(err, HandlerError::Rejected(_)));
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn reject_returns_seats_to_the_ride() {
        let (rides, bookings) = setup(4, false);
        let booking = bookings.create_booking("passenger-1", "ride-1", 3).unwrap();
        assert_eq!(rides.get("ride-1").unwrap().available_seats(), 1);

        bookings
            .reject_booking("driver-1", booking.id(), "no room for luggage")
            .unwrap();
        assert_eq!(rides.get("ride-1").unwrap().available_seats(), 4);
        assert_eq!(
            bookings.get(booking.id()).unwrap().status(),
            BookingStatus::Rejected
        );
    }

    #[test]
    fn cancel_by_passenger_returns_seats() {
        let (rides, bookings) = setup(4, false);
        let booking = bookings.create_booking("passenger-1", "ride-1", 2).unwrap();
        bookings.confirm_booking("driver-1", booking.id()).unwrap();

        bookings
            .cancel_booking("passenger-1", booking.id(), "found a train")
            .unwrap();
        assert_eq!(rides.get("ride-1").unwrap().available_seats(), 4);

        let cancelled = bookings.get(booking.id()).unwrap();
        assert_eq!(cancelled.status(), BookingStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason(), Some("found a train"));
    }

    #[test]
    fn stranger_cannot_cancel() {
        let (_, bookings) = setup(4, false);
        let booking = bookings.create_booking("passenger-1", "ride-1", 1).unwrap();

        let err = bookings
            .cancel_booking("rando-7", booking.id(), "mine now")
            .unwrap_err();
        assert!(matches!(err, HandlerError::Unauthorized(_)));
    }

    #[test]
    fn complete_requires_confirmed_and_driver() {
        let (_, bookings) = setup(4, false);
        let booking = bookings.create_booking("passenger-1", "ride-1", 1).unwrap();

        assert!(bookings
            .complete_booking("driver-1", booking.id())
            .is_err());

        bookings.confirm_booking("driver-1", booking.id()).unwrap();
        let done = bookings.complete_booking("driver-1", booking.id()).unwrap();
        assert_eq!(done.status(), BookingStatus::Completed);
    }

    #[test]
    fn unknown_booking_is_not_found() {
        let (_, bookings) = setup(4, false);
        assert!(matches!(
            bookings.confirm_booking("driver-1", "booking-nope"),
            Err(HandlerError::NotFound(_))
        ));
    }
}
