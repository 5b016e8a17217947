use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::domain::Money;
use crate::ride::RideSnapshot;
use crate::store::Aggregate;

use super::events::{
    BookingCancelled, BookingCompleted, BookingConfirmed, BookingCreated, BookingEvent,
    BookingRejected,
};
use super::BookingError;

/// Booking lifecycle. The transition graph is a DAG:
/// Pending → {Confirmed, Rejected, Cancelled};
/// Confirmed → {Completed, Cancelled};
/// Completed, Rejected and Cancelled are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Rejected,
}

/// The Booking aggregate: owns the reservation lifecycle.
///
/// `seats` is fixed at creation and never mutated; the driver identity is
/// denormalized from the ride snapshot so authorization checks never need
/// a cross-service read.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Booking {
    id: String,
    ride_id: String,
    passenger_id: String,
    driver_id: String,
    seats: u32,
    total_price: Money,
    status: BookingStatus,
    booked_at: SystemTime,
    confirmed_at: Option<SystemTime>,
    cancelled_at: Option<SystemTime>,
    completed_at: Option<SystemTime>,
    cancellation_reason: Option<String>,
    version: u64,
    #[serde(skip, default)]
    committed_version: u64,
}

impl Booking {
    /// Create a booking against a ride snapshot.
    ///
    /// Starts `Pending`, or `Confirmed` immediately when the ride is set
    /// to auto-confirm, in which case both `BookingCreated` and
    /// `BookingConfirmed` are raised.
    pub fn create(
        id: impl Into<String>,
        ride: &RideSnapshot,
        passenger_id: impl Into<String>,
        seats: u32,
        now: SystemTime,
    ) -> Result<(Booking, Vec<BookingEvent>), BookingError> {
        if seats == 0 {
            return Err(BookingError::InvalidSeatCount(seats));
        }

        let id = id.into();
        let passenger_id = passenger_id.into();
        let total_price = ride.price_per_seat.times(seats)?;

        let status = if ride.auto_confirm {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        };

        let booking = Booking {
            id: id.clone(),
            ride_id: ride.id.clone(),
            passenger_id: passenger_id.clone(),
            driver_id: ride.driver_id.clone(),
            seats,
            total_price: total_price.clone(),
            status,
            booked_at: now,
            confirmed_at: ride.auto_confirm.then_some(now),
            cancelled_at: None,
            completed_at: None,
            cancellation_reason: None,
            version: 1,
            committed_version: 0,
        };

        let mut events = vec![BookingEvent::Created(BookingCreated {
            booking_id: id.clone(),
            ride_id: ride.id.clone(),
            passenger_id,
            driver_id: ride.driver_id.clone(),
            seats,
            total_cents: total_price.cents(),
            currency: total_price.currency().code().to_string(),
            auto_confirmed: ride.auto_confirm,
        })];
        if ride.auto_confirm {
            events.push(BookingEvent::Confirmed(BookingConfirmed {
                booking_id: id,
                ride_id: ride.id.clone(),
                confirmed_at: now,
            }));
        }

        Ok((booking, events))
    }

    /// Driver accepts the booking. Requires `Pending`.
    pub fn confirm(&mut self, now: SystemTime) -> Result<Vec<BookingEvent>, BookingError> {
        if self.status != BookingStatus::Pending {
            return Err(BookingError::NotAwaitingConfirmation {
                status: self.status,
            });
        }

        self.status = BookingStatus::Confirmed;
        self.confirmed_at = Some(now);
        self.version += 1;
        Ok(vec![BookingEvent::Confirmed(BookingConfirmed {
            booking_id: self.id.clone(),
            ride_id: self.ride_id.clone(),
            confirmed_at: now,
        })])
    }

    /// Driver declines the booking. Requires `Pending`. The event carries
    /// the seat count the ride must get back.
    pub fn reject(&mut self, reason: impl Into<String>) -> Result<Vec<BookingEvent>, BookingError> {
        if self.status != BookingStatus::Pending {
            return Err(BookingError::NotAwaitingConfirmation {
                status: self.status,
            });
        }

        self.status = BookingStatus::Rejected;
        self.version += 1;
        Ok(vec![BookingEvent::Rejected(BookingRejected {
            booking_id: self.id.clone(),
            ride_id: self.ride_id.clone(),
            seats_to_release: self.seats,
            reason: reason.into(),
        })])
    }

    /// Withdraw the booking, by the passenger or the driver. Requires
    /// `Pending` or `Confirmed`.
    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        by_passenger: bool,
        now: SystemTime,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        if !matches!(
            self.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) {
            return Err(BookingError::NotCancellable {
                status: self.status,
            });
        }

        let reason = reason.into();
        self.status = BookingStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.cancellation_reason = Some(reason.clone());
        self.version += 1;
        Ok(vec![BookingEvent::Cancelled(BookingCancelled {
            booking_id: self.id.clone(),
            ride_id: self.ride_id.clone(),
            seats_to_release: self.seats,
            cancelled_by_passenger: by_passenger,
            reason,
        })])
    }

    /// Mark the booking fulfilled. Requires `Confirmed`.
    pub fn complete(&mut self, now: SystemTime) -> Result<Vec<BookingEvent>, BookingError> {
        if self.status != BookingStatus::Confirmed {
            return Err(BookingError::NotConfirmed {
                status: self.status,
            });
        }

        self.status = BookingStatus::Completed;
        self.completed_at = Some(now);
        self.version += 1;
        Ok(vec![BookingEvent::Completed(BookingCompleted {
            booking_id: self.id.clone(),
            ride_id: self.ride_id.clone(),
            completed_at: now,
        })])
    }

    // Getters

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn ride_id(&self) -> &str {
        &self.ride_id
    }

    pub fn passenger_id(&self) -> &str {
        &self.passenger_id
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }

    pub fn seats(&self) -> u32 {
        self.seats
    }

    pub fn total_price(&self) -> &Money {
        &self.total_price
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }
}

impl Aggregate for Booking {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn committed_version(&self) -> u64 {
        self.committed_version
    }

    fn mark_committed(&mut self) {
        self.committed_version = self.version;
    }
}
