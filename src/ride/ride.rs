use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::domain::{Location, Money};
use crate::store::Aggregate;

use super::events::{
    RideCancelled, RideCompleted, RideCreated, RideEvent, RideStarted, SeatsReleased,
    SeatsReserved,
};
use super::RideError;

/// Ride lifecycle. Transitions are one-directional; none are reversible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RideStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

/// Inputs for creating a ride. Locations and price arrive already
/// validated as value types.
#[derive(Clone, Debug)]
pub struct NewRide {
    pub id: String,
    pub driver_id: String,
    pub origin: Location,
    pub destination: Location,
    pub departure: SystemTime,
    pub total_seats: u32,
    pub price_per_seat: Money,
    pub auto_confirm: bool,
}

/// Immutable view of a ride handed across the service boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RideSnapshot {
    pub id: String,
    pub driver_id: String,
    pub status: RideStatus,
    pub departure: SystemTime,
    pub total_seats: u32,
    pub available_seats: u32,
    pub price_per_seat: Money,
    pub auto_confirm: bool,
}

/// The Ride aggregate: owns seat inventory and the ride lifecycle.
///
/// Every operation is a synchronous state transition: it either succeeds,
/// returning the domain events it raised, or fails with a [`RideError`]
/// leaving the state untouched. Each successful mutation bumps `version`,
/// which the store uses for optimistic concurrency detection.
///
/// Invariant: `0 <= available_seats <= total_seats`, always.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ride {
    id: String,
    driver_id: String,
    origin: Location,
    destination: Location,
    departure: SystemTime,
    total_seats: u32,
    available_seats: u32,
    price_per_seat: Money,
    status: RideStatus,
    auto_confirm: bool,
    created_at: SystemTime,
    started_at: Option<SystemTime>,
    completed_at: Option<SystemTime>,
    cancelled_at: Option<SystemTime>,
    cancellation_reason: Option<String>,
    version: u64,
    #[serde(skip, default)]
    committed_version: u64,
}

impl Ride {
    pub fn create(new: NewRide, now: SystemTime) -> Result<(Ride, Vec<RideEvent>), RideError> {
        if new.driver_id.trim().is_empty() {
            return Err(RideError::MissingDriver);
        }
        if new.total_seats == 0 {
            return Err(RideError::InvalidSeatCount(new.total_seats));
        }

        let ride = Ride {
            id: new.id.clone(),
            driver_id: new.driver_id.clone(),
            origin: new.origin,
            destination: new.destination,
            departure: new.departure,
            total_seats: new.total_seats,
            available_seats: new.total_seats,
            price_per_seat: new.price_per_seat,
            status: RideStatus::Scheduled,
            auto_confirm: new.auto_confirm,
            created_at: now,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            version: 1,
            committed_version: 0,
        };

        let event = RideEvent::Created(RideCreated {
            ride_id: new.id,
            driver_id: new.driver_id,
            departure: new.departure,
            total_seats: new.total_seats,
        });
        Ok((ride, vec![event]))
    }

    /// Take `seats` out of the available pool.
    ///
    /// Requires the ride to be `Scheduled` and the pool to hold enough
    /// seats; fails with a capacity error otherwise, leaving the pool
    /// unchanged.
    pub fn reserve_seats(&mut self, seats: u32) -> Result<Vec<RideEvent>, RideError> {
        if seats == 0 {
            return Err(RideError::InvalidSeatCount(seats));
        }
        if self.status != RideStatus::Scheduled {
            return Err(RideError::NotOpenForReservation {
                status: self.status,
            });
        }
        if seats > self.available_seats {
            return Err(RideError::InsufficientSeats {
                requested: seats,
                available: self.available_seats,
            });
        }

        self.available_seats -= seats;
        self.version += 1;
        Ok(vec![RideEvent::SeatsReserved(SeatsReserved {
            ride_id: self.id.clone(),
            seats,
            available_seats: self.available_seats,
        })])
    }

    /// Return `seats` to the available pool, capped at `total_seats`.
    ///
    /// Infallible: this is the compensating half of the reservation
    /// protocol and must always succeed, regardless of the ride's status.
    /// Releasing more than was reserved can never push the pool past
    /// capacity.
    pub fn release_seats(&mut self, seats: u32) -> Vec<RideEvent> {
        self.available_seats = self
            .available_seats
            .saturating_add(seats)
            .min(self.total_seats);
        self.version += 1;
        vec![RideEvent::SeatsReleased(SeatsReleased {
            ride_id: self.id.clone(),
            seats,
            available_seats: self.available_seats,
        })]
    }

    /// Depart. Requires `Scheduled` status and the departure time reached.
    pub fn start(&mut self, now: SystemTime) -> Result<Vec<RideEvent>, RideError> {
        if self.status != RideStatus::Scheduled {
            return Err(RideError::NotScheduled {
                status: self.status,
            });
        }
        if now < self.departure {
            return Err(RideError::DepartureNotReached);
        }

        self.status = RideStatus::InProgress;
        self.started_at = Some(now);
        self.version += 1;
        Ok(vec![RideEvent::Started(RideStarted {
            ride_id: self.id.clone(),
            started_at: now,
        })])
    }

    pub fn complete(&mut self, now: SystemTime) -> Result<Vec<RideEvent>, RideError> {
        if self.status != RideStatus::InProgress {
            return Err(RideError::NotInProgress {
                status: self.status,
            });
        }

        self.status = RideStatus::Completed;
        self.completed_at = Some(now);
        self.version += 1;
        Ok(vec![RideEvent::Completed(RideCompleted {
            ride_id: self.id.clone(),
            completed_at: now,
        })])
    }

    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        now: SystemTime,
    ) -> Result<Vec<RideEvent>, RideError> {
        if matches!(self.status, RideStatus::Completed | RideStatus::Cancelled) {
            return Err(RideError::AlreadyFinished {
                status: self.status,
            });
        }

        let reason = reason.into();
        self.status = RideStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.cancellation_reason = Some(reason.clone());
        self.version += 1;
        Ok(vec![RideEvent::Cancelled(RideCancelled {
            ride_id: self.id.clone(),
            reason,
            cancelled_at: now,
        })])
    }

    pub fn snapshot(&self) -> RideSnapshot {
        RideSnapshot {
            id: self.id.clone(),
            driver_id: self.driver_id.clone(),
            status: self.status,
            departure: self.departure,
            total_seats: self.total_seats,
            available_seats: self.available_seats,
            price_per_seat: self.price_per_seat.clone(),
            auto_confirm: self.auto_confirm,
        }
    }

    // Getters

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }

    pub fn origin(&self) -> &Location {
        &self.origin
    }

    pub fn destination(&self) -> &Location {
        &self.destination
    }

    pub fn departure(&self) -> SystemTime {
        self.departure
    }

    pub fn status(&self) -> RideStatus {
        self.status
    }

    pub fn total_seats(&self) -> u32 {
        self.total_seats
    }

    pub fn available_seats(&self) -> u32 {
        self.available_seats
    }

    pub fn price_per_seat(&self) -> &Money {
        &self.price_per_seat
    }

    pub fn auto_confirm(&self) -> bool {
        self.auto_confirm
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }
}

impl Aggregate for Ride {
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
