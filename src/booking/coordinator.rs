//! Booking-creation saga.
//!
//! There is no shared transaction between the booking store and the ride
//! store, so creation is a two-step protocol: reserve remotely first,
//! persist locally second, release remotely on local failure. Release is
//! the compensator: it is capped at capacity and always safe to repeat,
//! which reserving twice is not.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::outbox::OutboxMessage;
use crate::ride::RideStatus;
use crate::rpc::{RideClient, RpcError};
use crate::store::{Store, StoreError};

use super::{Booking, BookingError};

/// Bounds on the compensating release retries.
#[derive(Clone, Debug)]
pub struct CompensationPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for CompensationPolicy {
    fn default() -> Self {
        CompensationPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    }
}

/// A seat release that could not be confirmed within its retry budget.
///
/// The seats stay reserved on the ride until an operator (or a
/// reconciliation job) releases them: an accepted, monitored gap, not a
/// correctness bug.
#[derive(Clone, Debug)]
pub struct ReconciliationCase {
    pub ride_id: String,
    pub seats: u32,
    pub context: String,
    pub attempts: u32,
    pub occurred_at: SystemTime,
}

/// Failures of the booking-creation saga.
#[derive(Debug)]
pub enum CoordinatorError {
    RideNotFound(String),
    RideNotOpen { status: RideStatus },
    DriverCannotBook,
    NoSeatsAvailable { requested: u32 },
    Booking(BookingError),
    Store(StoreError),
    RideService(RpcError),
    Encoding(String),
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorError::RideNotFound(id) => write!(f, "ride not found: {}", id),
            CoordinatorError::RideNotOpen { status } => {
                write!(f, "ride is not open for booking (status {:?})", status)
            }
            CoordinatorError::DriverCannotBook => {
                write!(f, "the driver cannot book their own ride")
            }
            CoordinatorError::NoSeatsAvailable { requested } => {
                write!(f, "no capacity for {} seat(s)", requested)
            }
            CoordinatorError::Booking(e) => write!(f, "booking rejected: {}", e),
            CoordinatorError::Store(e) => write!(f, "booking store failure: {}", e),
            CoordinatorError::RideService(e) => write!(f, "ride service call failed: {}", e),
            CoordinatorError::Encoding(msg) => write!(f, "event encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for CoordinatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoordinatorError::Booking(e) => Some(e),
            CoordinatorError::Store(e) => Some(e),
            CoordinatorError::RideService(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BookingError> for CoordinatorError {
    fn from(err: BookingError) -> Self {
        CoordinatorError::Booking(err)
    }
}

impl From<StoreError> for CoordinatorError {
    fn from(err: StoreError) -> Self {
        CoordinatorError::Store(err)
    }
}

impl From<RpcError> for CoordinatorError {
    fn from(err: RpcError) -> Self {
        CoordinatorError::RideService(err)
    }
}

/// Orchestrates booking creation across the two services.
pub struct ReservationCoordinator<C, S> {
    rides: C,
    bookings: S,
    policy: CompensationPolicy,
    reconciliations: Arc<Mutex<Vec<ReconciliationCase>>>,
}

impl<C, S> ReservationCoordinator<C, S>
where
    C: RideClient,
    S: Store<Booking>,
{
    pub fn new(rides: C, bookings: S) -> Self {
        Self {
            rides,
            bookings,
            policy: CompensationPolicy::default(),
            reconciliations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_compensation_policy(mut self, policy: CompensationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seat releases that exhausted their retry budget and await manual
    /// reconciliation.
    pub fn pending_reconciliations(&self) -> Vec<ReconciliationCase> {
        match self.reconciliations.lock() {
            Ok(cases) => cases.clone(),
            Err(_) => Vec::new(),
        }
    }

    /// Create a booking for `passenger_id` on `ride_id`.
    ///
    /// 1. Validate the ride snapshot. Fail fast before any remote
    ///    mutation.
    /// 2. Reserve seats remotely. A refusal or transport failure aborts
    ///    with nothing to undo.
    /// 3. Persist the booking with its outbox rows in one local
    ///    transaction.
    /// 4. If persistence fails, release the reserved seats (bounded
    ///    retries), then report the original failure.
    pub fn create_booking(
        &self,
        passenger_id: &str,
        ride_id: &str,
        seats: u32,
    ) -> Result<Booking, CoordinatorError> {
        let snapshot = self
            .rides
            .get_ride_info(ride_id)?
            .ok_or_else(|| CoordinatorError::RideNotFound(ride_id.to_string()))?;

        if snapshot.status != RideStatus::Scheduled {
            return Err(CoordinatorError::RideNotOpen {
                status: snapshot.status,
            });
        }
        if snapshot.driver_id == passenger_id {
            return Err(CoordinatorError::DriverCannotBook);
        }

        if !self.rides.reserve_seats(ride_id, seats)? {
            return Err(CoordinatorError::NoSeatsAvailable { requested: seats });
        }

        // The reservation is live from here: every failure path below
        // must release it before returning.
        let result = self.persist_booking(&snapshot, passenger_id, seats);
        match result {
            Ok(booking) => Ok(booking),
            Err(err) => {
                tracing::warn!(
                    ride_id,
                    seats,
                    error = %err,
                    "booking persistence failed after reservation, compensating"
                );
                self.release_seats(ride_id, seats, "booking persistence failed");
                Err(err)
            }
        }
    }

    fn persist_booking(
        &self,
        snapshot: &crate::ride::RideSnapshot,
        passenger_id: &str,
        seats: u32,
    ) -> Result<Booking, CoordinatorError> {
        let now = SystemTime::now();
        let id = format!("booking-{}", Uuid::new_v4());
        let (mut booking, events) = Booking::create(id, snapshot, passenger_id, seats, now)?;
        let rows = OutboxMessage::from_events(booking.id(), booking.version(), &events, now)
            .map_err(|e| CoordinatorError::Encoding(e.to_string()))?;
        self.bookings.commit_with_events(&mut booking, rows)?;
        Ok(booking)
    }

    /// Release seats on the ride with bounded exponential backoff.
    ///
    /// Returns whether the release was confirmed. On exhaustion the case
    /// is recorded for reconciliation and the caller proceeds; the
    /// compensator must never block its caller indefinitely.
    pub fn release_seats(&self, ride_id: &str, seats: u32, context: &str) -> bool {
        let mut delay = self.policy.base_delay;
        for attempt in 1..=self.policy.max_attempts {
            match self.rides.release_seats(ride_id, seats) {
                Ok(true) => return true,
                Ok(false) => {
                    tracing::warn!(ride_id, seats, attempt, "seat release not confirmed");
                }
                Err(err) => {
                    tracing::warn!(ride_id, seats, attempt, error = %err, "seat release failed");
                }
            }
            if attempt < self.policy.max_attempts {
                thread::sleep(delay);
                delay = (delay * 2).min(self.policy.max_delay);
            }
        }

        tracing::error!(
            ride_id,
            seats,
            context,
            attempts = self.policy.max_attempts,
            "seat release exhausted its retry budget, recorded for reconciliation"
        );
        if let Ok(mut cases) = self.reconciliations.lock() {
            cases.push(ReconciliationCase {
                ride_id: ride_id.to_string(),
                seats,
                context: context.to_string(),
                attempts: self.policy.max_attempts,
                occurred_at: SystemTime::now(),
            });
        }
        false
    }
}
