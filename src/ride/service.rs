use std::time::SystemTime;

use crate::outbox::OutboxMessage;
use crate::service::HandlerError;
use crate::store::{MemoryStore, Store};

use super::{NewRide, Ride, RideEvent};

/// Commands retried from a fresh read after a version conflict.
const MAX_CONFLICT_RETRIES: u32 = 5;

/// Command handlers of the Ride service.
///
/// Every mutation loads the aggregate, applies the state transition, and
/// commits the new state together with the raised events' outbox rows in
/// one transaction. A stale-version save is retried from a fresh read,
/// so two racing reservations serialize instead of losing an update.
#[derive(Clone)]
pub struct RideService {
    store: MemoryStore<Ride>,
}

impl RideService {
    pub fn new(store: MemoryStore<Ride>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MemoryStore<Ride> {
        &self.store
    }

    pub fn get(&self, ride_id: &str) -> Result<Ride, HandlerError> {
        self.store
            .get(ride_id)?
            .ok_or_else(|| HandlerError::NotFound(ride_id.to_string()))
    }

    /// Publish a new ride. The actor must be the driver of the ride.
    pub fn create_ride(&self, actor: &str, new: NewRide) -> Result<Ride, HandlerError> {
        if actor != new.driver_id {
            return Err(HandlerError::Unauthorized(
                "only the driver can publish a ride".into(),
            ));
        }

        let now = SystemTime::now();
        let (mut ride, events) = Ride::create(new, now)?;
        let rows = OutboxMessage::from_events(ride.id(), ride.version(), &events, now)?;
        self.store.commit_with_events(&mut ride, rows)?;
        Ok(ride)
    }

    pub fn start_ride(&self, actor: &str, ride_id: &str) -> Result<Ride, HandlerError> {
        self.apply(ride_id, |ride| {
            require_driver(ride, actor)?;
            Ok(ride.start(SystemTime::now())?)
        })
    }

    pub fn complete_ride(&self, actor: &str, ride_id: &str) -> Result<Ride, HandlerError> {
        self.apply(ride_id, |ride| {
            require_driver(ride, actor)?;
            Ok(ride.complete(SystemTime::now())?)
        })
    }

    pub fn cancel_ride(
        &self,
        actor: &str,
        ride_id: &str,
        reason: &str,
    ) -> Result<Ride, HandlerError> {
        self.apply(ride_id, |ride| {
            require_driver(ride, actor)?;
            Ok(ride.cancel(reason, SystemTime::now())?)
        })
    }

    /// Reservation entry point for the booking side (RPC-facing, no
    /// actor: the calling service is trusted to have authorized already).
    pub fn reserve_seats(&self, ride_id: &str, seats: u32) -> Result<Ride, HandlerError> {
        self.apply(ride_id, |ride| Ok(ride.reserve_seats(seats)?))
    }

    /// Compensating release (RPC-facing). Never fails on the aggregate:
    /// the release is capped at capacity regardless of ride state.
    pub fn release_seats(&self, ride_id: &str, seats: u32) -> Result<Ride, HandlerError> {
        self.apply(ride_id, |ride| Ok(ride.release_seats(seats)))
    }

    /// Load-mutate-commit with bounded retry on version conflicts.
    fn apply(
        &self,
        ride_id: &str,
        mutate: impl Fn(&mut Ride) -> Result<Vec<RideEvent>, HandlerError>,
    ) -> Result<Ride, HandlerError> {
        let mut last_conflict = None;
        for _ in 0..MAX_CONFLICT_RETRIES {
            let mut ride = self.get(ride_id)?;
            let events = mutate(&mut ride)?;
            let now = SystemTime::now();
            let rows = OutboxMessage::from_events(ride.id(), ride.version(), &events, now)?;
            match self.store.commit_with_events(&mut ride, rows) {
                Ok(()) => return Ok(ride),
                Err(err) if err.is_retryable() => {
                    last_conflict = Some(err);
                }
                Err(err) => return Err(err.into()),
            }
        }
        // All retries raced and lost.
        Err(last_conflict
            .map(HandlerError::from)
            .unwrap_or_else(|| HandlerError::Internal("conflict retry loop exhausted".into())))
    }
}

fn require_driver(ride: &Ride, actor: &str) -> Result<(), HandlerError> {
    if ride.driver_id() != actor {
        return Err(HandlerError::Unauthorized(
            "only the driver can manage this ride".into(),
        ));
    }
    Ok(())
}
