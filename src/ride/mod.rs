//! Ride aggregate - seat inventory and ride lifecycle.

mod error;
mod events;
mod ride;
mod service;

pub use error::RideError;
pub use events::{
    RideCancelled, RideCompleted, RideCreated, RideEvent, RideStarted, SeatsReleased,
    SeatsReserved,
};
pub use ride::{NewRide, Ride, RideSnapshot, RideStatus};
pub use service::RideService;
