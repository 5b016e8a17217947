use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RideCreated {
    pub ride_id: String,
    pub driver_id: String,
    pub departure: SystemTime,
    pub total_seats: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeatsReserved {
    pub ride_id: String,
    pub seats: u32,
    pub available_seats: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeatsReleased {
    pub ride_id: String,
    pub seats: u32,
    pub available_seats: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RideStarted {
    pub ride_id: String,
    pub started_at: SystemTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RideCompleted {
    pub ride_id: String,
    pub completed_at: SystemTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RideCancelled {
    pub ride_id: String,
    pub reason: String,
    pub cancelled_at: SystemTime,
}

/// Events raised by the Ride aggregate.
#[derive(Clone, Debug, PartialEq)]
pub enum RideEvent {
    Created(RideCreated),
    SeatsReserved(SeatsReserved),
    SeatsReleased(SeatsReleased),
    Started(RideStarted),
    Completed(RideCompleted),
    Cancelled(RideCancelled),
}

impl DomainEvent for RideEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RideEvent::Created(_) => "RideCreated",
            RideEvent::SeatsReserved(_) => "SeatsReserved",
            RideEvent::SeatsReleased(_) => "SeatsReleased",
            RideEvent::Started(_) => "RideStarted",
            RideEvent::Completed(_) => "RideCompleted",
            RideEvent::Cancelled(_) => "RideCancelled",
        }
    }

    fn encode(&self) -> Result<Vec<u8>, bitcode::Error> {
        match self {
            RideEvent::Created(p) => bitcode::serialize(p),
            RideEvent::SeatsReserved(p) => bitcode::serialize(p),
            RideEvent::SeatsReleased(p) => bitcode::serialize(p),
            RideEvent::Started(p) => bitcode::serialize(p),
            RideEvent::Completed(p) => bitcode::serialize(p),
            RideEvent::Cancelled(p) => bitcode::serialize(p),
        }
    }
}
