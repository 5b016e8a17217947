use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingCreated {
    pub booking_id: String,
    pub ride_id: String,
    pub passenger_id: String,
    pub driver_id: String,
    pub seats: u32,
    pub total_cents: u64,
    pub currency: String,
    pub auto_confirmed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingConfirmed {
    pub booking_id: String,
    pub ride_id: String,
    pub confirmed_at: SystemTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingRejected {
    pub booking_id: String,
    pub ride_id: String,
    pub seats_to_release: u32,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingCancelled {
    pub booking_id: String,
    pub ride_id: String,
    pub seats_to_release: u32,
    pub cancelled_by_passenger: bool,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingCompleted {
    pub booking_id: String,
    pub ride_id: String,
    pub completed_at: SystemTime,
}

/// Events raised by the Booking aggregate.
#[derive(Clone, Debug, PartialEq)]
pub enum BookingEvent {
    Created(BookingCreated),
    Confirmed(BookingConfirmed),
    Rejected(BookingRejected),
    Cancelled(BookingCancelled),
    Completed(BookingCompleted),
}

impl DomainEvent for BookingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BookingEvent::Created(_) => "BookingCreated",
            BookingEvent::Confirmed(_) => "BookingConfirmed",
            BookingEvent::Rejected(_) => "BookingRejected",
            BookingEvent::Cancelled(_) => "BookingCancelled",
            BookingEvent::Completed(_) => "BookingCompleted",
        }
    }

    fn encode(&self) -> Result<Vec<u8>, bitcode::Error> {
        match self {
            BookingEvent::Created(p) => bitcode::serialize(p),
            BookingEvent::Confirmed(p) => bitcode::serialize(p),
            BookingEvent::Rejected(p) => bitcode::serialize(p),
            BookingEvent::Cancelled(p) => bitcode::serialize(p),
            BookingEvent::Completed(p) => bitcode::serialize(p),
        }
    }
}
