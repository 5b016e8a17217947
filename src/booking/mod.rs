//! Booking aggregate, its command handlers, and the booking-creation
//! saga.

mod booking;
mod coordinator;
mod error;
mod events;
mod service;

pub use booking::{Booking, BookingStatus};
pub use coordinator::{
    CompensationPolicy, CoordinatorError, ReconciliationCase, ReservationCoordinator,
};
pub use error::BookingError;
pub use events::{
    BookingCancelled, BookingCompleted, BookingConfirmed, BookingCreated, BookingEvent,
    BookingRejected,
};
pub use service::BookingService;
