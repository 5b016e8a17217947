//! Core of a multi-service ride booking workflow.
//!
//! Three independently deployed services cooperate without a distributed
//! transaction: the Ride service owns seat inventory, the Booking
//! service owns the reservation lifecycle, and downstream consumers
//! observe both through a message broker. Consistency comes from three
//! mechanisms working together:
//!
//! - aggregates whose invariants live entirely in their own methods,
//!   persisted with optimistic concurrency (`store`);
//! - a cross-service reservation protocol with a compensating release
//!   (`booking::ReservationCoordinator`);
//! - a transactional outbox with a background publisher (`outbox`), so
//!   every state change is eventually observed, effectively exactly
//!   once, across crashes and broker outages.

pub mod booking;
pub mod bus;
pub mod domain;
pub mod event;
pub mod outbox;
pub mod ride;
pub mod rpc;
pub mod service;
pub mod store;
pub mod users;

pub use booking::{
    Booking, BookingError, BookingEvent, BookingService, BookingStatus, CompensationPolicy,
    CoordinatorError, ReconciliationCase, ReservationCoordinator,
};
pub use bus::{Bus, Event, InMemoryQueue, PublishError, Publisher, Subscriber};
pub use domain::{Currency, DomainError, Location, Money};
pub use event::DomainEvent;
pub use outbox::{
    CycleResult, OutboxMessage, OutboxStatus, OutboxStore, OutboxWorker, OutboxWorkerThread,
    WorkerStats,
};
pub use ride::{NewRide, Ride, RideError, RideEvent, RideService, RideSnapshot, RideStatus};
pub use rpc::{InProcessRideClient, RideClient, RpcError};
pub use service::{command_surface, Dispatcher, HandlerError};
pub use store::{Aggregate, MemoryStore, Store, StoreError};
pub use users::{AuthRecord, InMemoryUserDirectory, UserDirectory, UserProfile, UserValidation};
