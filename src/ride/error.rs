use std::fmt;

use super::RideStatus;

/// Domain-rule violations raised by the Ride aggregate. Each operation
/// checks its preconditions up front and fails without mutating state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RideError {
    /// Seat count must be at least one.
    InvalidSeatCount(u32),
    /// Reservation attempted while the ride is not open for booking.
    NotOpenForReservation { status: RideStatus },
    /// Not enough seats left.
    InsufficientSeats { requested: u32, available: u32 },
    /// Start attempted on a ride that is not scheduled.
    NotScheduled { status: RideStatus },
    /// Start attempted before the departure time.
    DepartureNotReached,
    /// Complete attempted on a ride that is not in progress.
    NotInProgress { status: RideStatus },
    /// Cancel attempted on a ride that already finished.
    AlreadyFinished { status: RideStatus },
    /// Driver identity missing at creation.
    MissingDriver,
}

impl fmt::Display for RideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RideError::InvalidSeatCount(n) => write!(f, "invalid seat count: {}", n),
            RideError::NotOpenForReservation { status } => {
                write!(f, "ride is not open for reservation (status {:?})", status)
            }
            RideError::InsufficientSeats {
                requested,
                available,
            } => write!(
                f,
                "insufficient seats: requested {}, available {}",
                requested, available
            ),
            RideError::NotScheduled { status } => {
                write!(f, "ride cannot start (status {:?})", status)
            }
            RideError::DepartureNotReached => write!(f, "departure time not reached"),
            RideError::NotInProgress { status } => {
                write!(f, "ride cannot complete (status {:?})", status)
            }
            RideError::AlreadyFinished { status } => {
                write!(f, "ride already finished (status {:?})", status)
            }
            RideError::MissingDriver => write!(f, "driver identity is required"),
        }
    }
}

impl std::error::Error for RideError {}
