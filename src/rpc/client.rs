use std::fmt;

use crate::ride::RideSnapshot;

/// Transport failure on a cross-service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The deadline elapsed before a response arrived.
    Timeout,
    /// The remote service could not be reached.
    Unavailable(String),
    /// The remote service answered with a transport-level failure.
    Remote(String),
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::Timeout => write!(f, "remote call deadline exceeded"),
            RpcError::Unavailable(msg) => write!(f, "remote service unavailable: {}", msg),
            RpcError::Remote(msg) => write!(f, "remote call failed: {}", msg),
        }
    }
}

impl std::error::Error for RpcError {}

/// Seat reservation RPC exposed by the Ride service.
///
/// `reserve_seats` answers `false` when the ride cannot take the
/// reservation (capacity or state); `release_seats` answers whether the
/// release was confirmed. Both are idempotent targets for the caller's
/// retry logic.
pub trait RideClient: Send + Sync {
    fn get_ride_info(&self, ride_id: &str) -> Result<Option<RideSnapshot>, RpcError>;

    fn reserve_seats(&self, ride_id: &str, seats: u32) -> Result<bool, RpcError>;

    fn release_seats(&self, ride_id: &str, seats: u32) -> Result<bool, RpcError>;
}
