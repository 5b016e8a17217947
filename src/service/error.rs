//! Boundary-facing error kind for command handlers.

use std::error::Error;
use std::fmt;

use crate::booking::{BookingError, CoordinatorError};
use crate::ride::RideError;
use crate::rpc::RpcError;
use crate::store::StoreError;

/// Tagged error kind returned by every command handler.
///
/// The thin API layer switches on the kind (via `status_code`) instead of
/// matching exception types; storage details never leak through.
#[derive(Debug)]
pub enum HandlerError {
    /// No handler registered for this command name.
    UnknownCommand(String),
    /// Input payload failed to decode.
    BadInput(String),
    /// Aggregate identity does not resolve.
    NotFound(String),
    /// Caller is not allowed to perform this operation.
    Unauthorized(String),
    /// Domain rule rejected the operation.
    Rejected(String),
    /// Not enough seats.
    Capacity(String),
    /// Stale version on save; retry from a fresh read.
    Conflict(String),
    /// A collaborating service could not be reached.
    Unavailable(String),
    /// Unexpected infrastructure failure.
    Internal(String),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::UnknownCommand(name) => write!(f, "unknown command: {}", name),
            HandlerError::BadInput(msg) => write!(f, "bad input: {}", msg),
            HandlerError::NotFound(id) => write!(f, "not found: {}", id),
            HandlerError::Unauthorized(msg) => write!(f, "unauthorized: {}", msg),
            HandlerError::Rejected(msg) => write!(f, "rejected: {}", msg),
            HandlerError::Capacity(msg) => write!(f, "capacity: {}", msg),
            HandlerError::Conflict(msg) => write!(f, "conflict: {}", msg),
            HandlerError::Unavailable(msg) => write!(f, "unavailable: {}", msg),
            HandlerError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl Error for HandlerError {}

impl HandlerError {
    /// Map this error to an HTTP-style status code for the API layer.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::UnknownCommand(_) => 404,
            HandlerError::BadInput(_) => 400,
            HandlerError::NotFound(_) => 404,
            HandlerError::Unauthorized(_) => 403,
            HandlerError::Rejected(_) => 422,
            HandlerError::Capacity(_) => 409,
            HandlerError::Conflict(_) => 409,
            HandlerError::Unavailable(_) => 503,
            HandlerError::Internal(_) => 500,
        }
    }

    /// Whether retrying the same command can succeed without operator
    /// involvement.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HandlerError::Conflict(_) | HandlerError::Unavailable(_)
        )
    }
}

impl From<RideError> for HandlerError {
    fn from(err: RideError) -> Self {
        match err {
            RideError::InsufficientSeats { .. } => HandlerError::Capacity(err.to_string()),
            _ => HandlerError::Rejected(err.to_string()),
        }
    }
}

impl From<BookingError> for HandlerError {
    fn from(err: BookingError) -> Self {
        HandlerError::Rejected(err.to_string())
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { .. } => HandlerError::Conflict(err.to_string()),
            _ => HandlerError::Internal(err.to_string()),
        }
    }
}

impl From<RpcError> for HandlerError {
    fn from(err: RpcError) -> Self {
        HandlerError::Unavailable(err.to_string())
    }
}

impl From<CoordinatorError> for HandlerError {
    fn from(err: CoordinatorError) -> Self {
        match err {
            CoordinatorError::RideNotFound(id) => HandlerError::NotFound(id),
            CoordinatorError::NoSeatsAvailable { .. } => HandlerError::Capacity(err.to_string()),
            CoordinatorError::RideService(e) => HandlerError::Unavailable(e.to_string()),
            CoordinatorError::Store(e) => HandlerError::from(e),
            CoordinatorError::Encoding(msg) => HandlerError::Internal(msg),
            _ => HandlerError::Rejected(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::BadInput(err.to_string())
    }
}

impl From<bitcode::Error> for HandlerError {
    fn from(err: bitcode::Error) -> Self {
        HandlerError::Internal(err.to_string())
    }
}
