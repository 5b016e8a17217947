//! Cross-service call seams.
//!
//! The booking side never touches ride storage directly; it goes through
//! `RideClient`, which a transport adapter implements. Deadlines are
//! mandatory and finite: a remote call may block its caller, but never
//! forever. Transport failures are transient by definition and are never
//! silently retried here; retry policy belongs to the caller
//! (compensation uses bounded backoff, everything else fails fast).

mod client;
mod in_process;

pub use client::{RideClient, RpcError};
pub use in_process::InProcessRideClient;
