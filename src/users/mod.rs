//! Identity validation seam.
//!
//! The authentication store's record never doubles as the domain's user
//! entity: an explicit mapping translates between the two, so the domain
//! never depends on the auth schema.

mod directory;
mod profile;

pub use directory::{InMemoryUserDirectory, UserDirectory, UserValidation};
pub use profile::{profile_from_auth, AuthRecord, UserProfile};
