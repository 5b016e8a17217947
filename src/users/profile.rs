use serde::{Deserialize, Serialize};

/// A record as the authentication store keeps it. Shaped by the auth
/// system's needs (verification flags, lockout), not the domain's.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthRecord {
    pub subject: String,
    pub email: String,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub disabled: bool,
}

/// The domain's view of a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Translate an auth-store record into the domain entity.
///
/// Falls back to the local part of the email when no display name is
/// set, matching how profiles render elsewhere.
pub fn profile_from_auth(record: &AuthRecord) -> UserProfile {
    let name = record
        .display_name
        .clone()
        .unwrap_or_else(|| record.email.split('@').next().unwrap_or_default().to_string());
    UserProfile {
        id: record.subject.clone(),
        name,
        email: record.email.clone(),
    }
}
