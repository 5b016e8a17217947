use std::collections::HashMap;
use std::sync::Mutex;

use crate::rpc::RpcError;

use super::{profile_from_auth, AuthRecord, UserProfile};

/// Answer to a `validate_user` call.
#[derive(Clone, Debug)]
pub struct UserValidation {
    pub exists: bool,
    /// Verified and not disabled.
    pub is_valid: bool,
    pub profile: Option<UserProfile>,
}

/// Identity validation RPC exposed by the User service.
pub trait UserDirectory: Send + Sync {
    fn validate_user(&self, user_id: &str) -> Result<UserValidation, RpcError>;
}

/// In-memory directory over auth records.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    records: Mutex<HashMap<String, AuthRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: AuthRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.insert(record.subject.clone(), record);
        }
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn validate_user(&self, user_id: &str) -> Result<UserValidation, RpcError> {
        let records = self
            .records
            .lock()
            .map_err(|e| RpcError::Remote(e.to_string()))?;
        Ok(match records.get(user_id) {
            Some(record) => UserValidation {
                exists: true,
                is_valid: record.email_verified && !record.disabled,
                profile: Some(profile_from_auth(record)),
            },
            None => UserValidation {
                exists: false,
                is_valid: false,
                profile: None,
            },
        })
    }
}
