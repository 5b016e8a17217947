use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    LockPoisoned(&'static str),
    /// Another writer advanced the stored version since this aggregate
    /// was loaded. Recoverable: retry the command from a fresh read.
    VersionConflict {
        id: String,
        expected: u64,
        actual: u64,
    },
    /// Outbox row lookup failed.
    MessageNotFound(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::LockPoisoned(operation) => {
                write!(f, "store lock poisoned during {}", operation)
            }
            StoreError::VersionConflict {
                id,
                expected,
                actual,
            } => write!(
                f,
                "concurrent write detected for {} (loaded at version {}, stored is {})",
                id, expected, actual
            ),
            StoreError::MessageNotFound(id) => write!(f, "outbox message not found: {}", id),
        }
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    /// Whether the caller should retry the command from a fresh read.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}
