use std::fmt;

/// Validation failures for the shared value types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Currency code is not a 3-letter uppercase ASCII code.
    InvalidCurrency(String),
    /// Location name empty or coordinates out of range.
    InvalidLocation(String),
    /// Money arithmetic overflowed.
    AmountOverflow,
    /// Two amounts in different currencies were combined.
    CurrencyMismatch { left: String, right: String },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::InvalidCurrency(code) => write!(f, "invalid currency code: {}", code),
            DomainError::InvalidLocation(msg) => write!(f, "invalid location: {}", msg),
            DomainError::AmountOverflow => write!(f, "money amount overflow"),
            DomainError::CurrencyMismatch { left, right } => {
                write!(f, "currency mismatch: {} vs {}", left, right)
            }
        }
    }
}

impl std::error::Error for DomainError {}
