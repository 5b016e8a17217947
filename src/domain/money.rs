use std::fmt;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// ISO-4217-style currency code: exactly three uppercase ASCII letters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl Into<String>) -> Result<Self, DomainError> {
        let code = code.into();
        let valid = code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase());
        if valid {
            Ok(Currency(code))
        } else {
            Err(DomainError::InvalidCurrency(code))
        }
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An amount of money in minor units (cents) plus its currency.
///
/// Amounts are integral; fractional currency math never enters the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    cents: u64,
    currency: Currency,
}

impl Money {
    pub fn new(cents: u64, currency: Currency) -> Self {
        Money { cents, currency }
    }

    pub fn cents(&self) -> u64 {
        self.cents
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Multiply a per-unit price by a count, e.g. seats booked.
    pub fn times(&self, count: u32) -> Result<Money, DomainError> {
        let cents = self
            .cents
            .checked_mul(u64::from(count))
            .ok_or(DomainError::AmountOverflow)?;
        Ok(Money {
            cents,
            currency: self.currency.clone(),
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02} {}", self.cents / 100, self.cents % 100, self.currency)
    }
}
