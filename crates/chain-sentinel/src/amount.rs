//! Token amounts expressed in atomic units.
//!
//! A quantity is a decimal string of atomic units; `10^fractional_digits`
//! atomic units make one whole token. Keeping the quantity as a string avoids
//! any floating point or integer-width limits on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SentinelError;

/// Highest number of fractional digits a token may declare.
pub const MAX_FRACTIONAL_DIGITS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    pub quantity: String,
    pub fractional_digits: u8,
    pub token_ticker: String,
}

impl Amount {
    pub fn new(quantity: impl Into<String>, fractional_digits: u8, ticker: impl Into<String>) -> Self {
        Self {
            quantity: quantity.into(),
            fractional_digits,
            token_ticker: ticker.into(),
        }
    }

    /// Checks the quantity, digit count and ticker. Zero is allowed.
    pub fn validate(&self) -> Result<(), SentinelError> {
        if self.quantity.is_empty() || !self.quantity.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SentinelError::validation(format!(
                "amount quantity must be a non-empty decimal string, got {:?}",
                self.quantity
            )));
        }
        if self.fractional_digits > MAX_FRACTIONAL_DIGITS {
            return Err(SentinelError::validation(format!(
                "fractional digits must be at most {MAX_FRACTIONAL_DIGITS}, got {}",
                self.fractional_digits
            )));
        }
        validate_ticker(&self.token_ticker)
    }

    /// Like [`validate`](Self::validate) but also rejects a zero quantity.
    pub fn validate_positive(&self) -> Result<(), SentinelError> {
        self.validate()?;
        if self.is_zero() {
            return Err(SentinelError::validation(format!(
                "amount of {} must be positive",
                self.token_ticker
            )));
        }
        Ok(())
    }

    pub fn is_zero(&self) -> bool {
        self.quantity.bytes().all(|b| b == b'0')
    }
}

/// Tickers are 3-4 upper-case ASCII letters.
fn validate_ticker(ticker: &str) -> Result<(), SentinelError> {
    let ok = (3..=4).contains(&ticker.len()) && ticker.bytes().all(|b| b.is_ascii_uppercase());
    if !ok {
        return Err(SentinelError::validation(format!(
            "token ticker must be 3-4 upper-case letters, got {ticker:?}"
        )));
    }
    Ok(())
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.quantity.bytes().all(|b| b.is_ascii_digit()) {
            return write!(f, "{} {}", self.quantity, self.token_ticker);
        }
        let digits = self.quantity.trim_start_matches('0');
        let frac_len = self.fractional_digits as usize;

        let padded = format!("{:0>width$}", digits, width = frac_len + 1);
        let (whole, fractional) = padded.split_at(padded.len() - frac_len);
        let fractional = fractional.trim_end_matches('0');

        if fractional.is_empty() {
            write!(f, "{} {}", whole, self.token_ticker)
        } else {
            write!(f, "{}.{} {}", whole, fractional, self.token_ticker)
        }
    }
}
