//! Fixed-point price type.
//!
//! Prices are stored as integer cents so that the two-decimal rounding the
//! commerce platform expects happens exactly once, at quote time, and every
//! later rendering (`Display`, JSON) is exact.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// A non-negative price at 1e-2 scale (cents).
///
/// There is no `From<i64>`; use [`Price::from_cents`] so that raw integers
/// are never mistaken for money by accident.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Construct from a cent count. Negative input clamps to zero.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        if cents < 0 {
            Price(0)
        } else {
            Price(cents)
        }
    }

    #[inline]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Lossy conversion used only for JSON output.
    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Error returned when a decimal price string cannot be represented exactly
/// in cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceParseError {
    input: String,
}

impl fmt::Display for PriceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid price literal '{}'", self.input)
    }
}

impl std::error::Error for PriceParseError {}

impl FromStr for Price {
    type Err = PriceParseError;

    /// Parses `"3"`, `"3.0"` or `"3.01"`. Signs, exponents and more than two
    /// fractional digits are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PriceParseError {
            input: s.to_string(),
        };

        let trimmed = s.trim();
        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let whole: i64 = whole.parse().map_err(|_| err())?;
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| err())? * 10,
            _ => frac.parse().map_err(|_| err())?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .map(Price)
            .ok_or_else(err)
    }
}
