//! prot-pricing
//!
//! Deterministic protection-price quote from an order subtotal.
//!
//! Pure functions only: no I/O, no shared state. Safe to call from any task
//! any number of times; the result depends on the subtotal alone.

mod price;

pub use price::{Price, PriceParseError};

use std::fmt;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Subtotals strictly below this amount get [`FIXED_PRICE`].
pub const THRESHOLD: f64 = 100.0;

/// Flat price for subtotals under [`THRESHOLD`].
pub const FIXED_PRICE: Price = Price::from_cents(217);

/// Share of the subtotal charged at or above [`THRESHOLD`].
pub const PERCENT: f64 = 0.03;

/// Added on top of the percentage share.
pub const BASE_INCREMENT: f64 = 0.01;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum PricingError {
    /// Subtotal is missing, non-numeric, non-finite or negative.
    InvalidInput { reason: String },
}

impl fmt::Display for PricingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingError::InvalidInput { reason } => write!(f, "Invalid subtotal: {reason}"),
        }
    }
}

impl std::error::Error for PricingError {}

fn invalid(reason: impl Into<String>) -> PricingError {
    PricingError::InvalidInput {
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Subtotal
// ---------------------------------------------------------------------------

/// A caller-supplied subtotal that has passed validation (finite, `>= 0`).
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct Subtotal(f64);

impl Subtotal {
    pub fn new(value: f64) -> Result<Self, PricingError> {
        if !value.is_finite() {
            return Err(invalid(format!("{value} is not finite")));
        }
        if value < 0.0 {
            return Err(invalid(format!("{value} is negative")));
        }
        Ok(Subtotal(value))
    }

    /// Parse a decimal literal such as a query-string value.
    pub fn parse(raw: &str) -> Result<Self, PricingError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty"));
        }
        let value: f64 = trimmed
            .parse()
            .map_err(|_| invalid(format!("'{trimmed}' is not a number")))?;
        Self::new(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Subtotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

/// Which branch of the price schedule a subtotal falls in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tier {
    /// Below threshold: flat [`FIXED_PRICE`].
    Fixed,
    /// At or above threshold: percentage plus increment.
    Dynamic,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Fixed => "fixed",
            Tier::Dynamic => "dynamic",
        }
    }
}

pub fn classify(subtotal: Subtotal) -> Tier {
    if subtotal.0 < THRESHOLD {
        Tier::Fixed
    } else {
        Tier::Dynamic
    }
}

/// Quote the protection price for a validated subtotal.
///
/// The dynamic branch is evaluated directly at cent scale
/// (`s * PERCENT * 100 + BASE_INCREMENT * 100`) and rounded half away from
/// zero once. Amounts beyond `i64` cents saturate.
pub fn quote(subtotal: Subtotal) -> Price {
    match classify(subtotal) {
        Tier::Fixed => FIXED_PRICE,
        Tier::Dynamic => {
            let cents = subtotal.0 * (PERCENT * 100.0) + BASE_INCREMENT * 100.0;
            Price::from_cents(cents.round() as i64)
        }
    }
}

/// Validate an untrusted number and quote it.
pub fn quote_raw(subtotal: f64) -> Result<Price, PricingError> {
    Subtotal::new(subtotal).map(quote)
}
