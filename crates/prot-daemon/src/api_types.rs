//! Request and response bodies for the daemon's HTTP endpoints.
//!
//! No business logic lives here.

use prot_pricing::Price;
use serde::Serialize;

// ---------------------------------------------------------------------------
// /health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// /protection/price
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PriceResponse {
    pub price: Price,
}

// ---------------------------------------------------------------------------
// /protection/update
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    pub updated: bool,
    /// Price as committed by the remote platform.
    pub price: Price,
}

// ---------------------------------------------------------------------------
// Errors (400 / 500)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
