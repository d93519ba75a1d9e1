//! Axum router and all HTTP handlers for prot-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers (CORS, tracing) so tests can use the bare router.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prot_pricing::{classify, quote, Subtotal};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    api_types::{ErrorResponse, HealthResponse, PriceResponse, UpdateResponse},
    state::AppState,
};

/// Client-facing message for every rejected subtotal.
pub const INVALID_SUBTOTAL: &str = "Invalid subtotal";

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/protection/price", get(protection_price))
        .route("/protection/update", post(protection_update))
        .with_state(state)
}

fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: msg.into() })).into_response()
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    info!("health check");
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /protection/price?subtotal=
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct PriceQuery {
    subtotal: Option<String>,
}

/// Quote only; never touches the remote platform or the gate.
pub(crate) async fn protection_price(
    query: Result<Query<PriceQuery>, QueryRejection>,
) -> Response {
    let raw = match query {
        Ok(Query(q)) => q.subtotal.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "price check rejected: malformed query");
            return error_response(StatusCode::BAD_REQUEST, INVALID_SUBTOTAL);
        }
    };
    let subtotal = match Subtotal::parse(&raw) {
        Ok(s) => s,
        Err(e) => {
            warn!(subtotal = %raw, error = %e, "price check rejected");
            return error_response(StatusCode::BAD_REQUEST, INVALID_SUBTOTAL);
        }
    };

    let price = quote(subtotal);
    info!(subtotal = %subtotal, price = %price, "price check");
    (StatusCode::OK, Json(PriceResponse { price })).into_response()
}

// ---------------------------------------------------------------------------
// POST /protection/update   body: {"subtotal": <number>}
// ---------------------------------------------------------------------------

/// Extract `subtotal` from a JSON body. It must be a JSON number; strings,
/// a missing field, or a body that is not JSON all count as invalid.
fn update_subtotal(body: &[u8]) -> Option<f64> {
    let v: Value = serde_json::from_slice(body).ok()?;
    v.get("subtotal")?.as_f64()
}

pub(crate) async fn protection_update(State(st): State<Arc<AppState>>, body: Bytes) -> Response {
    let subtotal = match update_subtotal(&body).map(Subtotal::new) {
        Some(Ok(s)) => s,
        Some(Err(e)) => {
            warn!(error = %e, "update rejected");
            return error_response(StatusCode::BAD_REQUEST, INVALID_SUBTOTAL);
        }
        None => {
            warn!("update rejected: subtotal missing or not a number");
            return error_response(StatusCode::BAD_REQUEST, INVALID_SUBTOTAL);
        }
    };

    let target = quote(subtotal);
    info!(
        subtotal = %subtotal,
        tier = classify(subtotal).as_str(),
        target = %target,
        "update request"
    );

    let outcome = st
        .gate
        .run_exclusive(&st.resource_key, || {
            st.remote.set_price(st.variant_id, target)
        })
        .await;

    match outcome {
        Ok(committed) => {
            info!(variant_id = st.variant_id, price = %committed, "variant price updated");
            (
                StatusCode::OK,
                Json(UpdateResponse {
                    updated: true,
                    price: committed,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(variant_id = st.variant_id, error = %e, "variant price update failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
