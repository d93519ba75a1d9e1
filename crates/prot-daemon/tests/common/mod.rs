//! Shared helpers for the in-process daemon scenarios.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use prot_pricing::Price;
use prot_shopify::{RemoteError, VariantPriceClient};
use tower::ServiceExt; // oneshot

pub const VARIANT_ID: u64 = 45626932789401;

/// Remote stand-in that records every call and how many overlapped.
#[derive(Default)]
pub struct RecordingClient {
    pub delay: Duration,
    pub fail_with: Option<RemoteError>,
    /// Price the fake platform "commits"; defaults to the requested price.
    pub commit_override: Option<Price>,
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub requested: Mutex<Vec<(u64, Price)>>,
}

impl RecordingClient {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl VariantPriceClient for RecordingClient {
    async fn set_price(&self, variant_id: u64, price: Price) -> Result<Price, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.requested.lock().unwrap().push((variant_id, price));

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(self.commit_override.unwrap_or(price)),
        }
    }
}

pub fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

/// Drive the router with a single request and return (status, json body).
pub async fn call(
    router: axum::Router,
    req: Request<axum::body::Body>,
) -> (StatusCode, serde_json::Value) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    let json = serde_json::from_slice(&body).expect("body is not valid JSON");
    (status, json)
}
