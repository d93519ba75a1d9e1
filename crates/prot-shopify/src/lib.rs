//! prot-shopify
//!
//! Boundary to the commerce platform: one operation, "set the price of a
//! variant", over the Admin REST API.
//!
//! The access token is passed in by the caller (daemon config) and is never
//! logged; `Debug` output redacts it.

mod error;

pub use error::RemoteError;

use prot_pricing::Price;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Client contract
// ---------------------------------------------------------------------------

/// Sets a variant's price on the remote platform.
///
/// Implementations perform exactly one network call per invocation and do
/// not retry. The returned price is what the remote side committed, which
/// callers treat as authoritative.
#[async_trait::async_trait]
pub trait VariantPriceClient: Send + Sync {
    async fn set_price(&self, variant_id: u64, price: Price) -> Result<Price, RemoteError>;
}

// ---------------------------------------------------------------------------
// Shopify Admin API
// ---------------------------------------------------------------------------

pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

#[derive(Clone)]
pub struct ShopifyVariantClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
    access_token: String,
}

impl std::fmt::Debug for ShopifyVariantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyVariantClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("access_token", &"<REDACTED>")
            .finish()
    }
}

impl ShopifyVariantClient {
    /// `domain` is the bare shop host, e.g. `my-shop.myshopify.com`.
    pub fn new(domain: &str, api_version: String, access_token: String) -> Self {
        Self::new_with_base_url(format!("https://{domain}"), api_version, access_token)
    }

    pub fn new_with_base_url(base_url: String, api_version: String, access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_version,
            access_token,
        }
    }

    fn variant_url(&self, variant_id: u64) -> String {
        format!(
            "{}/admin/api/{}/variants/{}.json",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            variant_id
        )
    }
}

#[derive(Debug, Serialize)]
struct VariantUpdateRequest {
    variant: VariantPricePatch,
}

#[derive(Debug, Serialize)]
struct VariantPricePatch {
    id: u64,
    price: String,
}

#[derive(Debug, Deserialize)]
struct VariantEnvelope {
    variant: VariantBody,
}

#[derive(Debug, Deserialize)]
struct VariantBody {
    // Shopify sends a string; tolerate a bare number too.
    price: Value,
}

#[async_trait::async_trait]
impl VariantPriceClient for ShopifyVariantClient {
    async fn set_price(&self, variant_id: u64, price: Price) -> Result<Price, RemoteError> {
        let body = VariantUpdateRequest {
            variant: VariantPricePatch {
                id: variant_id,
                price: price.to_string(),
            },
        };

        info!(variant_id, price = %price, "sending variant price update");

        let resp = self
            .http
            .put(self.variant_url(variant_id))
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(variant_id, status = status.as_u16(), "variant price update rejected");
            return Err(RemoteError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body: text,
            });
        }

        let envelope: VariantEnvelope = resp
            .json()
            .await
            .map_err(|e| RemoteError::Decode(format!("variant response: {e}")))?;

        committed_price(&envelope.variant.price)
    }
}

fn committed_price(raw: &Value) -> Result<Price, RemoteError> {
    let parsed = match raw {
        Value::String(s) => s.parse::<Price>().ok(),
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| Price::from_cents((v * 100.0).round() as i64)),
        _ => None,
    };
    parsed.ok_or_else(|| RemoteError::Decode(format!("unparseable committed price: {raw}")))
}
