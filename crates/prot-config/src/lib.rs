//! Runtime configuration for the protection-price daemon.
//!
//! # Contract
//! - Everything is read from the process environment exactly once, at
//!   startup, via [`ServiceConfig::from_env`]. The daemon loads `.env` with
//!   `dotenvy` before calling it.
//! - The resolved struct is passed into constructors; nothing else calls
//!   `std::env::var`.
//! - The access token is redacted in `Debug`, and errors name the variable,
//!   never its value.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::{bail, Context, Result};

pub const ENV_SHOPIFY_DOMAIN: &str = "SHOPIFY_DOMAIN";
pub const ENV_SHOPIFY_API_VERSION: &str = "SHOPIFY_API_VERSION";
pub const ENV_ADMIN_API_TOKEN: &str = "ADMIN_API_TOKEN";
pub const ENV_VARIANT_ID: &str = "PROTECTION_VARIANT_ID";
pub const ENV_PORT: &str = "PORT";
pub const ENV_BIND_HOST: &str = "PROTECTION_BIND_HOST";
pub const ENV_CORS_ORIGINS: &str = "PROTECTION_CORS_ORIGINS";

pub const DEFAULT_SHOPIFY_DOMAIN: &str = "play-farhan.myshopify.com";
pub const DEFAULT_API_VERSION: &str = "2025-07";
pub const DEFAULT_VARIANT_ID: u64 = 45626932789401;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone)]
pub struct ServiceConfig {
    /// Bare shop host, no scheme.
    pub shopify_domain: String,
    pub api_version: String,
    pub admin_api_token: String,
    /// Variant whose price carries the protection add-on.
    pub variant_id: u64,
    pub bind_addr: SocketAddr,
    /// `None` = any origin.
    pub cors_origins: Option<Vec<String>>,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("shopify_domain", &self.shopify_domain)
            .field("api_version", &self.api_version)
            .field("admin_api_token", &"<REDACTED>")
            .field("variant_id", &self.variant_id)
            .field("bind_addr", &self.bind_addr)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let Some(admin_api_token) = get(ENV_ADMIN_API_TOKEN) else {
            bail!("required env var {ENV_ADMIN_API_TOKEN} is not set");
        };

        let shopify_domain =
            get(ENV_SHOPIFY_DOMAIN).unwrap_or_else(|| DEFAULT_SHOPIFY_DOMAIN.to_string());
        if shopify_domain.contains("://") {
            bail!("{ENV_SHOPIFY_DOMAIN} must be a bare host, got '{shopify_domain}'");
        }

        let api_version =
            get(ENV_SHOPIFY_API_VERSION).unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let variant_id = match get(ENV_VARIANT_ID) {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("{ENV_VARIANT_ID} must be a numeric id, got '{raw}'"))?,
            None => DEFAULT_VARIANT_ID,
        };

        let port = match get(ENV_PORT) {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("{ENV_PORT} must be a port number, got '{raw}'"))?,
            None => DEFAULT_PORT,
        };

        let host = match get(ENV_BIND_HOST) {
            Some(raw) => raw
                .parse::<IpAddr>()
                .with_context(|| format!("{ENV_BIND_HOST} must be an IP address, got '{raw}'"))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let cors_origins = match get(ENV_CORS_ORIGINS) {
            Some(raw) => Some(parse_origins(&raw)?),
            None => None,
        };

        Ok(Self {
            shopify_domain,
            api_version,
            admin_api_token,
            variant_id,
            bind_addr: SocketAddr::new(host, port),
            cors_origins,
        })
    }
}

/// Split a comma list of origins. Each must be `http(s)://host[:port]` made of
/// visible ASCII so it can become a header value verbatim.
fn parse_origins(raw: &str) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for origin in raw.split(',').map(str::trim).filter(|o| !o.is_empty()) {
        let host = origin
            .strip_prefix("https://")
            .or_else(|| origin.strip_prefix("http://"));
        let well_formed = host.is_some_and(|h| !h.is_empty() && !h.contains('/'))
            && origin.bytes().all(|b| b.is_ascii_graphic());
        if !well_formed {
            bail!("{ENV_CORS_ORIGINS} entry '{origin}' is not an http(s) origin");
        }
        out.push(origin.to_string());
    }
    if out.is_empty() {
        bail!("{ENV_CORS_ORIGINS} is set but lists no origins");
    }
    Ok(out)
}
