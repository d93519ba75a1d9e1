//! Shared runtime state for prot-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum.

use std::sync::Arc;

use prot_gate::{KeyedGate, ResourceKey};
use prot_shopify::VariantPriceClient;

/// Static build metadata included in the health response.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    /// Remote price setter; the only thing run inside the gate.
    pub remote: Arc<dyn VariantPriceClient>,
    /// Serializes updates per remote variant.
    pub gate: KeyedGate,
    /// The single variant that carries the protection price.
    pub variant_id: u64,
    pub resource_key: ResourceKey,
}

impl AppState {
    pub fn new(remote: Arc<dyn VariantPriceClient>, variant_id: u64) -> Self {
        Self::with_gate(remote, variant_id, KeyedGate::new())
    }

    /// Build with an existing gate, e.g. one shared with another component
    /// updating the same variant.
    pub fn with_gate(remote: Arc<dyn VariantPriceClient>, variant_id: u64, gate: KeyedGate) -> Self {
        Self {
            build: BuildInfo {
                service: "prot-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            remote,
            gate,
            variant_id,
            resource_key: ResourceKey::from(variant_id),
        }
    }
}
