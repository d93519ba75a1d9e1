//! prot-daemon entry point.
//!
//! Thin on purpose: loads config, sets up tracing, builds the shared state,
//! wires middleware, and starts the HTTP server. Handlers live in
//! `routes.rs`; shared state in `state.rs`.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use prot_config::ServiceConfig;
use prot_daemon::{routes, state};
use prot_shopify::ShopifyVariantClient;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if absent; deployments inject env vars directly.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = ServiceConfig::from_env().context("loading configuration")?;
    info!(?cfg, "configuration loaded");

    let client = ShopifyVariantClient::new(
        &cfg.shopify_domain,
        cfg.api_version.clone(),
        cfg.admin_api_token.clone(),
    );
    let shared = Arc::new(state::AppState::new(Arc::new(client), cfg.variant_id));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors(cfg.cors_origins.as_deref())?);

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    info!("protection server listening on http://{}", cfg.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    info!("protection server stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// CORS: any origin unless an explicit allow-list is configured.
fn cors(origins: Option<&[String]>) -> anyhow::Result<CorsLayer> {
    let allow = match origins {
        Some(list) => AllowOrigin::list(
            list.iter()
                .map(|o| HeaderValue::from_str(o).with_context(|| format!("CORS origin '{o}'")))
                .collect::<anyhow::Result<Vec<_>>>()?,
        ),
        None => AllowOrigin::from(Any),
    };

    Ok(CorsLayer::new()
        .allow_origin(allow)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c; shutting down");
    }
}
