//! SecOps HTTP Server
//!
//! Exposes the incident, audit and scan engine over a JSON API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SECOPS SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────┐  ┌─────────────────────┐  │
//! │  │  API      │  │  Incidents   │  │  Pipeline runs      │  │
//! │  │  Gateway  │  │  + Threat    │  │  (audit / scan,     │  │
//! │  │  (Axum)   │  │  Analysis    │  │   tokio tasks)      │  │
//! │  └─────┬─────┘  └──────┬───────┘  └──────────┬──────────┘  │
//! │        └───────────────┼─────────────────────┘             │
//! │                        ▼                                   │
//! │                ┌────────────────┐                          │
//! │                │ SecurityEngine │                          │
//! │                │  (in-memory)   │                          │
//! │                └────────────────┘                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod models;
mod handlers;
mod error;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::net::SocketAddr;
use std::sync::Arc;

use secops_core::SecurityEngine;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging (JSON lines in production)
    let json = config.is_production();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "secops_server=debug,secops_core=info,tower_http=debug".into()))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("SecOps Server starting ({})...", config.environment);
    match &config.engine_config {
        Some(path) => tracing::info!("Engine config: {}", path),
        None => tracing::info!("Engine config: default location or built-in defaults"),
    }

    // Build engine
    let engine = SecurityEngine::from_env().context("Failed to initialize engine")?;

    // Build application state
    let state = AppState {
        engine: Arc::new(engine),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SecurityEngine>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let incident_routes = Router::new()
        .route("/api/v1/incidents", get(handlers::incidents::list))
        .route("/api/v1/incidents", post(handlers::incidents::create))
        .route("/api/v1/incidents/stats", get(handlers::incidents::stats))
        .route("/api/v1/incidents/:id", get(handlers::incidents::get))
        .route("/api/v1/incidents/:id/evidence", post(handlers::incidents::submit_evidence))
        .route("/api/v1/incidents/:id/status", put(handlers::incidents::update_status))
        .route("/api/v1/incidents/:id/assignee", put(handlers::incidents::assign));

    // Long-running runs, one active slot each
    let run_routes = Router::new()
        .route("/api/v1/audits", post(handlers::audits::start))
        .route("/api/v1/audits/current", get(handlers::audits::current))
        .route("/api/v1/audits/current/cancel", post(handlers::audits::cancel))
        .route("/api/v1/scans", post(handlers::scans::start))
        .route("/api/v1/scans/current", get(handlers::scans::current))
        .route("/api/v1/scans/current/cancel", post(handlers::scans::cancel));

    let cors = if state.config.is_production() {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(incident_routes)
        .merge(run_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
