//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own, against the in-memory reference
//! store.
//!
//! ## Intended use
//! Development and debugging when you only want the REST server (with
//! OpenAPI/Swagger UI). Deployments run the workspace's main `medconnect-run`
//! binary instead.

use api_rest::AppState;
use medconnect_core::{config::generation_retry_cap_from_env_value, CoreConfig, MemoryStore, RecordStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the standalone MedConnect REST API server.
///
/// # Environment Variables
/// - `MEDCONNECT_REST_ADDR`: server address (default: "0.0.0.0:3000")
/// - `MEDCONNECT_GENERATION_RETRY_CAP`: bound on code allocation retries
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDCONNECT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting MedConnect REST API on {}", addr);

    let retry_cap = generation_retry_cap_from_env_value(
        std::env::var("MEDCONNECT_GENERATION_RETRY_CAP").ok(),
    )?;
    let cfg = Arc::new(CoreConfig::new(retry_cap)?);
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::default());

    let app = api_rest::app(AppState::new(store, cfg));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
