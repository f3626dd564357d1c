use api_rest::AppState;
use medconnect_core::{
    config::generation_retry_cap_from_env_value, CoreConfig, MemoryStore, RecordStore,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the MedConnect application.
///
/// Starts the REST server with OpenAPI/Swagger documentation. The server is
/// backed by the in-memory reference store adapter; a durable adapter plugs in
/// behind the same `RecordStore` trait.
///
/// # Environment Variables
/// - `MEDCONNECT_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MEDCONNECT_GENERATION_RETRY_CAP`: bound on code allocation retries
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medconnect=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MEDCONNECT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting MedConnect REST on {}", rest_addr);

    let retry_cap = generation_retry_cap_from_env_value(
        std::env::var("MEDCONNECT_GENERATION_RETRY_CAP").ok(),
    )?;
    let cfg = Arc::new(CoreConfig::new(retry_cap)?);
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::default());

    let app = api_rest::app(AppState::new(store, cfg));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
