//! Cinedex API Server
//!
//! REST API server for the Cinedex movie catalog.
//!
//! Author: hephaex@gmail.com

use anyhow::Context;
use cinedex_api::{create_router, state::AppState};
use cinedex_core::{AppConfig, StoreBackend};
use cinedex_store::{DocumentStore, MemoryDocumentStore, SurrealDocumentStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "cinedex_api={level},cinedex_store={level},audit=info,tower_http=debug",
            level = config.logging.level
        )
        .into()
    });
    if config.logging.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    config.validate().context("invalid configuration")?;

    let store: Arc<dyn DocumentStore> = match config.database.backend {
        StoreBackend::Surreal => {
            let store = SurrealDocumentStore::new(&config.database)
                .await
                .context("failed to connect to SurrealDB")?;
            store.init_schema().await?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on exit");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let state = Arc::new(AppState::new(config, store)?);

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Cinedex API Server starting on http://{}", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
