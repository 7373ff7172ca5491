//! Development HTTP server for the Folio content hierarchy
//!
//! Exposes `HierarchyService` as a small REST API so front-end work and manual
//! testing can run against a real store. Development only: no
//! authentication, CORS limited to local origins.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p folio-dev-server
//!
//! # In-memory store on another port
//! FOLIO_IN_MEMORY=1 FOLIO_DEV_SERVER_PORT=3002 cargo run -p folio-dev-server
//! ```

use anyhow::{Context, Result};
use axum::{
    http::{header::HeaderValue, Method},
    Router,
};
use folio_core::db::{DatabaseService, MemoryStore, NodeStore, TursoStore};
use folio_core::services::HierarchyService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
mod http_error;
mod node_endpoints;

pub use config::ServerConfig;
pub use http_error::HttpError;

/// Application state shared across all endpoints
///
/// `HierarchyService` serializes writes per collection itself, so the state
/// needs no lock of its own.
#[derive(Clone)]
pub struct AppState {
    pub hierarchy: HierarchyService,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(node_endpoints::routes(state))
        .layer(TraceLayer::new_for_http())
}

/// Allow the configured origins to call the API from a browser
fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{}'", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
        .allow_credentials(false))
}

/// Open the configured store and build the service on top of it
pub async fn build_service(config: &ServerConfig) -> Result<HierarchyService> {
    let store: Arc<dyn NodeStore> = if config.in_memory {
        tracing::info!("Using in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        tracing::info!("Database: {}", config.db_path.display());
        let db = DatabaseService::new(config.db_path.clone())
            .await
            .context("Failed to open database")?;
        Arc::new(TursoStore::new(Arc::new(db)))
    };

    Ok(HierarchyService::with_config(store, config.hierarchy.clone())?)
}

/// Log every committed mutation until the service is dropped
fn spawn_event_logger(service: &HierarchyService) {
    let mut events = service.subscribe_to_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    tracing::debug!("Event {} for node {}", event.event_type(), event.node_id())
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!("Event logger lagged, {} events skipped", missed)
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Start the HTTP dev server
///
/// # Errors
///
/// Returns error if the store cannot be opened or the port cannot be bound.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let hierarchy = build_service(&config).await?;
    spawn_event_logger(&hierarchy);

    let app = create_router(AppState { hierarchy }).layer(cors_layer(&config.cors_origins)?);

    let addr = format!("127.0.0.1:{}", config.port);
    tracing::info!("HTTP dev server starting on http://{}", addr);
    tracing::info!("CORS enabled for {}", config.cors_origins.join(", "));
    tracing::info!("Development mode only - NOT for production use");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
