//! Development HTTP Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings (port 3001, default DB path)
//! cargo run -p folio-dev-server
//!
//! # Custom port
//! FOLIO_DEV_SERVER_PORT=3002 cargo run -p folio-dev-server
//! ```
//!
//! See `folio_dev_server::config` for every environment variable.
//! `RUST_LOG` sets the log filter (e.g. "info", "folio_core=debug").

use folio_dev_server::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Folio HTTP Dev Server");

    let config = ServerConfig::from_env()?;
    tracing::info!("Port: {}", config.port);

    start_server(config).await
}
