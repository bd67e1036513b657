//! Validator proxy server binary

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use tv::api::{create_router, ApiState};
use tv::{HttpRelay, RelayBackend, ValidatorConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting validator server v{}", env!("CARGO_PKG_VERSION"));

    // Load config from file
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "validator.toml".to_string());

    let config = ValidatorConfig::load(&config_path)
        .with_context(|| format!("Failed to load config file: {}", config_path))?
        .with_env_overrides();

    info!(
        config_path = config_path,
        relay_url = config.relay_url,
        max_code_length = config.max_code_length,
        "Loaded configuration"
    );

    let relay = HttpRelay::from_config(&config).context("Failed to create relay client")?;

    let health = relay.health_check().await;
    if health.healthy {
        info!(relay = relay.name(), latency_ms = ?health.latency_ms, "Relay reachable");
    } else {
        warn!(
            relay = relay.name(),
            error = health.error.as_deref().unwrap_or("unknown"),
            "Relay not reachable yet; requests will fail until it is up"
        );
    }

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen_addr: {}", config.listen_addr))?;

    // Create API state
    let state = Arc::new(ApiState {
        relay: Arc::new(relay),
        config,
    });

    // Create router
    let app = create_router(state);

    // Start server
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
