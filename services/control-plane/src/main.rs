//! cirrus Control Plane
//!
//! Serves the zone resolution and instance launch API for one region.

use std::sync::Arc;

use anyhow::Result;
use cirrus_control_plane::{
    api, config,
    provider::{CloudProvider, HttpProvider, MockProvider},
    state::AppState,
    zones::ZoneService,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    // Prefer RUST_LOG, fall back to CIRRUS_LOG_LEVEL
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting cirrus control plane");
    info!(
        listen_addr = %config.listen_addr,
        region = %config.region,
        dev_mode = config.dev_mode,
        "Configuration loaded"
    );

    let provider: Arc<dyn CloudProvider> = if config.dev_mode {
        warn!("Dev mode: using in-memory provider");
        Arc::new(MockProvider::dev_default())
    } else {
        match HttpProvider::new(&config.provider_url, config.provider_timeout) {
            Ok(provider) => {
                info!(provider_url = %config.provider_url, "Provider client configured");
                Arc::new(provider)
            }
            Err(e) => {
                error!(error = %e, "Failed to build provider client");
                return Err(e.into());
            }
        }
    };

    let state = AppState::new(ZoneService::new(provider, config.region.clone()));
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Received shutdown signal");
        })
        .await?;

    info!("Control plane shutdown complete");
    Ok(())
}
