//! # Healthwatch Server
//!
//! Standalone server hosting the health-check endpoints for the configured
//! dependencies.
//!
//! ## Usage
//!
//! ```bash
//! # Run with config/healthwatch.toml
//! cargo run --bin healthwatch-server
//!
//! # Explicit config file and environment overrides
//! HEALTHWATCH_CONFIG=/etc/healthwatch.toml \
//! HEALTHWATCH__HEALTH_CHECK__EVALUATION_TIME_IN_SECONDS=30 \
//!   cargo run --bin healthwatch-server
//! ```

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use healthwatch_core::bootstrap::{BuildInfo, HealthCheckSystem};
use healthwatch_core::config::ConfigManager;
use healthwatch_core::logging;
use healthwatch_core::web::create_app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        build_mode = if cfg!(debug_assertions) { "debug" } else { "release" },
        "Starting healthwatch server"
    );

    let manager = ConfigManager::load().context("Failed to load configuration")?;
    let config = manager.shared();
    let build_info = BuildInfo::from_config(&config.application);

    info!(
        environment = %manager.environment(),
        source = ?manager.source(),
        application = %build_info.label(),
        "Configuration ready"
    );

    let mut handle = HealthCheckSystem::new(config.clone(), build_info)
        .start()
        .await
        .context("Failed to start health-check subsystem")?;

    if handle.is_none() {
        warn!("Health-check subsystem is not mounted; serving without health routes");
    }

    let app = create_app(
        &config.server,
        handle.as_ref().map(|h| h.app_state().clone()),
    );

    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    info!(address = %config.server.bind_address, "Listening; press Ctrl+C to shut down");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received, stopping health-check subsystem");
            if let Some(handle) = handle.as_mut() {
                if let Err(e) = handle.shutdown().await {
                    error!(error = %e, "Health-check subsystem did not stop cleanly");
                }
            }
        })
        .await
        .context("HTTP server failed")?;

    info!("Healthwatch server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
