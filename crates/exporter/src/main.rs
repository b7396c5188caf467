//! NSX-T Exporter - Prometheus exporter for VMware NSX-T
//!
//! Every request to /metrics fans out to the configured collectors, which
//! read the NSX-T manager API and report object status as gauges.

use exporter_lib::{default_registry, health::HealthRegistry, Aggregator, HttpClient, NsxtApi};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = EXPORTER_VERSION, "Starting nsxt-exporter");

    // Load configuration
    let config = config::ExporterConfig::load()?;
    info!(
        host = %config.host,
        insecure = config.insecure,
        listen_port = config.listen_port,
        "Exporter configured"
    );

    let client = HttpClient::new(&config.client_config())
        .with_context(|| format!("Failed to create NSX-T client for {}", config.host))?;
    let api: Arc<dyn NsxtApi> = Arc::new(client);

    let mut registry = default_registry();
    config.select_collectors(&mut registry)?;
    let aggregator = Aggregator::new(&registry, api)?;

    // One health component per enabled collector
    let health_registry = HealthRegistry::new();
    for name in aggregator.collector_names() {
        health_registry.register(name).await;
    }
    info!(
        collectors = ?aggregator.collector_names().collect::<Vec<_>>(),
        "Collectors enabled"
    );

    let app_state = Arc::new(api::AppState::new(aggregator, health_registry.clone()));

    // Mark exporter as ready after initialization
    health_registry.set_ready(true).await;

    let server = tokio::spawn(api::serve(config.listen_port, app_state));

    tokio::select! {
        result = server => {
            match result {
                Ok(Ok(())) => info!("API server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    return Err(e);
                }
                Err(e) => {
                    error!(error = %e, "API server task failed");
                    return Err(e.into());
                }
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("SIGINT received, shutting down");
        }
    }

    Ok(())
}
