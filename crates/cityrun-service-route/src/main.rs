//! CityRun loop route HTTP microservice.
//!
//! See [`cityrun_service_shared::config`] for the environment variables.

use std::net::SocketAddr;

use tracing::{error, info};

use cityrun_service_route::app;
use cityrun_service_shared::{
    init_logging, init_metrics, AppState, LoggingConfig, MetricsConfig, ServiceConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&LoggingConfig::from_env().with_service("route"));

    if let Err(e) = init_metrics(&MetricsConfig::from_env()) {
        tracing::warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let config = ServiceConfig::from_env();
    info!(
        data_path = %config.data_path.display(),
        port = config.port,
        query_timeout_ms = config.query_timeout.as_millis() as u64,
        request_timeout_ms = config.request_timeout.as_millis() as u64,
        "starting route service"
    );

    let state = AppState::load(&config.data_path, &config).map_err(|e| {
        error!(error = %e, path = %config.data_path.display(), "failed to load application state");
        e
    })?;

    let summary = state.summary();
    info!(
        vertices = summary.vertices,
        edges = summary.edges,
        "application state loaded"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
