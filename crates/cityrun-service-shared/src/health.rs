//! Health check handlers.
//!
//! - `GET /health`: `{"status":"OK","timestamp":"..."}`
//! - `GET /health/live`: process is up
//! - `GET /health/ready`: road network loaded (503 when empty)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::response::timestamp_now;
use crate::AppState;

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub timestamp: String,
}

impl HealthCheck {
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
            timestamp: timestamp_now(),
        }
    }
}

/// Probe status for liveness and readiness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// "ok" or "not_ready: <reason>".
    pub status: String,

    pub service: String,

    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertices_loaded: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges_loaded: Option<usize>,
}

impl HealthStatus {
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            vertices_loaded: None,
            edges_loaded: None,
        }
    }

    pub fn ready(service: &str, version: &str, vertices: usize, edges: usize) -> Self {
        Self {
            vertices_loaded: Some(vertices),
            edges_loaded: Some(edges),
            ..Self::alive(service, version)
        }
    }

    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            ..Self::alive(service, version)
        }
    }
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthCheck::ok()))
}

/// Liveness probe; never touches the road network.
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness probe.
///
/// ```text
/// GET /health/ready
/// {"status":"ok","service":"cityrun-service-shared","version":"0.1.0",
///  "vertices_loaded":121,"edges_loaded":220}
/// ```
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    let summary = state.summary();

    if summary.vertices == 0 || summary.edges == 0 {
        let status = HealthStatus::not_ready(service, version, "road network is empty");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response();
    }

    let status = HealthStatus::ready(service, version, summary.vertices, summary.edges);
    (StatusCode::OK, Json(status)).into_response()
}
