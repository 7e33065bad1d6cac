//! Shared infrastructure for CityRun HTTP services.
//!
//! - [`AppState`]: road network and graph store loaded once at startup
//! - [`ServiceConfig`]: environment-driven configuration
//! - [`health()`], [`health_live`], [`health_ready`]: health endpoints
//! - [`ApiError`]: JSON error bodies and status mapping
//! - [`RouteResponse`]: success envelope
//! - [`ScoreRouteRequest`]: request body with validation
//! - [`metrics`], [`logging`], [`middleware`]: observability
//!
//! Handlers stay thin; the recommendation logic lives in `cityrun-lib`:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  axum handler                                │
//! │  - decode JSON, validate                     │
//! │  - cityrun_lib::recommend on a blocking task │
//! │  - RouteResponse or ApiError                 │
//! └──────────────────────────────────────────────┘
//! ```

#![deny(warnings)]

pub mod config;
mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod request;
mod response;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::ServiceConfig;
pub use health::{health, health_live, health_ready, HealthCheck, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use crate::metrics::{
    init_metrics, metrics_handler, record_distance_ratio, record_route_failed,
    record_route_recommended, record_via_candidates, MetricsConfig, MetricsError,
};
pub use middleware::{extract_or_generate_request_id, MetricsLayer, RequestId, REQUEST_ID_HEADER};
pub use problem::{
    from_lib_error, ApiError, OutlierDetail, INVALID_INPUT_MESSAGE, OUTLIER_ERROR_CODE,
    OUTLIER_MESSAGE,
};
pub use request::{ScoreRouteRequest, Validate};
pub use response::{timestamp_now, RouteResponse};
pub use state::{AppState, AppStateError, NetworkSummary};
