//! Envelope for successful responses.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Current UTC time as RFC 3339 with milliseconds, e.g. `2025-01-01T09:30:00.000Z`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `{"route": ..., "message": ..., "timestamp": ...}`
///
/// ```
/// use cityrun_service_shared::RouteResponse;
///
/// let response = RouteResponse::new(42, "Loop route from node 1 via node 2");
/// assert!(response.timestamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse<T> {
    pub route: T,
    pub message: String,
    pub timestamp: String,
}

impl<T> RouteResponse<T> {
    pub fn new(route: T, message: impl Into<String>) -> Self {
        Self {
            route,
            message: message.into(),
            timestamp: timestamp_now(),
        }
    }
}

impl<T: Serialize> IntoResponse for RouteResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
