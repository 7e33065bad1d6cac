//! JSON error bodies for the CityRun HTTP API.
//!
//! Every failure is rendered as one of three shapes:
//!
//! ```text
//! 400/404  {"error": "..."}
//! 400      {"errorCode": "OUTLIER_ROUTE", "error": "...", "detail": {...}}
//! 500      {"error": "...", "details": "..."}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cityrun_lib::{Error as LibError, ErrorKind};
use serde::{Deserialize, Serialize};

/// Message returned when the request body is not a valid loop request.
pub const INVALID_INPUT_MESSAGE: &str =
    "Invalid input: origin must be [lat, lng], distanceKm must be positive number";

/// Message returned when the best loop fails the sanity bounds.
pub const OUTLIER_MESSAGE: &str =
    "No suitable route found; please choose a different starting point";

/// Machine-readable code attached to outlier rejections.
pub const OUTLIER_ERROR_CODE: &str = "OUTLIER_ROUTE";

/// Diagnostics attached to an outlier rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierDetail {
    pub distance_ratio: f64,
    pub crosswalks: u32,
    pub max_crosswalks_allowed: f64,
}

/// Error body plus the status it is served with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<OutlierDetail>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            error_code: None,
            error: error.into(),
            detail: None,
            details: None,
        }
    }

    /// 400 with the fixed invalid-input message.
    pub fn invalid_input() -> Self {
        Self::new(StatusCode::BAD_REQUEST, INVALID_INPUT_MESSAGE)
    }

    /// 400 for an origin with no road vertex nearby.
    pub fn no_start_node() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "No road found near the starting point",
        )
    }

    /// 404 when no loop could be assembled.
    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// 400 with the `OUTLIER_ROUTE` code and diagnostics.
    pub fn outlier(distance_ratio: f64, crosswalks: u32, max_crosswalks_allowed: f64) -> Self {
        Self {
            error_code: Some(OUTLIER_ERROR_CODE.to_string()),
            detail: Some(OutlierDetail {
                distance_ratio,
                crosswalks,
                max_crosswalks_allowed,
            }),
            ..Self::new(StatusCode::BAD_REQUEST, OUTLIER_MESSAGE)
        }
    }

    /// 500 for a graph store that timed out or failed.
    pub fn upstream_unavailable(details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Route search failed")
        }
    }

    /// 500 for anything else.
    pub fn internal(details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

/// Map a library error onto its HTTP body.
pub fn from_lib_error(error: &LibError) -> ApiError {
    match error {
        LibError::InvalidInput { .. } => ApiError::invalid_input(),
        LibError::NoStartNode { .. } => ApiError::no_start_node(),
        LibError::NoViaCandidates { distance_km } => ApiError::not_found(format!(
            "No turnaround point found for a {distance_km}km loop"
        )),
        LibError::NoLoopRoute { distance_km } => ApiError::not_found(format!(
            "No loop route could be built for a {distance_km}km target"
        )),
        LibError::OutlierRoute {
            distance_ratio,
            crosswalks,
            max_crosswalks_allowed,
        } => ApiError::outlier(*distance_ratio, *crosswalks, *max_crosswalks_allowed),
        other => match other.kind() {
            ErrorKind::UpstreamUnavailable => ApiError::upstream_unavailable(other.to_string()),
            _ => ApiError::internal(other.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn body(error: &ApiError) -> Value {
        serde_json::to_value(error).unwrap()
    }

    #[test]
    fn test_invalid_input_body() {
        let error = from_lib_error(&LibError::invalid_input("distanceKm must be positive"));
        assert_eq!(error.status, 400);
        assert_eq!(body(&error), json!({ "error": INVALID_INPUT_MESSAGE }));
    }

    #[test]
    fn test_no_start_node_is_bad_request() {
        let error = from_lib_error(&LibError::NoStartNode {
            lat: 35.1796,
            lng: 129.0756,
        });
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.details.is_none());
    }

    #[test]
    fn test_missing_loop_is_not_found() {
        let no_via = from_lib_error(&LibError::NoViaCandidates { distance_km: 5.0 });
        let no_loop = from_lib_error(&LibError::NoLoopRoute { distance_km: 5.0 });
        assert_eq!(no_via.status, 404);
        assert_eq!(no_loop.status, 404);
        assert!(no_loop.error.contains("5km"));
    }

    #[test]
    fn test_outlier_body() {
        let error = from_lib_error(&LibError::OutlierRoute {
            distance_ratio: 1.8,
            crosswalks: 0,
            max_crosswalks_allowed: 60.0,
        });
        assert_eq!(error.status, 400);
        assert_eq!(
            body(&error),
            json!({
                "errorCode": "OUTLIER_ROUTE",
                "error": OUTLIER_MESSAGE,
                "detail": {
                    "distanceRatio": 1.8,
                    "crosswalks": 0,
                    "maxCrosswalksAllowed": 60.0
                }
            })
        );
    }

    #[test]
    fn test_upstream_body_carries_details() {
        let error = from_lib_error(&LibError::upstream("query exceeded 2s"));
        assert_eq!(error.status, 500);
        let value = body(&error);
        assert_eq!(value["error"], "Route search failed");
        assert!(value["details"].as_str().unwrap().contains("query exceeded 2s"));
    }

    #[test]
    fn test_other_errors_are_internal() {
        let error = from_lib_error(&LibError::DuplicateEdge { edge: 7 });
        assert_eq!(error.status, 500);
        assert_eq!(error.error, "Internal server error");
        assert_eq!(error.details.as_deref(), Some("duplicate edge 7"));
    }
}
