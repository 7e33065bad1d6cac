//! Request bodies and validation for HTTP endpoints.

use cityrun_lib::{Coordinate, Preferences, RecommendRequest};
use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Validation for request bodies that passed JSON decoding.
///
/// Returns a boxed `ApiError` to keep `Result::Err` small.
pub trait Validate {
    fn validate(&self) -> Result<(), Box<ApiError>>;
}

/// Body of `POST /score-route`.
///
/// ```json
/// {"distanceKm": 5.0, "origin": [37.5665, 126.978], "prefs": {"minimizeCrosswalks": true}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRouteRequest {
    pub distance_km: f64,

    /// `[lat, lng]`
    pub origin: Vec<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefs: Option<Preferences>,
}

impl ScoreRouteRequest {
    /// The origin as a coordinate, when it has exactly two components.
    pub fn origin_coordinate(&self) -> Option<Coordinate> {
        match self.origin.as_slice() {
            [lat, lng] => Some(Coordinate::new(*lat, *lng)),
            _ => None,
        }
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs.unwrap_or_default()
    }

    /// Validate and convert into the library request.
    pub fn into_recommend_request(self) -> Result<RecommendRequest, Box<ApiError>> {
        self.validate()?;
        let origin = self
            .origin_coordinate()
            .ok_or_else(|| Box::new(ApiError::invalid_input()))?;
        Ok(RecommendRequest::new(
            self.distance_km,
            origin,
            self.preferences(),
        ))
    }
}

impl Validate for ScoreRouteRequest {
    fn validate(&self) -> Result<(), Box<ApiError>> {
        let origin = self
            .origin_coordinate()
            .ok_or_else(|| Box::new(ApiError::invalid_input()))?;

        RecommendRequest::new(self.distance_km, origin, self.preferences())
            .validate()
            .map_err(|_| Box::new(ApiError::invalid_input()))
    }
}
