//! Tunable constants for loop recommendation.

/// Virtual metres added to an edge's routing cost per crossing feature.
pub const CROSSWALK_PENALTY_M: f64 = 150.0;

/// Maximum number of turn-around candidates evaluated per request.
pub const CANDIDATE_VIA_LIMIT: usize = 15;

/// Score penalty per crossing on a finished loop when crossings are avoided.
pub const CROSSING_LAMBDA: f64 = 200.0;

/// Smallest accepted realised/requested distance ratio (inclusive).
pub const VIA_DISTANCE_RATIO_MIN: f64 = 0.6;

/// Largest accepted realised/requested distance ratio (inclusive).
pub const VIA_DISTANCE_RATIO_MAX: f64 = 1.7;

/// Crossing features allowed per requested kilometre (inclusive).
pub const MAX_CROSSWALKS_PER_KM: f64 = 12.0;

/// Settings consumed by [`crate::recommend`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendConfig {
    pub crosswalk_penalty_m: f64,
    pub candidate_via_limit: usize,
    pub crossing_lambda: f64,
    pub min_distance_ratio: f64,
    pub max_distance_ratio: f64,
    pub max_crosswalks_per_km: f64,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            crosswalk_penalty_m: CROSSWALK_PENALTY_M,
            candidate_via_limit: CANDIDATE_VIA_LIMIT,
            crossing_lambda: CROSSING_LAMBDA,
            min_distance_ratio: VIA_DISTANCE_RATIO_MIN,
            max_distance_ratio: VIA_DISTANCE_RATIO_MAX,
            max_crosswalks_per_km: MAX_CROSSWALKS_PER_KM,
        }
    }
}

impl RecommendConfig {
    /// Crossing budget for a request of `distance_km`.
    pub fn max_crosswalks_allowed(&self, distance_km: f64) -> f64 {
        distance_km * self.max_crosswalks_per_km
    }
}
