//! Loop recommendation orchestrator.
//!
//! [`recommend`] runs the full pipeline for one request: snap the origin to
//! the road graph, pick turn-around candidates near half the target
//! distance, build and score an out-and-back loop through each of them,
//! keep the best one and reject it if it is an outlier. Candidate loops are
//! independent of each other and are evaluated on the rayon pool; results
//! are collected in candidate order so selection stays deterministic.
//!
//! [`recommend_with_cancel`] takes a [`CancelToken`]; once it is cancelled
//! no further graph queries are issued and the call returns
//! [`Error::Cancelled`].

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cancel::{CancelToken, CancellableStore};
use crate::candidates::find_via_candidates;
use crate::config::RecommendConfig;
use crate::cost::CostModel;
use crate::error::{Error, ErrorKind, Result};
use crate::evaluate::{evaluate_loop, LoopRoute};
use crate::geo::{Coordinate, RouteGeometry};
use crate::graph::VertexId;
use crate::select::{check_outlier, select_best};
use crate::store::GraphStore;

/// Elevation gain is not computed; always reported as zero.
pub const UPHILL_METERS_PLACEHOLDER: f64 = 0.0;

/// Night-safety score placeholder. Not computed from the route.
pub const NIGHT_SCORE_PLACEHOLDER: u32 = 70;

/// Crowd-level score placeholder. Not computed from the route.
pub const CROWD_SCORE_PLACEHOLDER: u32 = 60;

/// Caller preferences. Only `minimize_crosswalks` influences routing; the
/// other toggles are accepted so clients can send them unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub minimize_crosswalks: bool,
    pub avoid_uphill: bool,
    pub avoid_crowds: bool,
}

/// A loop request in library terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendRequest {
    pub distance_km: f64,
    pub origin: Coordinate,
    pub preferences: Preferences,
}

impl RecommendRequest {
    pub fn new(distance_km: f64, origin: Coordinate, preferences: Preferences) -> Self {
        Self {
            distance_km,
            origin,
            preferences,
        }
    }

    pub fn target_distance_m(&self) -> f64 {
        self.distance_km * 1000.0
    }

    pub fn validate(&self) -> Result<()> {
        if !self.distance_km.is_finite() || self.distance_km <= 0.0 {
            return Err(Error::invalid_input(format!(
                "distanceKm must be a positive number, got {}",
                self.distance_km
            )));
        }
        self.origin.validate()
    }
}

/// Route returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecommendation {
    pub distance_meters: f64,
    pub crosswalk_count: u32,
    pub uphill_meters: f64,
    /// Selection score of the loop; lower is better.
    pub final_score: f64,
    /// Display rating in `[0, 100]`; higher is better.
    pub quality_score: f64,
    pub night_score: u32,
    pub crowd_score: u32,
    pub name: String,
    pub geometry: RouteGeometry,
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub dest_lat: f64,
    pub dest_lng: f64,
}

impl RouteRecommendation {
    fn from_loop(route: LoopRoute, request: &RecommendRequest) -> Self {
        let origin = request.origin;
        Self {
            distance_meters: route.total_distance_m,
            crosswalk_count: route.total_crossing_count,
            uphill_meters: UPHILL_METERS_PLACEHOLDER,
            final_score: route.score,
            quality_score: quality_score(
                route.total_distance_m,
                route.total_crossing_count,
                request.target_distance_m(),
            ),
            night_score: NIGHT_SCORE_PLACEHOLDER,
            crowd_score: CROWD_SCORE_PLACEHOLDER,
            name: route_name(request.distance_km),
            geometry: route.geometry,
            origin_lat: origin.lat,
            origin_lng: origin.lng,
            dest_lat: origin.lat,
            dest_lng: origin.lng,
        }
    }
}

/// A successful recommendation plus the search context behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub route: RouteRecommendation,
    pub start_vertex: VertexId,
    pub via_vertex: VertexId,
    pub distance_ratio: f64,
    pub candidates_evaluated: usize,
}

impl Recommendation {
    pub fn message(&self) -> String {
        format!(
            "Loop route from node {} via node {}",
            self.start_vertex, self.via_vertex
        )
    }
}

/// `"Loop course (5.0 km target)"`
pub fn route_name(distance_km: f64) -> String {
    format!("Loop course ({distance_km:.1} km target)")
}

/// 0-100 rating: half a point per percent of distance error, one point per
/// crossing.
pub fn quality_score(total_distance_m: f64, crossings: u32, target_distance_m: f64) -> f64 {
    let relative_error = (total_distance_m - target_distance_m).abs() / target_distance_m;
    (100.0 - relative_error * 50.0 - f64::from(crossings)).max(0.0)
}

/// Recommend a loop for `request` against `store`.
pub fn recommend(
    store: &dyn GraphStore,
    request: &RecommendRequest,
    config: &RecommendConfig,
) -> Result<Recommendation> {
    recommend_with_cancel(store, request, config, &CancelToken::new())
}

/// [`recommend`] that stops querying `store` once `cancel` is cancelled.
pub fn recommend_with_cancel(
    store: &dyn GraphStore,
    request: &RecommendRequest,
    config: &RecommendConfig,
    cancel: &CancelToken,
) -> Result<Recommendation> {
    request.validate()?;

    let guarded = CancellableStore::new(store, cancel);
    let store: &dyn GraphStore = &guarded;

    let start = store
        .nearest_vertex(request.origin)?
        .ok_or(Error::NoStartNode {
            lat: request.origin.lat,
            lng: request.origin.lng,
        })?;

    let target_distance_m = request.target_distance_m();
    let candidates =
        find_via_candidates(store, start, target_distance_m, config.candidate_via_limit)?;

    let cost = CostModel::for_preferences(&request.preferences, config);
    let outcomes: Vec<(VertexId, Result<Option<LoopRoute>>)> = candidates
        .par_iter()
        .map(|candidate| {
            let outcome = evaluate_loop(
                store,
                start,
                candidate.vertex,
                target_distance_m,
                &cost,
                config.crossing_lambda,
            );
            (candidate.vertex, outcome)
        })
        .collect();
    cancel.check()?;

    let candidates_evaluated = outcomes.len();
    let mut routes = Vec::with_capacity(outcomes.len());
    let mut first_error = None;
    let mut upstream_failures = 0usize;
    for (via, outcome) in outcomes {
        match outcome {
            Ok(Some(route)) => {
                debug!(
                    via,
                    distance_m = route.total_distance_m,
                    crossings = route.total_crossing_count,
                    score = route.score,
                    "evaluated loop"
                );
                routes.push(route);
            }
            Ok(None) => debug!(via, "no loop through candidate"),
            Err(err) => {
                warn!(via, error = %err, "skipping candidate after evaluation error");
                if err.kind() == ErrorKind::UpstreamUnavailable {
                    upstream_failures += 1;
                }
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    if routes.is_empty() && upstream_failures == candidates_evaluated {
        if let Some(err) = first_error {
            return Err(err);
        }
    }

    let best = select_best(routes, request.distance_km)?;
    check_outlier(&best, target_distance_m, request.distance_km, config)?;

    let via_vertex = best.via;
    let distance_ratio = best.distance_ratio(target_distance_m);
    info!(
        start,
        via = via_vertex,
        distance_m = best.total_distance_m,
        crossings = best.total_crossing_count,
        score = best.score,
        distance_ratio,
        candidates_evaluated,
        "recommended loop"
    );

    Ok(Recommendation {
        route: RouteRecommendation::from_loop(best, request),
        start_vertex: start,
        via_vertex,
        distance_ratio,
        candidates_evaluated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_parse_camel_case_with_defaults() {
        let prefs: Preferences = serde_json::from_str(r#"{"minimizeCrosswalks":true}"#).unwrap();
        assert!(prefs.minimize_crosswalks);
        assert!(!prefs.avoid_uphill);

        let empty: Preferences = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, Preferences::default());
    }

    #[test]
    fn validate_rejects_bad_distance_and_origin() {
        let origin = Coordinate::new(37.5665, 126.978);
        let prefs = Preferences::default();
        assert!(RecommendRequest::new(5.0, origin, prefs).validate().is_ok());
        assert!(RecommendRequest::new(0.0, origin, prefs).validate().is_err());
        assert!(RecommendRequest::new(-1.0, origin, prefs).validate().is_err());
        assert!(RecommendRequest::new(f64::NAN, origin, prefs).validate().is_err());
        assert!(RecommendRequest::new(5.0, Coordinate::new(95.0, 0.0), prefs)
            .validate()
            .is_err());
    }

    #[test]
    fn quality_score_is_clamped() {
        assert_eq!(quality_score(5_000.0, 0, 5_000.0), 100.0);
        assert_eq!(quality_score(5_500.0, 3, 5_000.0), 92.0);
        assert_eq!(quality_score(20_000.0, 90, 5_000.0), 0.0);
    }

    #[test]
    fn name_embeds_target_distance() {
        assert_eq!(route_name(5.0), "Loop course (5.0 km target)");
        assert_eq!(route_name(3.26), "Loop course (3.3 km target)");
    }
}
