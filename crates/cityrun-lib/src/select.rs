use tracing::warn;

use crate::config::RecommendConfig;
use crate::error::{Error, Result};
use crate::evaluate::LoopRoute;

/// Lowest-score loop. Routes must be given in candidate rank order; on equal
/// scores the earlier one wins.
pub fn select_best(routes: Vec<LoopRoute>, distance_km: f64) -> Result<LoopRoute> {
    routes
        .into_iter()
        .min_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or(Error::NoLoopRoute { distance_km })
}

/// Reject a selected loop whose length ratio or crossing density is out of
/// bounds. Both bounds are inclusive.
pub fn check_outlier(
    route: &LoopRoute,
    target_distance_m: f64,
    distance_km: f64,
    config: &RecommendConfig,
) -> Result<()> {
    let distance_ratio = route.distance_ratio(target_distance_m);
    let max_crosswalks_allowed = config.max_crosswalks_allowed(distance_km);

    let ratio_ok =
        distance_ratio >= config.min_distance_ratio && distance_ratio <= config.max_distance_ratio;
    let crossings_ok = f64::from(route.total_crossing_count) <= max_crosswalks_allowed;
    if ratio_ok && crossings_ok {
        return Ok(());
    }

    warn!(
        via = route.via,
        distance_ratio,
        crosswalks = route.total_crossing_count,
        max_crosswalks_allowed,
        "rejecting outlier loop"
    );
    Err(Error::OutlierRoute {
        distance_ratio,
        crosswalks: route.total_crossing_count,
        max_crosswalks_allowed,
    })
}
