use serde::Serialize;
use tracing::debug;

use crate::cost::CostModel;
use crate::error::{Error, Result};
use crate::graph::VertexId;
use crate::store::GraphStore;

/// A turn-around vertex and its walking distance from the start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViaCandidate {
    pub vertex: VertexId,
    pub agg_cost: f64,
}

/// Turn-around vertices near half of `target_distance_m`, best first.
///
/// Reachability is measured by length alone so the candidate set does not
/// depend on the caller's preferences. At most `limit` distinct vertices are
/// returned, ordered by `|agg_cost - target/2|` and then by vertex id. The
/// start vertex is never a candidate.
pub fn find_via_candidates(
    store: &dyn GraphStore,
    start: VertexId,
    target_distance_m: f64,
    limit: usize,
) -> Result<Vec<ViaCandidate>> {
    let half = target_distance_m / 2.0;
    let reachable = store.one_to_many_distance(start, half, &CostModel::length_only())?;

    let mut candidates: Vec<ViaCandidate> = reachable
        .into_iter()
        .filter(|reached| reached.vertex != start)
        .map(|reached| ViaCandidate {
            vertex: reached.vertex,
            agg_cost: reached.agg_cost,
        })
        .collect();

    if candidates.is_empty() {
        return Err(Error::NoViaCandidates {
            distance_km: target_distance_m / 1000.0,
        });
    }

    candidates.sort_by(|a, b| {
        (a.agg_cost - half)
            .abs()
            .total_cmp(&(b.agg_cost - half).abs())
            .then_with(|| a.vertex.cmp(&b.vertex))
    });
    candidates.dedup_by_key(|candidate| candidate.vertex);
    candidates.truncate(limit);

    debug!(
        start,
        half_distance_m = half,
        count = candidates.len(),
        "selected via candidates"
    );
    Ok(candidates)
}
