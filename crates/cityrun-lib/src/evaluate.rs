//! Out-and-back loop construction and scoring for a single via candidate.

use tracing::trace;

use crate::cost::CostModel;
use crate::error::Result;
use crate::geo::RouteGeometry;
use crate::graph::{EdgeId, RoadEdge, VertexId};
use crate::store::GraphStore;

/// A closed loop start -> via -> start with aggregate metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopRoute {
    pub via: VertexId,
    /// Sum of edge lengths over both legs; edges used twice count twice.
    pub total_distance_m: f64,
    pub total_crossing_count: u32,
    /// One line part per traversed edge, out leg first.
    pub geometry: RouteGeometry,
    /// Selection score; lower is better.
    pub score: f64,
    /// Traversed edge ids in order.
    pub edges: Vec<EdgeId>,
}

impl LoopRoute {
    pub fn distance_ratio(&self, target_distance_m: f64) -> f64 {
        self.total_distance_m / target_distance_m
    }
}

/// Score of a loop. Without crossing avoidance this is the absolute
/// distance error; with it every crossing adds `lambda` virtual metres.
pub fn loop_score(
    total_distance_m: f64,
    total_crossing_count: u32,
    target_distance_m: f64,
    avoid_crossings: bool,
    lambda: f64,
) -> f64 {
    let distance_error = (total_distance_m - target_distance_m).abs();
    if avoid_crossings {
        distance_error + f64::from(total_crossing_count) * lambda
    } else {
        distance_error
    }
}

/// Build and score the loop through `via`.
///
/// The out leg (`start -> via`) and back leg (`via -> start`) are separate
/// searches under the same cost, so they may use different streets. Returns
/// `Ok(None)` when either leg is unreachable or the loop has no length.
pub fn evaluate_loop(
    store: &dyn GraphStore,
    start: VertexId,
    via: VertexId,
    target_distance_m: f64,
    cost: &CostModel,
    lambda: f64,
) -> Result<Option<LoopRoute>> {
    let Some(out_leg) = store.shortest_path(start, via, cost)? else {
        trace!(start, via, "out leg unreachable");
        return Ok(None);
    };
    let Some(back_leg) = store.shortest_path(via, start, cost)? else {
        trace!(start, via, "back leg unreachable");
        return Ok(None);
    };

    let total_distance_m: f64 = out_leg
        .iter()
        .chain(back_leg.iter())
        .map(|edge| edge.length_m)
        .sum();
    if total_distance_m <= 0.0 {
        return Ok(None);
    }
    let total_crossing_count: u32 = out_leg
        .iter()
        .chain(back_leg.iter())
        .map(|edge| edge.crossing_count)
        .fold(0u32, u32::saturating_add);

    let mut geometry = RouteGeometry::new();
    append_leg(&mut geometry, start, &out_leg);
    append_leg(&mut geometry, via, &back_leg);

    let edges = out_leg
        .iter()
        .chain(back_leg.iter())
        .map(|edge| edge.id)
        .collect();

    Ok(Some(LoopRoute {
        via,
        total_distance_m,
        total_crossing_count,
        geometry,
        score: loop_score(
            total_distance_m,
            total_crossing_count,
            target_distance_m,
            cost.avoids_crossings(),
            lambda,
        ),
        edges,
    }))
}

/// Append each edge's polyline oriented in the direction it is walked.
fn append_leg(geometry: &mut RouteGeometry, from: VertexId, leg: &[RoadEdge]) {
    let mut current = from;
    for edge in leg {
        if edge.source == current {
            geometry.push_line(&edge.geometry);
        } else {
            let reversed: Vec<_> = edge.geometry.iter().rev().copied().collect();
            geometry.push_line(&reversed);
        }
        current = edge.other_end(current).unwrap_or(edge.target);
    }
}
