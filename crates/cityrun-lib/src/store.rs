//! Graph Query Layer consumed by the recommender.
//!
//! [`GraphStore`] is the seam between the loop search and whatever holds the
//! road network. The recommender only ever asks three questions: which vertex
//! is nearest to a point, what is reachable within a cost budget, and what is
//! the cheapest path between two vertices. Cost functions are passed as a
//! typed [`CostModel`], never as query text.
//!
//! [`InMemoryGraphStore`] answers those questions from a [`RoadNetwork`]
//! loaded at startup and shared read-only across requests.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::trace;

use crate::cost::CostModel;
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::graph::{RoadEdge, RoadNetwork, VertexId};
use crate::path::{driving_distance, shortest_path, SearchLimits};
use crate::spatial::VertexIndex;

/// Default snapping radius for origins.
pub const DEFAULT_MAX_SNAP_DISTANCE_M: f64 = 1_000.0;

/// Default budget for a single store call.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// A vertex reached by a one-to-many search and its aggregated cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReachableVertex {
    pub vertex: VertexId,
    pub agg_cost: f64,
}

/// Read-only road-graph queries.
///
/// Implementations must be safe to call concurrently from several threads.
pub trait GraphStore: Send + Sync {
    /// Closest vertex to `point`, or `None` when nothing is close enough.
    fn nearest_vertex(&self, point: Coordinate) -> Result<Option<VertexId>>;

    /// Vertices reachable from `from` with aggregated cost `<= budget`,
    /// including `from` itself at cost zero.
    fn one_to_many_distance(
        &self,
        from: VertexId,
        budget: f64,
        cost: &CostModel,
    ) -> Result<Vec<ReachableVertex>>;

    /// Ordered edges of the cheapest path, or `None` when unreachable.
    fn shortest_path(
        &self,
        from: VertexId,
        to: VertexId,
        cost: &CostModel,
    ) -> Result<Option<Vec<RoadEdge>>>;
}

/// [`GraphStore`] backed by an in-process [`RoadNetwork`].
#[derive(Debug)]
pub struct InMemoryGraphStore {
    network: RoadNetwork,
    index: VertexIndex,
    max_snap_distance_m: f64,
    query_timeout: Duration,
}

impl InMemoryGraphStore {
    pub fn new(network: RoadNetwork) -> Self {
        let index = VertexIndex::build(&network);
        Self {
            network,
            index,
            max_snap_distance_m: DEFAULT_MAX_SNAP_DISTANCE_M,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_max_snap_distance(mut self, meters: f64) -> Self {
        self.max_snap_distance_m = meters;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    pub fn max_snap_distance_m(&self) -> f64 {
        self.max_snap_distance_m
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    fn limits(&self) -> SearchLimits {
        match Instant::now().checked_add(self.query_timeout) {
            Some(deadline) => SearchLimits::with_deadline(deadline),
            None => SearchLimits::unbounded(),
        }
    }
}

impl GraphStore for InMemoryGraphStore {
    fn nearest_vertex(&self, point: Coordinate) -> Result<Option<VertexId>> {
        let nearest = self
            .index
            .nearest(&point)
            .filter(|(_, distance)| *distance <= self.max_snap_distance_m);
        trace!(?nearest, "nearest vertex lookup");
        Ok(nearest.map(|(vertex, _)| vertex))
    }

    fn one_to_many_distance(
        &self,
        from: VertexId,
        budget: f64,
        cost: &CostModel,
    ) -> Result<Vec<ReachableVertex>> {
        let reached = driving_distance(&self.network, from, budget, cost, &self.limits())?;
        Ok(reached
            .into_iter()
            .map(|(vertex, agg_cost)| ReachableVertex { vertex, agg_cost })
            .collect())
    }

    fn shortest_path(
        &self,
        from: VertexId,
        to: VertexId,
        cost: &CostModel,
    ) -> Result<Option<Vec<RoadEdge>>> {
        let Some(edge_ids) = shortest_path(&self.network, from, to, cost, &self.limits())? else {
            return Ok(None);
        };

        let edges = edge_ids
            .into_iter()
            .map(|id| {
                self.network.edge(id).cloned().ok_or_else(|| Error::InvalidEdge {
                    edge: id,
                    message: "edge vanished from the network".to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(edges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_store() -> InMemoryGraphStore {
        let origin = Coordinate::new(37.5665, 126.978);
        let mut network = RoadNetwork::new();
        network.add_vertex(1, origin);
        network.add_vertex(2, origin.offset_m(0.0, 100.0));
        network.add_vertex(3, origin.offset_m(0.0, 200.0));
        for (id, source, target) in [(10, 1, 2), (11, 2, 3)] {
            network
                .add_edge(RoadEdge {
                    id,
                    source,
                    target,
                    length_m: 100.0,
                    crossing_count: 1,
                    geometry: Vec::new(),
                })
                .unwrap();
        }
        InMemoryGraphStore::new(network)
    }

    #[test]
    fn nearest_vertex_honours_snap_radius() {
        let store = line_store().with_max_snap_distance(50.0);
        let origin = Coordinate::new(37.5665, 126.978);

        assert_eq!(store.nearest_vertex(origin.offset_m(20.0, 0.0)).unwrap(), Some(1));
        assert_eq!(store.nearest_vertex(origin.offset_m(500.0, 0.0)).unwrap(), None);
    }

    #[test]
    fn one_to_many_includes_start() {
        let store = line_store();
        let reached = store
            .one_to_many_distance(1, 150.0, &CostModel::length_only())
            .unwrap();
        assert_eq!(
            reached,
            vec![
                ReachableVertex { vertex: 1, agg_cost: 0.0 },
                ReachableVertex { vertex: 2, agg_cost: 100.0 },
            ]
        );
    }

    #[test]
    fn shortest_path_returns_edge_records() {
        let store = line_store();
        let edges = store
            .shortest_path(3, 1, &CostModel::length_only())
            .unwrap()
            .expect("connected");
        let ids: Vec<_> = edges.iter().map(|edge| edge.id).collect();
        assert_eq!(ids, vec![11, 10]);
        assert!(edges.iter().all(|edge| edge.crossing_count == 1));
    }

    #[test]
    fn zero_timeout_maps_to_upstream_unavailable() {
        let store = line_store().with_query_timeout(Duration::ZERO);
        let err = store
            .shortest_path(1, 3, &CostModel::length_only())
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable { .. }));
    }
}
