//! KD-tree index used to snap coordinates to the nearest road vertex.
//!
//! Positions are projected onto the unit sphere before insertion so that
//! Euclidean nearest-neighbour in the tree is also the great-circle nearest
//! vertex. Returned distances are haversine metres.

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use tracing::debug;

use crate::geo::Coordinate;
use crate::graph::{RoadNetwork, VertexId};

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

/// Neighbours fetched per lookup so exact ties can be ordered by vertex id.
const TIE_BREAK_FETCH: usize = 4;

/// Nearest-vertex lookup over a [`RoadNetwork`].
pub struct VertexIndex {
    tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32>,
    /// Indexed vertices; tree items are offsets into this vec.
    nodes: Vec<(VertexId, Coordinate)>,
}

impl VertexIndex {
    /// Index every vertex of `network`.
    pub fn build(network: &RoadNetwork) -> Self {
        let mut nodes: Vec<(VertexId, Coordinate)> = network
            .vertices()
            .map(|vertex| (vertex.id, vertex.position))
            .collect();
        // HashMap iteration order is random; keep the tree layout stable.
        nodes.sort_by_key(|(id, _)| *id);

        let mut tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32> = KdTree::new();
        for (index, (_, position)) in nodes.iter().enumerate() {
            tree.add(&position.to_unit_vector(), index);
        }

        debug!(vertex_count = nodes.len(), "built vertex index");
        Self { tree, nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Closest vertex to `point` and its distance in metres.
    pub fn nearest(&self, point: &Coordinate) -> Option<(VertexId, f64)> {
        if self.nodes.is_empty() {
            return None;
        }

        let query = point.to_unit_vector();
        self.tree
            .nearest_n::<SquaredEuclidean>(&query, TIE_BREAK_FETCH)
            .into_iter()
            .map(|neighbour| {
                let (id, position) = self.nodes[neighbour.item];
                (id, point.distance_to(&position))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
    }
}

impl std::fmt::Debug for VertexIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexIndex")
            .field("len", &self.nodes.len())
            .finish()
    }
}
