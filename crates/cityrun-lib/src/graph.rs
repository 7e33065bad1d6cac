use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::geo::Coordinate;

/// Identifier of a road-network vertex (`ways_vertices_pgr.id`).
pub type VertexId = i64;

/// Identifier of a road segment (`ways.gid`).
pub type EdgeId = i64;

/// Junction or end point in the road network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    pub position: Coordinate,
}

/// Road segment with the attributes the cost model and scorer need.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadEdge {
    pub id: EdgeId,
    pub source: VertexId,
    pub target: VertexId,
    /// Physical length in metres (>= 0).
    pub length_m: f64,
    /// Crosswalks and signalised crossings attached to this segment.
    pub crossing_count: u32,
    /// Ordered polyline from `source` to `target`.
    pub geometry: Vec<Coordinate>,
}

impl RoadEdge {
    /// The endpoint opposite to `from`, if `from` is an endpoint of this edge.
    pub fn other_end(&self, from: VertexId) -> Option<VertexId> {
        if from == self.source {
            Some(self.target)
        } else if from == self.target {
            Some(self.source)
        } else {
            None
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Adjacency entry: the edge to follow and the vertex it leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub edge: EdgeId,
    pub target: VertexId,
}

/// In-memory road graph used by the search primitives.
///
/// Every edge is traversable in both directions at the same cost.
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    vertices: HashMap<VertexId, Vertex>,
    edges: HashMap<EdgeId, RoadEdge>,
    adjacency: HashMap<VertexId, Vec<Link>>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a vertex.
    pub fn add_vertex(&mut self, id: VertexId, position: Coordinate) {
        self.vertices.insert(id, Vertex { id, position });
        self.adjacency.entry(id).or_default();
    }

    /// Insert an edge between two known vertices.
    ///
    /// An empty `geometry` is replaced by the straight segment between the
    /// endpoints.
    pub fn add_edge(&mut self, mut edge: RoadEdge) -> Result<()> {
        if self.edges.contains_key(&edge.id) {
            return Err(Error::DuplicateEdge { edge: edge.id });
        }
        if !edge.length_m.is_finite() || edge.length_m < 0.0 {
            return Err(Error::InvalidEdge {
                edge: edge.id,
                message: format!("length {} must be a finite non-negative number", edge.length_m),
            });
        }
        let source = self
            .vertices
            .get(&edge.source)
            .ok_or(Error::UnknownVertex { vertex: edge.source })?
            .position;
        let target = self
            .vertices
            .get(&edge.target)
            .ok_or(Error::UnknownVertex { vertex: edge.target })?
            .position;

        if edge.geometry.len() < 2 {
            edge.geometry = vec![source, target];
        }

        if !edge.is_self_loop() {
            self.adjacency.entry(edge.source).or_default().push(Link {
                edge: edge.id,
                target: edge.target,
            });
            self.adjacency.entry(edge.target).or_default().push(Link {
                edge: edge.id,
                target: edge.source,
            });
        }
        self.edges.insert(edge.id, edge);
        Ok(())
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&RoadEdge> {
        self.edges.get(&id)
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    /// Links leaving `vertex` in either direction.
    pub fn links(&self, vertex: VertexId) -> &[Link] {
        self.adjacency
            .get(&vertex)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &RoadEdge> {
        self.edges.values()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}
