//! Shared helpers for integration tests: hand-built street networks and a
//! store wrapper that records which queries were issued.

use std::sync::atomic::{AtomicUsize, Ordering};

use cityrun_lib::{
    Coordinate, CostModel, GraphStore, InMemoryGraphStore, ReachableVertex, Result, RoadEdge,
    RoadNetwork, VertexId,
};

/// Seoul City Hall.
#[allow(dead_code)]
pub const SEOUL: Coordinate = Coordinate {
    lat: 37.5665,
    lng: 126.978,
};

/// Small network described by vertex offsets (metres from [`SEOUL`]) and
/// streets with explicit lengths and crossing counts.
pub struct Streets {
    network: RoadNetwork,
    next_edge: i64,
}

#[allow(dead_code)]
impl Streets {
    pub fn new() -> Self {
        Self {
            network: RoadNetwork::new(),
            next_edge: 100,
        }
    }

    pub fn vertex(mut self, id: VertexId, north_m: f64, east_m: f64) -> Self {
        self.network.add_vertex(id, SEOUL.offset_m(north_m, east_m));
        self
    }

    pub fn street(mut self, a: VertexId, b: VertexId, length_m: f64, crossings: u32) -> Self {
        self.network
            .add_edge(RoadEdge {
                id: self.next_edge,
                source: a,
                target: b,
                length_m,
                crossing_count: crossings,
                geometry: Vec::new(),
            })
            .expect("street endpoints exist");
        self.next_edge += 1;
        self
    }

    pub fn store(self) -> InMemoryGraphStore {
        InMemoryGraphStore::new(self.network)
    }
}

/// Per-query call counters around another store.
pub struct CountingStore<S> {
    pub inner: S,
    pub nearest_calls: AtomicUsize,
    pub one_to_many_calls: AtomicUsize,
    pub shortest_path_calls: AtomicUsize,
}

#[allow(dead_code)]
impl<S: GraphStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            nearest_calls: AtomicUsize::new(0),
            one_to_many_calls: AtomicUsize::new(0),
            shortest_path_calls: AtomicUsize::new(0),
        }
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.nearest_calls.load(Ordering::SeqCst),
            self.one_to_many_calls.load(Ordering::SeqCst),
            self.shortest_path_calls.load(Ordering::SeqCst),
        )
    }
}

impl<S: GraphStore> GraphStore for CountingStore<S> {
    fn nearest_vertex(&self, point: Coordinate) -> Result<Option<VertexId>> {
        self.nearest_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.nearest_vertex(point)
    }

    fn one_to_many_distance(
        &self,
        from: VertexId,
        budget: f64,
        cost: &CostModel,
    ) -> Result<Vec<ReachableVertex>> {
        self.one_to_many_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.one_to_many_distance(from, budget, cost)
    }

    fn shortest_path(
        &self,
        from: VertexId,
        to: VertexId,
        cost: &CostModel,
    ) -> Result<Option<Vec<RoadEdge>>> {
        self.shortest_path_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.shortest_path(from, to, cost)
    }
}
