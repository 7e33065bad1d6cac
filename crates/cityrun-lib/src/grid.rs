//! Synthetic street grids for tests, benchmarks and local runs.

use crate::error::Result;
use crate::geo::Coordinate;
use crate::graph::{RoadEdge, RoadNetwork, VertexId};

/// Builds a rectangular street grid centred on an origin.
///
/// Vertex `(row, col)` has id `row * cols + col + 1`; rows grow northwards and
/// columns eastwards. Every block edge is exactly `spacing_m` long.
#[derive(Debug, Clone)]
pub struct GridBuilder {
    origin: Coordinate,
    rows: usize,
    cols: usize,
    spacing_m: f64,
    crossings_per_edge: u32,
    busy_rows: Vec<(usize, u32)>,
    busy_cols: Vec<(usize, u32)>,
}

impl GridBuilder {
    pub fn new(origin: Coordinate) -> Self {
        Self {
            origin,
            rows: 11,
            cols: 11,
            spacing_m: 250.0,
            crossings_per_edge: 0,
            busy_rows: Vec::new(),
            busy_cols: Vec::new(),
        }
    }

    pub fn size(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows.max(1);
        self.cols = cols.max(1);
        self
    }

    pub fn spacing_m(mut self, spacing_m: f64) -> Self {
        self.spacing_m = spacing_m;
        self
    }

    /// Crossings on every block edge not covered by a busy street.
    pub fn crossings_per_edge(mut self, crossings: u32) -> Self {
        self.crossings_per_edge = crossings;
        self
    }

    /// Give every east-west block edge on `row` this many crossings.
    pub fn busy_row(mut self, row: usize, crossings: u32) -> Self {
        self.busy_rows.push((row, crossings));
        self
    }

    /// Give every north-south block edge on `col` this many crossings.
    pub fn busy_column(mut self, col: usize, crossings: u32) -> Self {
        self.busy_cols.push((col, crossings));
        self
    }

    pub fn vertex_id(&self, row: usize, col: usize) -> VertexId {
        (row * self.cols + col + 1) as VertexId
    }

    pub fn center(&self) -> (usize, usize) {
        (self.rows / 2, self.cols / 2)
    }

    pub fn center_vertex(&self) -> VertexId {
        let (row, col) = self.center();
        self.vertex_id(row, col)
    }

    pub fn position(&self, row: usize, col: usize) -> Coordinate {
        let (center_row, center_col) = self.center();
        let north = (row as f64 - center_row as f64) * self.spacing_m;
        let east = (col as f64 - center_col as f64) * self.spacing_m;
        self.origin.offset_m(north, east)
    }

    pub fn build(&self) -> Result<RoadNetwork> {
        let mut network = RoadNetwork::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                network.add_vertex(self.vertex_id(row, col), self.position(row, col));
            }
        }

        let mut next_edge = 1;
        for row in 0..self.rows {
            for col in 0..self.cols {
                if col + 1 < self.cols {
                    let crossings = lookup(&self.busy_rows, row).unwrap_or(self.crossings_per_edge);
                    network.add_edge(self.block(next_edge, (row, col), (row, col + 1), crossings))?;
                    next_edge += 1;
                }
                if row + 1 < self.rows {
                    let crossings = lookup(&self.busy_cols, col).unwrap_or(self.crossings_per_edge);
                    network.add_edge(self.block(next_edge, (row, col), (row + 1, col), crossings))?;
                    next_edge += 1;
                }
            }
        }
        Ok(network)
    }

    fn block(
        &self,
        id: i64,
        from: (usize, usize),
        to: (usize, usize),
        crossing_count: u32,
    ) -> RoadEdge {
        RoadEdge {
            id,
            source: self.vertex_id(from.0, from.1),
            target: self.vertex_id(to.0, to.1),
            length_m: self.spacing_m,
            crossing_count,
            geometry: Vec::new(),
        }
    }
}

fn lookup(entries: &[(usize, u32)], key: usize) -> Option<u32> {
    entries
        .iter()
        .rev()
        .find(|(index, _)| *index == key)
        .map(|(_, crossings)| *crossings)
}
