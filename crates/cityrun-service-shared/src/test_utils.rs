//! Fixtures for handler tests.
//!
//! States are built from synthetic street grids, so no database file is
//! needed. Enable the `test-utils` feature to use them from other crates.

use std::sync::OnceLock;

use cityrun_lib::{Coordinate, GridBuilder, RoadNetwork};

use crate::config::ServiceConfig;
use crate::state::AppState;

/// Centre of the fixture grid (Seoul City Hall).
pub const GRID_ORIGIN: Coordinate = Coordinate {
    lat: 37.5665,
    lng: 126.978,
};

/// An origin hundreds of kilometres from the grid.
pub const FAR_ORIGIN: Coordinate = Coordinate {
    lat: 35.1796,
    lng: 129.0756,
};

static TEST_STATE: OnceLock<AppState> = OnceLock::new();

/// The default 11x11 grid with 250 m blocks and no crossings.
pub fn grid_builder() -> GridBuilder {
    GridBuilder::new(GRID_ORIGIN)
}

/// Shared state over [`grid_builder`]'s network.
///
/// # Panics
///
/// Panics if the grid cannot be built, which indicates a broken fixture.
pub fn test_state() -> AppState {
    TEST_STATE
        .get_or_init(|| {
            let network = grid_builder()
                .build()
                .unwrap_or_else(|e| panic!("failed to build fixture grid: {}", e));
            AppState::from_network(network, &ServiceConfig::default())
        })
        .clone()
}

/// State over an arbitrary network with default configuration.
pub fn state_for(network: RoadNetwork) -> AppState {
    AppState::from_network(network, &ServiceConfig::default())
}

/// A single vertex at [`GRID_ORIGIN`] with no streets.
pub fn isolated_state() -> AppState {
    let mut network = RoadNetwork::new();
    network.add_vertex(1, GRID_ORIGIN);
    state_for(network)
}

pub fn test_request_id() -> String {
    format!("test-{}", uuid::Uuid::now_v7())
}
