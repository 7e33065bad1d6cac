//! CityRun library entry points.
//!
//! This crate loads a road network into memory, snaps coordinates to it and
//! recommends closed running loops of a requested length. Services should
//! depend on the functions exported here instead of reimplementing the
//! search or scoring rules.
//!

#![deny(warnings)]

pub mod cancel;
pub mod candidates;
pub mod config;
pub mod cost;
pub mod db;
pub mod error;
pub mod evaluate;
pub mod geo;
pub mod graph;
pub mod grid;
pub mod path;
pub mod recommend;
pub mod select;
pub mod spatial;
pub mod store;

pub use cancel::{CancelOnDrop, CancelToken};
pub use candidates::{find_via_candidates, ViaCandidate};
pub use config::RecommendConfig;
pub use cost::CostModel;
pub use db::load_road_network;
pub use error::{Error, ErrorKind, Result};
pub use evaluate::{evaluate_loop, loop_score, LoopRoute};
pub use geo::{Coordinate, RouteGeometry};
pub use graph::{EdgeId, RoadEdge, RoadNetwork, VertexId};
pub use grid::GridBuilder;
pub use recommend::{
    recommend, recommend_with_cancel, Preferences, Recommendation, RecommendRequest,
    RouteRecommendation,
};
pub use select::{check_outlier, select_best};
pub use store::{GraphStore, InMemoryGraphStore, ReachableVertex};
