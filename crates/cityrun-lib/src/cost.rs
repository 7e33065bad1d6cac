//! Edge cost model.
//!
//! Routing searches never see SQL or strings: they receive a [`CostModel`]
//! and call [`CostModel::cost`] per edge. The same cost is used in both
//! directions because the network is routed as undirected.

use crate::config::RecommendConfig;
use crate::graph::RoadEdge;
use crate::recommend::Preferences;

/// Per-edge routing cost derived from the caller's preferences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    crossing_penalty_m: Option<f64>,
}

impl CostModel {
    /// Pure length cost, used for candidate discovery.
    pub fn length_only() -> Self {
        Self {
            crossing_penalty_m: None,
        }
    }

    /// Length plus a fixed penalty per crossing feature.
    pub fn with_crossing_penalty(penalty_m: f64) -> Self {
        Self {
            crossing_penalty_m: Some(penalty_m),
        }
    }

    pub fn for_preferences(preferences: &Preferences, config: &RecommendConfig) -> Self {
        if preferences.minimize_crosswalks {
            Self::with_crossing_penalty(config.crosswalk_penalty_m)
        } else {
            Self::length_only()
        }
    }

    pub fn avoids_crossings(&self) -> bool {
        self.crossing_penalty_m.is_some()
    }

    pub fn cost(&self, edge: &RoadEdge) -> f64 {
        match self.crossing_penalty_m {
            Some(penalty) => edge.length_m + f64::from(edge.crossing_count) * penalty,
            None => edge.length_m,
        }
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::length_only()
    }
}
