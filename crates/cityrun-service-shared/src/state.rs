//! Application state shared by axum handlers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cityrun_lib::{
    load_road_network, Error as LibError, GraphStore, InMemoryGraphStore, RecommendConfig,
    RoadNetwork,
};

use crate::config::ServiceConfig;

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// The road network database does not exist.
    DatabaseNotFound(String),

    /// The road network could not be loaded.
    NetworkLoad(LibError),
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseNotFound(path) => write!(f, "road network not found: {}", path),
            Self::NetworkLoad(e) => write!(f, "failed to load road network: {}", e),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NetworkLoad(e) => Some(e),
            Self::DatabaseNotFound(_) => None,
        }
    }
}

impl From<LibError> for AppStateError {
    fn from(err: LibError) -> Self {
        match err {
            LibError::DatasetNotFound { path } => {
                Self::DatabaseNotFound(path.display().to_string())
            }
            other => Self::NetworkLoad(other),
        }
    }
}

/// Size of the loaded network, reported by the readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkSummary {
    pub vertices: usize,
    pub edges: usize,
}

impl NetworkSummary {
    pub fn of(network: &RoadNetwork) -> Self {
        Self {
            vertices: network.vertex_count(),
            edges: network.edge_count(),
        }
    }
}

/// Cheaply cloneable state handed to handlers through axum's `State`.
///
/// ```ignore
/// let state = AppState::load("/data/road_network.db", &ServiceConfig::from_env())?;
/// let app = Router::new()
///     .route("/score-route", post(score_route))
///     .with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn GraphStore>,
    summary: NetworkSummary,
    recommend: RecommendConfig,
    request_timeout: Duration,
}

impl AppState {
    /// Load the road network from SQLite and index it in memory.
    pub fn load(db_path: impl AsRef<Path>, config: &ServiceConfig) -> Result<Self, AppStateError> {
        let db_path = db_path.as_ref();

        if !db_path.exists() {
            return Err(AppStateError::DatabaseNotFound(
                db_path.display().to_string(),
            ));
        }

        tracing::info!(path = %db_path.display(), "loading road network");
        let network = load_road_network(db_path)?;
        tracing::info!(
            vertices = network.vertex_count(),
            edges = network.edge_count(),
            "road network loaded"
        );

        Ok(Self::from_network(network, config))
    }

    /// Wrap an already-built network (grids, fixtures).
    pub fn from_network(network: RoadNetwork, config: &ServiceConfig) -> Self {
        let summary = NetworkSummary::of(&network);
        let store = InMemoryGraphStore::new(network)
            .with_max_snap_distance(config.max_snap_distance_m)
            .with_query_timeout(config.query_timeout);
        Self::from_components(Arc::new(store), summary, config)
    }

    /// Assemble state from an arbitrary graph store.
    pub fn from_components(
        store: Arc<dyn GraphStore>,
        summary: NetworkSummary,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                summary,
                recommend: config.recommend,
                request_timeout: config.request_timeout,
            }),
        }
    }

    pub fn store(&self) -> &dyn GraphStore {
        self.inner.store.as_ref()
    }

    /// Owned handle for moving the store into a blocking task.
    pub fn store_arc(&self) -> Arc<dyn GraphStore> {
        Arc::clone(&self.inner.store)
    }

    pub fn summary(&self) -> NetworkSummary {
        self.inner.summary
    }

    pub fn recommend_config(&self) -> &RecommendConfig {
        &self.inner.recommend
    }

    pub fn request_timeout(&self) -> Duration {
        self.inner.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("vertex_count", &self.inner.summary.vertices)
            .field("edge_count", &self.inner.summary.edges)
            .field("request_timeout", &self.inner.request_timeout)
            .finish()
    }
}
