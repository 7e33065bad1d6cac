use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::graph::{EdgeId, VertexId};

/// Convenient result alias for the CityRun library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested distance or origin coordinate is malformed.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// No road vertex lies close enough to the requested origin.
    #[error("no road vertex found near origin ({lat}, {lng})")]
    NoStartNode { lat: f64, lng: f64 },

    /// The half-distance search from the start vertex reached nothing.
    #[error("no via candidates found for a {distance_km}km loop")]
    NoViaCandidates { distance_km: f64 },

    /// Every via candidate failed to produce a usable loop.
    #[error("no loop route could be built for a {distance_km}km target")]
    NoLoopRoute { distance_km: f64 },

    /// The best loop exists but falls outside the sanity bounds.
    #[error(
        "best loop rejected as outlier (distance ratio {distance_ratio:.2}, \
         {crosswalks} crosswalks, {max_crosswalks_allowed} allowed)"
    )]
    OutlierRoute {
        distance_ratio: f64,
        crosswalks: u32,
        max_crosswalks_allowed: f64,
    },

    /// The graph store timed out or could not be reached.
    #[error("graph store unavailable: {message}")]
    UpstreamUnavailable { message: String },

    /// The caller abandoned the request before the search finished.
    #[error("recommendation cancelled")]
    Cancelled,

    /// Road network database could not be located.
    #[error("road network not found at {path}")]
    DatasetNotFound { path: PathBuf },

    /// Road network database lacks a required table.
    #[error("unsupported road network schema; missing table {table}")]
    UnsupportedSchema { table: &'static str },

    /// An edge or query referenced a vertex that is not in the network.
    #[error("unknown vertex {vertex}")]
    UnknownVertex { vertex: VertexId },

    /// Edge attributes violate the network invariants.
    #[error("invalid edge {edge}: {message}")]
    InvalidEdge { edge: EdgeId, message: String },

    /// The same edge identifier was added twice.
    #[error("duplicate edge {edge}")]
    DuplicateEdge { edge: EdgeId },

    /// Stored edge geometry could not be decoded.
    #[error("invalid geometry for edge {edge}: {message}")]
    InvalidGeometry { edge: EdgeId, message: String },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification used for HTTP mapping and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NoStartNode,
    NoViaCandidates,
    NoLoopRoute,
    OutlierRoute,
    UpstreamUnavailable,
    Cancelled,
    Internal,
}

impl ErrorKind {
    /// Stable snake_case label.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NoStartNode => "no_start_node",
            ErrorKind::NoViaCandidates => "no_via_candidates",
            ErrorKind::NoLoopRoute => "no_loop_route",
            ErrorKind::OutlierRoute => "outlier_route",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::UpstreamUnavailable`].
    pub fn upstream(message: impl Into<String>) -> Self {
        Error::UpstreamUnavailable {
            message: message.into(),
        }
    }

    /// Classify this error.
    ///
    /// SQLite failures while serving are connection-level problems, so they
    /// count as upstream unavailability rather than internal bugs.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput { .. } => ErrorKind::InvalidInput,
            Error::NoStartNode { .. } => ErrorKind::NoStartNode,
            Error::NoViaCandidates { .. } => ErrorKind::NoViaCandidates,
            Error::NoLoopRoute { .. } => ErrorKind::NoLoopRoute,
            Error::OutlierRoute { .. } => ErrorKind::OutlierRoute,
            Error::UpstreamUnavailable { .. } | Error::Sqlite(_) => {
                ErrorKind::UpstreamUnavailable
            }
            Error::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Internal,
        }
    }
}
