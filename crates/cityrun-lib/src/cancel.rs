//! Cooperative cancellation of a running recommendation.
//!
//! A [`CancelToken`] is shared between the caller and the search. Once it is
//! cancelled, every further graph-store call fails with [`Error::Cancelled`],
//! so the remaining candidate evaluations drain without touching the graph.
//! A call already in flight finishes under its own query deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cost::CostModel;
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::graph::{RoadEdge, VertexId};
use crate::store::{GraphStore, ReachableVertex};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err(Error::Cancelled)` once the token has been cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Guard that cancels this token when dropped.
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop(self.clone())
    }
}

/// Cancels its token on drop, including when the owning future is dropped.
#[derive(Debug)]
pub struct CancelOnDrop(CancelToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// [`GraphStore`] adapter that refuses new queries once cancelled.
pub(crate) struct CancellableStore<'a> {
    inner: &'a dyn GraphStore,
    token: &'a CancelToken,
}

impl<'a> CancellableStore<'a> {
    pub(crate) fn new(inner: &'a dyn GraphStore, token: &'a CancelToken) -> Self {
        Self { inner, token }
    }
}

impl GraphStore for CancellableStore<'_> {
    fn nearest_vertex(&self, point: Coordinate) -> Result<Option<VertexId>> {
        self.token.check()?;
        self.inner.nearest_vertex(point)
    }

    fn one_to_many_distance(
        &self,
        from: VertexId,
        budget: f64,
        cost: &CostModel,
    ) -> Result<Vec<ReachableVertex>> {
        self.token.check()?;
        self.inner.one_to_many_distance(from, budget, cost)
    }

    fn shortest_path(
        &self,
        from: VertexId,
        to: VertexId,
        cost: &CostModel,
    ) -> Result<Option<Vec<RoadEdge>>> {
        self.token.check()?;
        self.inner.shortest_path(from, to, cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());

        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(Error::Cancelled)));
    }

    #[test]
    fn guard_cancels_on_drop() {
        let token = CancelToken::new();
        {
            let _guard = token.drop_guard();
            assert!(!token.is_cancelled());
        }
        assert!(token.is_cancelled());
    }
}
