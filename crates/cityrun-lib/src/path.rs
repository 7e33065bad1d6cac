use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

use crate::cost::CostModel;
use crate::error::{Error, Result};
use crate::graph::{EdgeId, RoadNetwork, VertexId};

/// How many queue pops happen between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 1024;

/// Bounds applied to a single search.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    /// Abort with [`Error::UpstreamUnavailable`] once this instant passes.
    pub deadline: Option<Instant>,
}

impl SearchLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    fn check(&self, pops: usize, search: &str) -> Result<()> {
        if pops % DEADLINE_CHECK_INTERVAL != 0 {
            return Ok(());
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::upstream(format!(
                "{search} query exceeded its time budget"
            ))),
            _ => Ok(()),
        }
    }
}

/// Lowest-cost path between two vertices as an ordered list of edges.
///
/// Returns `Some(vec![])` when `from == to` and `None` when `to` is
/// unreachable.
pub fn shortest_path(
    network: &RoadNetwork,
    from: VertexId,
    to: VertexId,
    cost: &CostModel,
    limits: &SearchLimits,
) -> Result<Option<Vec<EdgeId>>> {
    ensure_vertex(network, from)?;
    ensure_vertex(network, to)?;

    if from == to {
        return Ok(Some(Vec::new()));
    }

    let mut distances: HashMap<VertexId, f64> = HashMap::new();
    let mut parents: HashMap<VertexId, (VertexId, EdgeId)> = HashMap::new();
    let mut queue = BinaryHeap::new();
    let mut pops = 0usize;

    distances.insert(from, 0.0);
    queue.push(QueueEntry::new(from, 0.0));

    while let Some(entry) = queue.pop() {
        limits.check(pops, "shortest path")?;
        pops += 1;

        let current = entry.cost.0;
        if current > *distances.get(&entry.node).unwrap_or(&f64::INFINITY) {
            continue;
        }

        if entry.node == to {
            return Ok(Some(reconstruct_edges(&parents, from, to)));
        }

        for link in network.links(entry.node) {
            let Some(edge) = network.edge(link.edge) else {
                continue;
            };
            let next_cost = current + cost.cost(edge);
            if next_cost < *distances.get(&link.target).unwrap_or(&f64::INFINITY) {
                distances.insert(link.target, next_cost);
                parents.insert(link.target, (entry.node, link.edge));
                queue.push(QueueEntry::new(link.target, next_cost));
            }
        }
    }

    Ok(None)
}

/// Every vertex whose aggregated cost from `from` is within `budget`,
/// including `from` itself at cost zero. Sorted by cost, then vertex id.
pub fn driving_distance(
    network: &RoadNetwork,
    from: VertexId,
    budget: f64,
    cost: &CostModel,
    limits: &SearchLimits,
) -> Result<Vec<(VertexId, f64)>> {
    ensure_vertex(network, from)?;

    let mut distances: HashMap<VertexId, f64> = HashMap::new();
    let mut settled: Vec<(VertexId, f64)> = Vec::new();
    let mut queue = BinaryHeap::new();
    let mut pops = 0usize;

    distances.insert(from, 0.0);
    queue.push(QueueEntry::new(from, 0.0));

    while let Some(entry) = queue.pop() {
        limits.check(pops, "driving distance")?;
        pops += 1;

        let current = entry.cost.0;
        match distances.get(&entry.node) {
            Some(best) if current > *best => continue,
            _ => {}
        }
        if current > budget {
            break;
        }
        settled.push((entry.node, current));

        for link in network.links(entry.node) {
            let Some(edge) = network.edge(link.edge) else {
                continue;
            };
            let next_cost = current + cost.cost(edge);
            if next_cost > budget {
                continue;
            }
            if next_cost < *distances.get(&link.target).unwrap_or(&f64::INFINITY) {
                distances.insert(link.target, next_cost);
                queue.push(QueueEntry::new(link.target, next_cost));
            }
        }
    }

    // Equal-cost duplicates can be pushed before the first one settles.
    settled.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    settled.dedup_by_key(|(vertex, _)| *vertex);
    Ok(settled)
}

fn ensure_vertex(network: &RoadNetwork, vertex: VertexId) -> Result<()> {
    if network.contains_vertex(vertex) {
        Ok(())
    } else {
        Err(Error::UnknownVertex { vertex })
    }
}

fn reconstruct_edges(
    parents: &HashMap<VertexId, (VertexId, EdgeId)>,
    start: VertexId,
    goal: VertexId,
) -> Vec<EdgeId> {
    let mut edges = Vec::new();
    let mut current = goal;
    while current != start {
        let Some(&(previous, edge)) = parents.get(&current) else {
            break;
        };
        edges.push(edge);
        current = previous;
    }
    edges.reverse();
    edges
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: VertexId,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: VertexId, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
