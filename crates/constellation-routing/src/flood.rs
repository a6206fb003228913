//! Flood baseline: breadth-first signal propagation over line of sight.

use crate::config::Thresholds;
use crate::mdp::possible_actions;
use crate::node::Satellite;
use crate::topology::Topology;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// A relay discovered by the flood, parent → child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
}

/// Flood from `start` until `end` is first discovered.
///
/// Returns every edge formed in discovery order, stopping at the one that
/// reaches `end`. Empty when `start == end`; the full spanning trail of the
/// reachable component when `end` is unreachable.
pub fn flood(
    satellites: &[Satellite],
    topology: &Topology,
    start: usize,
    end: usize,
    thresholds: &Thresholds,
) -> Result<Vec<Edge>> {
    topology.check_matches(satellites)?;
    topology.check_index(start)?;
    topology.check_index(end)?;

    let mut edges = Vec::new();
    if start == end {
        return Ok(edges);
    }

    let mut visited = vec![false; topology.len()];
    let mut queue = VecDeque::new();
    visited[start] = true;
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for next in possible_actions(satellites, topology, current, thresholds) {
            if visited[next] {
                continue;
            }
            visited[next] = true;
            edges.push(Edge { from: current, to: next });
            trace!(from = current, to = next, "Flood relay");

            if next == end {
                debug!(start, end, relays = edges.len(), "Flood reached destination");
                return Ok(edges);
            }
            queue.push_back(next);
        }
    }

    debug!(start, end, relays = edges.len(), "Flood exhausted without reaching destination");
    Ok(edges)
}

/// Walk parent links back from `end` to recover the route the flood found.
pub fn route_from_edges(edges: &[Edge], end: usize) -> Vec<usize> {
    let Some(last) = edges.last() else {
        return Vec::new();
    };
    if last.to != end {
        return Vec::new();
    }

    let mut route = vec![end];
    let mut current = end;
    while let Some(edge) = edges.iter().find(|e| e.to == current) {
        current = edge.from;
        route.push(current);
    }
    route.reverse();
    route
}
