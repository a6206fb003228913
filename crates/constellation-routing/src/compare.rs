//! Learned route vs. flood baseline metrics.

use crate::flood::Edge;
use crate::topology::Topology;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathStats {
    /// Sum of precomputed pairwise distances along the route (km)
    pub distance_km: f64,
    /// Satellites used by the route
    pub hop_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub learned: PathStats,
    pub baseline: PathStats,
}

/// Comparison plus the routes it was computed from, for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub learned_path: Vec<usize>,
    pub flood_edges: Vec<Edge>,
    pub comparison: Comparison,
    pub generated_at: DateTime<Utc>,
}

impl ComparisonReport {
    pub fn new(learned_path: Vec<usize>, flood_edges: Vec<Edge>, comparison: Comparison) -> Self {
        Self {
            learned_path,
            flood_edges,
            comparison,
            generated_at: Utc::now(),
        }
    }
}

/// Compute distance and node count for both routes.
///
/// The flood trail counts every satellite it touched: one per edge plus the
/// origin.
pub fn compare(topology: &Topology, learned_path: &[usize], flood_edges: &[Edge]) -> Result<Comparison> {
    for &index in learned_path {
        topology.check_index(index)?;
    }
    for edge in flood_edges {
        topology.check_index(edge.from)?;
        topology.check_index(edge.to)?;
    }

    let learned = PathStats {
        distance_km: topology.path_distance_km(learned_path),
        hop_count: learned_path.len(),
    };
    let baseline = PathStats {
        distance_km: flood_edges.iter().map(|e| topology.distance_km(e.from, e.to)).sum(),
        hop_count: if flood_edges.is_empty() { 0 } else { flood_edges.len() + 1 },
    };

    Ok(Comparison { learned, baseline })
}
