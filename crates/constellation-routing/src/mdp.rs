//! Markov decision process formulation for per-satellite routing.
//!
//! - State: (latency to destination, own congestion)
//! - Actions: visible satellites below the congestion ceiling
//! - Reward: latency + congestion penalties of the next hop, minus the relay
//!   penalty, plus the arrival bonus

use crate::config::{RewardParams, RoutingConfig, Thresholds};
use crate::node::Satellite;
use crate::topology::Topology;
use serde::{Deserialize, Serialize};

/// Three-way discretization shared by latency and congestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn from_distance(distance_km: f64, thresholds: &Thresholds) -> Self {
        match distance_km {
            d if d <= thresholds.delay_low_km => Level::Low,
            d if d <= thresholds.delay_medium_km => Level::Medium,
            _ => Level::High,
        }
    }

    pub fn from_connections(connections: u32, thresholds: &Thresholds) -> Self {
        match connections {
            c if c <= thresholds.congestion_low => Level::Low,
            c if c <= thresholds.congestion_medium => Level::Medium,
            _ => Level::High,
        }
    }

    pub fn penalty(self, rewards: &RewardParams) -> f64 {
        match self {
            Level::Low => rewards.low,
            Level::Medium => rewards.medium,
            Level::High => rewards.high,
        }
    }
}

/// Q-learning state of a satellite relative to a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    pub latency: Level,
    pub congestion: Level,
}

pub fn congestion(sat: &Satellite, thresholds: &Thresholds) -> Level {
    Level::from_connections(sat.active_connections, thresholds)
}

/// State of `satellites[node]` with respect to `destination`.
pub fn state(
    satellites: &[Satellite],
    topology: &Topology,
    node: usize,
    destination: usize,
    thresholds: &Thresholds,
) -> State {
    State {
        latency: topology.latency(node, destination),
        congestion: congestion(&satellites[node], thresholds),
    }
}

/// Legal next hops from `node`: visible and below the congestion ceiling.
pub fn possible_actions(
    satellites: &[Satellite],
    topology: &Topology,
    node: usize,
    thresholds: &Thresholds,
) -> Vec<usize> {
    topology
        .visible_from(node)
        .filter(|&b| satellites[b].active_connections < thresholds.congestion_ceiling)
        .collect()
}

/// Reward for moving into a satellite whose state is `next_state`.
pub fn reward(next_state: State, is_final: bool, config: &RoutingConfig) -> f64 {
    let rewards = &config.rewards;
    let mut total =
        next_state.latency.penalty(rewards) + next_state.congestion.penalty(rewards) - rewards.relay_penalty;
    if is_final {
        total += rewards.final_bonus;
    }
    total
}
