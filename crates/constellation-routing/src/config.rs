//! Tuning constants for state discretization, learning and rewards.
//!
//! Every value has a default matching the reference constellation study, so
//! a partial JSON file only overrides what it names.

use crate::{Result, RoutingError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Discretization thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// Max distance (km) for `low` latency
    pub delay_low_km: f64,
    /// Max distance (km) for `medium` latency, anything above is `high`
    pub delay_medium_km: f64,
    /// Max active connections for `low` congestion
    pub congestion_low: u32,
    /// Max active connections for `medium` congestion, anything above is `high`
    pub congestion_medium: u32,
    /// A node at or above this many connections accepts no new relay
    pub congestion_ceiling: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            delay_low_km: 1000.0,
            delay_medium_km: 5000.0,
            congestion_low: 1,
            congestion_medium: 3,
            congestion_ceiling: 5,
        }
    }
}

/// Q-learning hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LearningParams {
    /// Learning rate α
    pub alpha: f64,
    /// Discount factor γ
    pub gamma: f64,
    /// Exploration rate ε
    pub epsilon: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            alpha: 0.50,
            gamma: 0.95,
            epsilon: 0.10,
        }
    }
}

/// Reward shaping. Penalties are negative, the arrival bonus is the only
/// positive term.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RewardParams {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    /// Subtracted on every hop
    pub relay_penalty: f64,
    /// Added when the chosen hop is the destination
    pub final_bonus: f64,
}

impl Default for RewardParams {
    fn default() -> Self {
        Self {
            low: -1.0,
            medium: -5.0,
            high: -10.0,
            relay_penalty: 1.0,
            final_bonus: 100.0,
        }
    }
}

/// When the simulated relay load on each node is cleared.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionReset {
    /// Links held by an episode are released when it ends
    #[default]
    PerEpisode,
    /// Load accumulates across episodes, cleared when a training call starts
    PerTraining,
    /// The engine never clears load; the caller owns it
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoutingConfig {
    pub thresholds: Thresholds,
    pub learning: LearningParams,
    pub rewards: RewardParams,
    /// Half-angle of the line-of-sight cone (degrees)
    pub visibility_cone_deg: f64,
    /// Hop budget per episode
    pub max_steps: usize,
    /// Episodes per training call when the caller has no preference
    pub episodes: usize,
    pub connection_reset: ConnectionReset,
    /// Exploration seed; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            learning: LearningParams::default(),
            rewards: RewardParams::default(),
            visibility_cone_deg: 75.0,
            max_steps: 10_000,
            episodes: 3000,
            connection_reset: ConnectionReset::PerEpisode,
            seed: None,
        }
    }
}

impl RoutingConfig {
    /// Load and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: RoutingConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.learning.epsilon = epsilon;
        self
    }

    pub fn with_episodes(mut self, episodes: usize) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(RoutingError::InvalidConfig(msg));
        let l = &self.learning;
        let t = &self.thresholds;

        for (name, value) in [("alpha", l.alpha), ("gamma", l.gamma), ("epsilon", l.epsilon)] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if !(t.delay_low_km >= 0.0 && t.delay_low_km <= t.delay_medium_km) {
            return invalid(format!(
                "delay thresholds must satisfy 0 <= low <= medium, got {} / {}",
                t.delay_low_km, t.delay_medium_km
            ));
        }
        if t.congestion_low > t.congestion_medium {
            return invalid(format!(
                "congestion thresholds must satisfy low <= medium, got {} / {}",
                t.congestion_low, t.congestion_medium
            ));
        }
        if t.congestion_ceiling == 0 {
            return invalid("congestion ceiling must be non-zero".to_string());
        }
        if !(self.visibility_cone_deg > 0.0 && self.visibility_cone_deg <= 180.0) {
            return invalid(format!(
                "visibility cone must be within (0, 180], got {}",
                self.visibility_cone_deg
            ));
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be non-zero".to_string());
        }
        Ok(())
    }
}
