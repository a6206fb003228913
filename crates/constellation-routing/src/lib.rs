//! Constellation Routing Engine
//!
//! Routes traffic between two satellites of a moving constellation over a
//! time-varying line-of-sight graph, and measures the learned route against a
//! naive flood:
//!
//! - Topology precomputation (visibility, distance, latency matrices)
//! - Per-satellite tabular Q-learning over (latency, congestion) states
//! - Episodic training with simulated relay congestion
//! - Breadth-first flood baseline and route comparison
//!
//! # Example
//!
//! ```rust
//! use constellation_routing::{RoutingConfig, RoutingEngine, Satellite};
//!
//! let mut satellites: Vec<Satellite> = [0.0, 70.0, 140.0]
//!     .iter()
//!     .map(|lon| Satellite::new(*lon, 0.0, 0.0, 0.5))
//!     .collect();
//!
//! let mut engine = RoutingEngine::new(RoutingConfig::default().with_seed(7)).unwrap();
//! let report = engine.train(&mut satellites, 0, 2, 200).unwrap();
//! let edges = engine.flood(&mut satellites, 0, 2).unwrap();
//! let comparison = engine.compare(&report.path, &edges).unwrap();
//!
//! assert_eq!(comparison.baseline.hop_count, 3);
//! ```
//!
//! The engine is single-threaded. Callers that must not block use
//! [`worker::spawn_training`].

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

pub mod compare;
pub mod config;
pub mod flood;
pub mod mdp;
pub mod node;
pub mod policy;
pub mod topology;
pub mod trainer;
pub mod worker;

pub use compare::{Comparison, ComparisonReport, PathStats};
pub use config::{ConnectionReset, RoutingConfig};
pub use flood::Edge;
pub use mdp::{Level, State};
pub use node::Satellite;
pub use topology::Topology;
pub use trainer::{EpisodeOutcome, TrainingReport};

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("Constellation has no satellites")]
    EmptyConstellation,
    #[error("Satellite index {index} out of range for {len} satellites")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Topology built for {expected} satellites, constellation has {found}")]
    StaleTopology { expected: usize, found: usize },
    #[error("No topology has been precomputed")]
    NotPrecomputed,
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Training worker exited without a result")]
    WorkerLost,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Orbital(#[from] orbital_mechanics::OrbitalError),
}

pub type Result<T> = std::result::Result<T, RoutingError>;

/// Entry point for the host application.
///
/// Owns the tuning config, the exploration RNG and the topology of the most
/// recent call. Satellites stay owned by the caller and are borrowed
/// exclusively for the duration of each call.
pub struct RoutingEngine {
    config: RoutingConfig,
    rng: ChaCha8Rng,
    topology: Option<Topology>,
}

impl RoutingEngine {
    pub fn new(config: RoutingConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            config,
            rng,
            topology: None,
        })
    }

    /// Topology of the most recent precompute, train or flood call.
    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    /// Assign indices and rebuild every matrix from scratch.
    pub fn precompute(&mut self, satellites: &mut [Satellite]) -> &Topology {
        self.topology.insert(Topology::precompute(satellites, &self.config))
    }

    /// Train for `episodes` episodes; the returned path is the final episode's.
    pub fn train(
        &mut self,
        satellites: &mut [Satellite],
        start: usize,
        end: usize,
        episodes: usize,
    ) -> Result<TrainingReport> {
        if satellites.is_empty() {
            return Err(RoutingError::EmptyConstellation);
        }
        let topology = Topology::precompute(satellites, &self.config);
        let report = trainer::train(satellites, &topology, start, end, episodes, &self.config, &mut self.rng);
        self.topology = Some(topology);
        report
    }

    /// Flood baseline from `start` to `end`.
    pub fn flood(&mut self, satellites: &mut [Satellite], start: usize, end: usize) -> Result<Vec<Edge>> {
        if satellites.is_empty() {
            return Err(RoutingError::EmptyConstellation);
        }
        let topology = Topology::precompute(satellites, &self.config);
        let edges = flood::flood(satellites, &topology, start, end, &self.config.thresholds);
        self.topology = Some(topology);
        edges
    }

    /// Compare a learned path and a flood trail using the latest topology.
    pub fn compare(&self, learned_path: &[usize], flood_edges: &[Edge]) -> Result<Comparison> {
        let topology = self.topology.as_ref().ok_or(RoutingError::NotPrecomputed)?;
        compare::compare(topology, learned_path, flood_edges)
    }
}
