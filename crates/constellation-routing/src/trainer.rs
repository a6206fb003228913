//! Episodic Q-learning trainer.
//!
//! Each episode walks from the start satellite toward the destination,
//! choosing hops epsilon-greedily and updating the current satellite's table
//! before moving. Tables accumulate across episodes; the path of the final
//! episode is the trained route.

use crate::config::{ConnectionReset, RoutingConfig};
use crate::mdp::{possible_actions, reward, state};
use crate::node::Satellite;
use crate::policy::choose_action;
use crate::topology::Topology;
use crate::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeOutcome {
    /// The path ends at the destination
    Reached,
    /// A satellite on the path had no legal next hop
    DeadEnd,
    /// The hop budget ran out first
    StepBudgetExceeded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Satellite indices from start to wherever the episode stopped
    pub path: Vec<usize>,
    pub outcome: EpisodeOutcome,
}

/// Result of a training call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Path of the final episode
    pub path: Vec<usize>,
    /// Outcome of the final episode, `None` if no episode ran
    pub outcome: Option<EpisodeOutcome>,
    pub episodes: usize,
    pub successful_episodes: usize,
    /// Hop count of every episode, in order
    pub hop_counts: Vec<usize>,
}

impl TrainingReport {
    pub fn reached(&self) -> bool {
        self.outcome == Some(EpisodeOutcome::Reached)
    }
}

/// Run one episode from `start` to `end`.
///
/// Every hop holds one connection on both of its endpoints until the episode
/// ends; with `ConnectionReset::PerEpisode` those links are then released.
pub fn run_episode<R: Rng>(
    satellites: &mut [Satellite],
    topology: &Topology,
    start: usize,
    end: usize,
    config: &RoutingConfig,
    rng: &mut R,
) -> Episode {
    let thresholds = &config.thresholds;
    let mut current = start;
    let mut path = vec![start];
    let mut held_links = Vec::new();

    let outcome = loop {
        if current == end {
            break EpisodeOutcome::Reached;
        }
        if held_links.len() >= config.max_steps {
            warn!(
                start,
                end,
                max_steps = config.max_steps,
                "Max steps exceeded in episode"
            );
            break EpisodeOutcome::StepBudgetExceeded;
        }

        let state_current = state(satellites, topology, current, end, thresholds);
        let actions = possible_actions(satellites, topology, current, thresholds);
        let Some(next) = choose_action(
            &satellites[current].q_table,
            state_current,
            &actions,
            config.learning.epsilon,
            rng,
        ) else {
            debug!(node = current, hops = held_links.len(), "Dead end, terminating episode");
            break EpisodeOutcome::DeadEnd;
        };

        satellites[current].active_connections += 1;
        satellites[next].active_connections += 1;
        held_links.push((current, next));

        let is_final = next == end;
        let state_next = state(satellites, topology, next, end, thresholds);
        let r = reward(state_next, is_final, config);

        let next_actions = possible_actions(satellites, topology, next, thresholds);
        // Bootstrap from this satellite's own table over the next hop's legal set
        let table = &mut satellites[current].q_table;
        let max_next = table.max_value(state_next, &next_actions);
        table.update(state_current, next, r, max_next, &config.learning);

        current = next;
        path.push(next);
    };

    if config.connection_reset == ConnectionReset::PerEpisode {
        for (a, b) in held_links {
            satellites[a].active_connections = satellites[a].active_connections.saturating_sub(1);
            satellites[b].active_connections = satellites[b].active_connections.saturating_sub(1);
        }
    }

    Episode { path, outcome }
}

/// Train for `episodes` episodes and return the final episode's path.
pub fn train<R: Rng>(
    satellites: &mut [Satellite],
    topology: &Topology,
    start: usize,
    end: usize,
    episodes: usize,
    config: &RoutingConfig,
    rng: &mut R,
) -> Result<TrainingReport> {
    topology.check_matches(satellites)?;
    topology.check_index(start)?;
    topology.check_index(end)?;

    if config.connection_reset == ConnectionReset::PerTraining {
        satellites.iter_mut().for_each(Satellite::reset_connections);
    }

    info!(start, end, episodes, "Starting Q-learning training");

    let mut path = vec![start];
    let mut outcome = None;
    let mut successful_episodes = 0;
    let mut hop_counts = Vec::with_capacity(episodes);

    for i in 0..episodes {
        let episode = run_episode(satellites, topology, start, end, config, rng);
        let hops = episode.path.len() - 1;

        debug!(episode = i + 1, of = episodes, hops, outcome = ?episode.outcome);

        if episode.outcome == EpisodeOutcome::Reached {
            successful_episodes += 1;
        }
        hop_counts.push(hops);
        path = episode.path;
        outcome = Some(episode.outcome);
    }

    info!(?path, successful_episodes, "Training complete");

    Ok(TrainingReport {
        path,
        outcome,
        episodes,
        successful_episodes,
        hop_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoutingError;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn equator(lons: &[f64]) -> Vec<Satellite> {
        lons.iter().map(|lon| Satellite::new(*lon, 0.0, 0.0, 0.0)).collect()
    }

    fn chain() -> (Vec<Satellite>, Topology) {
        // 0 sees 1, 1 sees 2, 0 does not see 2
        let mut sats = equator(&[0.0, 70.0, 140.0]);
        let topology = Topology::precompute(&mut sats, &RoutingConfig::default());
        (sats, topology)
    }

    fn ring(step_deg: f64) -> Vec<Satellite> {
        let n = (360.0 / step_deg) as usize;
        equator(&(0..n).map(|i| i as f64 * step_deg).collect::<Vec<_>>())
    }

    #[test]
    fn test_chain_never_skips_missing_edge() {
        for episodes in [1, 5, 50, 500] {
            let (mut sats, topology) = chain();
            let mut rng = ChaCha8Rng::seed_from_u64(episodes as u64);
            let config = RoutingConfig::default();

            let report = train(&mut sats, &topology, 0, 2, episodes, &config, &mut rng).unwrap();

            assert_eq!(&report.path[..2], &[0, 1]);
            assert!(report.path.windows(2).all(|w| topology.is_visible(w[0], w[1])));
            assert!(report.reached(), "episodes={} path={:?}", episodes, report.path);
        }
    }

    #[test]
    fn test_chain_greedy_converges_to_direct_route() {
        for episodes in [20, 100, 1000] {
            let (mut sats, topology) = chain();
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            let config = RoutingConfig::default().with_epsilon(0.0);

            let report = train(&mut sats, &topology, 0, 2, episodes, &config, &mut rng).unwrap();
            assert_eq!(report.path, vec![0, 1, 2]);
            assert_eq!(report.outcome, Some(EpisodeOutcome::Reached));
        }
    }

    #[test]
    fn test_q_tables_accumulate() {
        let (mut sats, topology) = chain();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = RoutingConfig::default();

        train(&mut sats, &topology, 0, 2, 10, &config, &mut rng).unwrap();
        let learned = sats[1].q_table.len();
        assert!(learned > 0);

        train(&mut sats, &topology, 0, 2, 10, &config, &mut rng).unwrap();
        assert!(sats[1].q_table.len() >= learned);
    }

    #[test]
    fn test_start_equals_end() {
        let (mut sats, topology) = chain();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let report = train(&mut sats, &topology, 1, 1, 5, &RoutingConfig::default(), &mut rng).unwrap();

        assert_eq!(report.path, vec![1]);
        assert_eq!(report.successful_episodes, 5);
        assert!(sats.iter().all(|s| s.q_table.is_empty()));
    }

    #[test]
    fn test_dead_end() {
        let mut sats = equator(&[0.0, 180.0]);
        let topology = Topology::precompute(&mut sats, &RoutingConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let report = train(&mut sats, &topology, 0, 1, 3, &RoutingConfig::default(), &mut rng).unwrap();
        assert_eq!(report.path, vec![0]);
        assert_eq!(report.outcome, Some(EpisodeOutcome::DeadEnd));
        assert_eq!(report.successful_episodes, 0);
    }

    #[test]
    fn test_step_budget() {
        let mut config = RoutingConfig::default();
        config.max_steps = 3;
        config.connection_reset = ConnectionReset::PerEpisode;

        // Destination is out of everyone's sight
        let mut sats = equator(&[0.0, 20.0, 40.0, 200.0]);
        let topology = Topology::precompute(&mut sats, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let episode = run_episode(&mut sats, &topology, 0, 3, &config, &mut rng);
        assert_eq!(episode.outcome, EpisodeOutcome::StepBudgetExceeded);
        assert_eq!(episode.path.len(), 4);
    }

    #[test]
    fn test_connection_reset_per_episode_restores_baseline() {
        let (mut sats, topology) = chain();
        sats[1].active_connections = 1;
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        train(&mut sats, &topology, 0, 2, 25, &RoutingConfig::default(), &mut rng).unwrap();
        assert_eq!(
            sats.iter().map(|s| s.active_connections).collect::<Vec<_>>(),
            vec![0, 1, 0]
        );
    }

    #[test]
    fn test_connection_reset_never_accumulates_load() {
        let (mut sats, topology) = chain();
        let mut config = RoutingConfig::default().with_epsilon(0.0);
        config.connection_reset = ConnectionReset::Never;
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let report = train(&mut sats, &topology, 0, 2, 10, &config, &mut rng).unwrap();
        // Node 1 saturates, after which node 0 has nowhere to go
        assert_eq!(report.outcome, Some(EpisodeOutcome::DeadEnd));
        assert!(sats[1].active_connections >= config.thresholds.congestion_ceiling);
    }

    #[test]
    fn test_connection_reset_per_training_clears_leftover_load() {
        let (mut sats, topology) = chain();
        let mut config = RoutingConfig::default().with_epsilon(0.0);
        config.connection_reset = ConnectionReset::PerTraining;
        sats[1].active_connections = 50;
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let report = train(&mut sats, &topology, 0, 2, 1, &config, &mut rng).unwrap();
        assert_eq!(report.path.first(), Some(&0));
        assert!(report.path.len() > 1);
    }

    #[test]
    fn test_update_bootstraps_from_own_table() {
        let (mut sats, topology) = chain();
        let mut config = RoutingConfig::default().with_epsilon(0.0);
        config.max_steps = 1;
        config.connection_reset = ConnectionReset::Never;
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let s0 = state(&sats, &topology, 0, 2, &config.thresholds);
        // Node 1 after the single hop 0 -> 1
        sats[1].active_connections = 1;
        let s_next = state(&sats, &topology, 1, 2, &config.thresholds);
        sats[1].active_connections = 0;

        sats[1].q_table.set(s_next, 2, 40.0);
        sats[0].q_table.set(s_next, 0, -8.0);
        sats[0].q_table.set(s_next, 2, -6.0);

        let episode = run_episode(&mut sats, &topology, 0, 2, &config, &mut rng);
        assert_eq!(episode.path, vec![0, 1]);
        assert_eq!(episode.outcome, EpisodeOutcome::StepBudgetExceeded);

        let r = reward(s_next, false, &config);
        let expected = config.learning.alpha * (r + config.learning.gamma * -6.0);
        assert!((sats[0].q_table.get(s0, 1) - expected).abs() < 1e-12);
        assert_eq!(sats[1].q_table.get(s_next, 2), 40.0);
    }

    #[test]
    fn test_ring_training_follows_line_of_sight() {
        let mut sats = ring(20.0);
        let config = RoutingConfig::default();
        let topology = Topology::precompute(&mut sats, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(2024);

        let report = train(&mut sats, &topology, 0, 9, 1500, &config, &mut rng).unwrap();

        assert_eq!(report.hop_counts.len(), 1500);
        assert!(report.successful_episodes > 0);
        assert_eq!(report.path.first(), Some(&0));
        assert!(report.path.windows(2).all(|w| topology.is_visible(w[0], w[1])));
    }

    #[test]
    fn test_seeded_training_is_deterministic() {
        let run = || {
            let mut sats = ring(20.0);
            let config = RoutingConfig::default();
            let topology = Topology::precompute(&mut sats, &config);
            let mut rng = ChaCha8Rng::seed_from_u64(77);
            train(&mut sats, &topology, 0, 9, 200, &config, &mut rng).unwrap()
        };

        let (a, b) = (run(), run());
        assert_eq!(a.path, b.path);
        assert_eq!(a.hop_counts, b.hop_counts);
    }

    #[test]
    fn test_rejects_bad_indices() {
        let (mut sats, topology) = chain();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = train(&mut sats, &topology, 0, 3, 1, &RoutingConfig::default(), &mut rng).unwrap_err();
        assert!(matches!(err, RoutingError::IndexOutOfRange { index: 3, len: 3 }));
    }

    #[test]
    fn test_zero_episodes() {
        let (mut sats, topology) = chain();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let report = train(&mut sats, &topology, 0, 2, 0, &RoutingConfig::default(), &mut rng).unwrap();
        assert_eq!(report.path, vec![0]);
        assert_eq!(report.outcome, None);
    }
}
