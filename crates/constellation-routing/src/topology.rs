//! All-pairs visibility, distance and latency precomputation.
//!
//! A `Topology` is a cache over one constellation snapshot. It is built once
//! per training or flood call in O(N²) and never updated incrementally: any
//! change to the node list (add, remove, reorder) requires a new precompute.

use crate::config::RoutingConfig;
use crate::mdp::Level;
use crate::node::Satellite;
use crate::{Result, RoutingError};
use orbital_mechanics::transforms::{angular_separation_deg, haversine_km};
use tracing::debug;

/// Row-major N×N matrices indexed by satellite index.
#[derive(Debug, Clone)]
pub struct Topology {
    size: usize,
    visibility: Vec<bool>,
    distance_km: Vec<f64>,
    latency: Vec<Level>,
}

impl Topology {
    /// Assign each satellite its position as index, then build all matrices.
    pub fn precompute(satellites: &mut [Satellite], config: &RoutingConfig) -> Self {
        let n = satellites.len();

        for (i, sat) in satellites.iter_mut().enumerate() {
            sat.index = i;
        }

        let positions: Vec<_> = satellites.iter().map(Satellite::cartesian).collect();

        let mut visibility = vec![false; n * n];
        let mut distance_km = vec![0.0; n * n];
        let mut latency = vec![Level::Low; n * n];

        // Both predicates are symmetric; fill the upper triangle and mirror.
        for a in 0..n {
            for b in (a + 1)..n {
                let (s1, s2) = (&satellites[a], &satellites[b]);

                let visible =
                    angular_separation_deg(&positions[a], &positions[b]) <= config.visibility_cone_deg;
                let distance = haversine_km(
                    s1.latitude,
                    s1.longitude,
                    s1.height,
                    s2.latitude,
                    s2.longitude,
                    s2.height,
                );
                let level = Level::from_distance(distance, &config.thresholds);

                for (i, j) in [(a, b), (b, a)] {
                    visibility[i * n + j] = visible;
                    distance_km[i * n + j] = distance;
                    latency[i * n + j] = level;
                }
            }
        }

        let topology = Self {
            size: n,
            visibility,
            distance_km,
            latency,
        };
        debug!(
            satellites = n,
            links = topology.link_count(),
            "Precomputed constellation topology"
        );
        topology
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn is_visible(&self, a: usize, b: usize) -> bool {
        self.visibility[a * self.size + b]
    }

    #[inline]
    pub fn distance_km(&self, a: usize, b: usize) -> f64 {
        self.distance_km[a * self.size + b]
    }

    #[inline]
    pub fn latency(&self, a: usize, b: usize) -> Level {
        self.latency[a * self.size + b]
    }

    /// Satellites visible from `a`, in index order.
    pub fn visible_from(&self, a: usize) -> impl Iterator<Item = usize> + '_ {
        let row = &self.visibility[a * self.size..(a + 1) * self.size];
        row.iter().enumerate().filter(|(_, v)| **v).map(|(b, _)| b)
    }

    /// Undirected line-of-sight links.
    pub fn link_count(&self) -> usize {
        self.visibility.iter().filter(|v| **v).count() / 2
    }

    /// Sum of pairwise distances along consecutive indices.
    pub fn path_distance_km(&self, path: &[usize]) -> f64 {
        path.windows(2).map(|w| self.distance_km(w[0], w[1])).sum()
    }

    pub fn check_index(&self, index: usize) -> Result<()> {
        if index < self.size {
            Ok(())
        } else {
            Err(RoutingError::IndexOutOfRange {
                index,
                len: self.size,
            })
        }
    }

    /// Fail if the node list changed size since this topology was built.
    pub fn check_matches(&self, satellites: &[Satellite]) -> Result<()> {
        if satellites.len() == self.size {
            Ok(())
        } else {
            Err(RoutingError::StaleTopology {
                expected: self.size,
                found: satellites.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn equator(lons: &[f64]) -> Vec<Satellite> {
        lons.iter().map(|lon| Satellite::new(*lon, 0.0, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_assigns_indices() {
        let mut sats = equator(&[0.0, 10.0, 20.0]);
        sats[2].index = 99;
        let topology = Topology::precompute(&mut sats, &RoutingConfig::default());

        assert_eq!(topology.len(), 3);
        assert_eq!(sats.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_visibility_cone() {
        let mut sats = equator(&[0.0, 70.0, 140.0]);
        let topology = Topology::precompute(&mut sats, &RoutingConfig::default());

        assert!(topology.is_visible(0, 1));
        assert!(topology.is_visible(1, 2));
        assert!(!topology.is_visible(0, 2));
        assert_eq!(topology.visible_from(1).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(topology.link_count(), 2);
    }

    #[test]
    fn test_latency_categories() {
        // ~111 km per degree on the equator
        let mut sats = equator(&[0.0, 5.0, 30.0, 90.0]);
        let topology = Topology::precompute(&mut sats, &RoutingConfig::default());

        assert_eq!(topology.latency(0, 1), Level::Low);
        assert_eq!(topology.latency(0, 2), Level::Medium);
        assert_eq!(topology.latency(0, 3), Level::High);
        assert_eq!(topology.latency(2, 2), Level::Low);
    }

    #[test]
    fn test_index_checks() {
        let mut sats = equator(&[0.0, 10.0]);
        let topology = Topology::precompute(&mut sats, &RoutingConfig::default());

        assert!(topology.check_index(1).is_ok());
        assert!(matches!(
            topology.check_index(2),
            Err(RoutingError::IndexOutOfRange { index: 2, len: 2 })
        ));

        sats.push(Satellite::new(20.0, 0.0, 0.0, 0.0));
        assert!(matches!(
            topology.check_matches(&sats),
            Err(RoutingError::StaleTopology { expected: 2, found: 3 })
        ));
    }

    fn satellite_strategy() -> impl Strategy<Value = Satellite> {
        (0.0f64..360.0, -90.0f64..=90.0, 0.0f64..1.0)
            .prop_map(|(lon, lat, h)| Satellite::new(lon, lat, h, 0.5))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn fuzz_matrices_symmetric_with_empty_diagonal(
            sats in prop::collection::vec(satellite_strategy(), 1..24)
        ) {
            let mut sats = sats;
            let topology = Topology::precompute(&mut sats, &RoutingConfig::default());
            let n = topology.len();

            for a in 0..n {
                prop_assert_eq!(topology.distance_km(a, a), 0.0);
                prop_assert!(!topology.is_visible(a, a));
                for b in 0..n {
                    prop_assert_eq!(topology.distance_km(a, b), topology.distance_km(b, a));
                    prop_assert_eq!(topology.is_visible(a, b), topology.is_visible(b, a));
                    prop_assert_eq!(topology.latency(a, b), topology.latency(b, a));
                }
            }
        }
    }
}
