//! Satellite node: position, drift and per-node learning state.

use crate::policy::QTable;
use crate::Result;
use nalgebra::Vector3;
use orbital_mechanics::transforms::{normalize_longitude, spherical_to_cartesian};
use orbital_mechanics::walker::Distribution;
use orbital_mechanics::Placement;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One satellite in a constellation snapshot.
///
/// `index`, `active_connections` and `q_table` are owned by the routing
/// engine; everything else belongs to the application that created the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Satellite {
    /// Position in the snapshot, assigned by `Topology::precompute`
    pub index: usize,
    /// Degrees, [0, 360)
    pub longitude: f64,
    /// Degrees, [-90, 90]
    pub latitude: f64,
    /// Radial offset added to the unit base radius
    pub height: f64,
    /// Longitude drift in degrees per tick
    pub speed: f64,
    /// Simulated concurrent relay load
    pub active_connections: u32,
    #[serde(skip)]
    pub q_table: QTable,
}

impl Satellite {
    pub fn new(longitude: f64, latitude: f64, height: f64, speed: f64) -> Self {
        Self {
            index: 0,
            longitude,
            latitude,
            height,
            speed,
            active_connections: 0,
            q_table: QTable::default(),
        }
    }

    pub fn from_placement(placement: &Placement) -> Self {
        Self::new(placement.longitude, placement.latitude, placement.height, placement.speed)
    }

    /// Move one tick along the longitude drift.
    pub fn advance_position(&mut self) {
        self.longitude = normalize_longitude(self.longitude + self.speed);
    }

    pub fn cartesian(&self) -> Vector3<f64> {
        spherical_to_cartesian(self.longitude, self.latitude, self.height)
    }

    pub fn reset_connections(&mut self) {
        self.active_connections = 0;
    }
}

/// Build a fresh constellation from a layout preset.
pub fn generate<R: Rng>(
    distribution: &Distribution,
    count: usize,
    height: f64,
    speed: f64,
    rng: &mut R,
) -> Result<Vec<Satellite>> {
    let placements = distribution.generate(count, height, speed, rng)?;
    Ok(placements.iter().map(Satellite::from_placement).collect())
}

/// Advance every satellite one tick.
pub fn advance_all(satellites: &mut [Satellite]) {
    for sat in satellites.iter_mut() {
        sat.advance_position();
    }
}
