//! Orbital Mechanics Library
//!
//! Simplified sphere model used by the constellation routing engine:
//! coordinate transforms on a unit sphere, great-circle distances on an
//! altitude-adjusted Earth, and layout generators for seeding constellations.
//!
//! Motion is a uniform longitude drift; there is no SGP4 or Keplerian
//! propagation here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrbitalError {
    #[error("Invalid constellation: {0}")]
    InvalidConstellation(String),
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

/// Mean Earth radius used for arc distances (km)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Initial orbital elements of one satellite in the sphere model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    /// Degrees, [0, 360)
    pub longitude: f64,
    /// Degrees, [-90, 90]
    pub latitude: f64,
    /// Radial offset added to the base radius
    pub height: f64,
    /// Longitude drift in degrees per tick
    pub speed: f64,
}

pub mod transforms {
    use super::EARTH_RADIUS_KM;
    use nalgebra::Vector3;

    /// Wrap a longitude into [0, 360).
    pub fn normalize_longitude(deg: f64) -> f64 {
        let wrapped = deg.rem_euclid(360.0);
        // rem_euclid rounds tiny negative inputs up to exactly 360.0
        if wrapped >= 360.0 {
            0.0
        } else {
            wrapped
        }
    }

    /// Project (longitude, latitude, height) onto Cartesian coordinates
    /// around a unit base radius.
    pub fn spherical_to_cartesian(longitude_deg: f64, latitude_deg: f64, height: f64) -> Vector3<f64> {
        let r = 1.0 + height;
        let lon = longitude_deg.to_radians();
        let lat = latitude_deg.to_radians();

        Vector3::new(
            r * lat.cos() * lon.cos(),
            r * lat.cos() * lon.sin(),
            r * lat.sin(),
        )
    }

    /// Angle between two position vectors in degrees.
    ///
    /// A zero-length vector has no direction and is reported as 0°.
    pub fn angular_separation_deg(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
        let (Some(a), Some(b)) = (a.try_normalize(f64::EPSILON), b.try_normalize(f64::EPSILON)) else {
            return 0.0;
        };

        a.dot(&b).clamp(-1.0, 1.0).acos().to_degrees()
    }

    /// Haversine arc length (km) between two sub-satellite points.
    ///
    /// The sphere radius is the mean of both altitude-adjusted radii.
    pub fn haversine_km(
        lat1_deg: f64,
        lon1_deg: f64,
        height1: f64,
        lat2_deg: f64,
        lon2_deg: f64,
        height2: f64,
    ) -> f64 {
        let (lat1, lon1) = (lat1_deg.to_radians(), lon1_deg.to_radians());
        let (lat2, lon2) = (lat2_deg.to_radians(), lon2_deg.to_radians());

        let delta_lat = lat2 - lat1;
        let delta_lon = lon2 - lon1;
        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());

        let r1 = EARTH_RADIUS_KM + height1;
        let r2 = EARTH_RADIUS_KM + height2;

        (r1 + r2) / 2.0 * c
    }
}

pub mod walker {
    //! Constellation layout presets.

    use super::transforms::normalize_longitude;
    use super::{OrbitalError, Placement, Result};
    use rand::Rng;
    use serde::{Deserialize, Serialize};

    /// Default drift per tick for generated satellites (degrees)
    pub const DEFAULT_SPEED_DEG: f64 = 0.5;

    /// How satellites are scattered over the sphere.
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    pub enum Distribution {
        /// Longitude and latitude drawn independently and uniformly
        Uniform,
        /// Latitudes confined to a ±15° band around the equator
        Equatorial,
        /// Latitudes confined to |lat| ≥ 60°
        Polar,
        /// Evenly spaced orbital planes
        Walker { planes: u32, phasing: u32, inclination_deg: f64 },
    }

    impl Distribution {
        pub fn generate<R: Rng>(
            &self,
            count: usize,
            height: f64,
            speed: f64,
            rng: &mut R,
        ) -> Result<Vec<Placement>> {
            let random = |rng: &mut R, lat_lo: f64, lat_hi: f64| Placement {
                longitude: rng.gen_range(0.0..360.0),
                latitude: rng.gen_range(lat_lo..=lat_hi),
                height,
                speed,
            };

            match *self {
                Distribution::Uniform => Ok((0..count).map(|_| random(&mut *rng, -90.0, 90.0)).collect()),
                Distribution::Equatorial => Ok((0..count).map(|_| random(&mut *rng, -15.0, 15.0)).collect()),
                Distribution::Polar => Ok((0..count)
                    .map(|_| {
                        let mut p = random(&mut *rng, 60.0, 90.0);
                        if rng.gen_bool(0.5) {
                            p.latitude = -p.latitude;
                        }
                        p
                    })
                    .collect()),
                Distribution::Walker { planes, phasing, inclination_deg } => {
                    let total = u32::try_from(count).map_err(|_| {
                        OrbitalError::InvalidConstellation(format!("{} satellites is too many", count))
                    })?;
                    WalkerDelta {
                        total_satellites: total,
                        planes,
                        phasing,
                        height,
                        inclination_deg,
                        speed,
                    }
                    .placements()
                }
            }
        }
    }

    /// Walker Delta pattern `i: t/p/f`.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct WalkerDelta {
        pub total_satellites: u32,
        pub planes: u32,
        pub phasing: u32,
        pub height: f64,
        pub inclination_deg: f64,
        pub speed: f64,
    }

    impl WalkerDelta {
        pub fn new(total_satellites: u32, planes: u32, phasing: u32) -> Self {
            WalkerDelta {
                total_satellites,
                planes,
                phasing,
                height: 0.0,
                inclination_deg: 53.0,
                speed: DEFAULT_SPEED_DEG,
            }
        }

        pub fn validate(&self) -> Result<()> {
            if self.planes == 0 {
                return Err(OrbitalError::InvalidConstellation("plane count must be non-zero".into()));
            }
            if self.total_satellites % self.planes != 0 {
                return Err(OrbitalError::InvalidConstellation(format!(
                    "{} satellites cannot be split evenly across {} planes",
                    self.total_satellites, self.planes
                )));
            }
            if self.phasing >= self.planes {
                return Err(OrbitalError::InvalidConstellation(format!(
                    "phasing {} must be below plane count {}",
                    self.phasing, self.planes
                )));
            }
            Ok(())
        }

        pub fn satellites_per_plane(&self) -> u32 {
            self.total_satellites / self.planes
        }

        pub fn plane_spacing_deg(&self) -> f64 {
            360.0 / self.planes as f64
        }

        pub fn in_plane_spacing_deg(&self) -> f64 {
            360.0 / self.satellites_per_plane() as f64
        }

        /// Sub-satellite points at epoch, plane by plane.
        pub fn placements(&self) -> Result<Vec<Placement>> {
            self.validate()?;

            let inclination = self.inclination_deg.to_radians();
            let phase_step = self.phasing as f64 * 360.0 / self.total_satellites as f64;
            let mut out = Vec::with_capacity(self.total_satellites as usize);

            for plane in 0..self.planes {
                let raan = plane as f64 * self.plane_spacing_deg();
                for slot in 0..self.satellites_per_plane() {
                    let u = (slot as f64 * self.in_plane_spacing_deg() + plane as f64 * phase_step).to_radians();

                    let latitude = (inclination.sin() * u.sin()).asin().to_degrees();
                    let longitude = raan + (inclination.cos() * u.sin()).atan2(u.cos()).to_degrees();

                    out.push(Placement {
                        longitude: normalize_longitude(longitude),
                        latitude,
                        height: self.height,
                        speed: self.speed,
                    });
                }
            }

            Ok(out)
        }
    }
}
