//! Simulation-wide parameters, loadable from TOML.
//!
//! [`SimulationConfig`] mirrors the defaults in [`crate::types`]. Missing keys
//! fall back to those defaults, so a minimal file can override just the
//! values you care about:
//!
//! ```toml
//! gravitational_constant = 1.0
//! integrator = "runge_kutta"
//! ecliptic_normal = [0.0, 1.0, 0.0]
//! ecliptic_up = [0.0, 0.0, 1.0]
//! ```

use std::path::Path;

use bevy::log::info;
use bevy::math::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::physics::IntegratorKind;
use crate::types::{
    DEFAULT_ATTRACTOR_SEARCH_INTERVAL, DEFAULT_ECLIPTIC_NORMAL, DEFAULT_ECLIPTIC_UP,
    DEFAULT_GRAVITATIONAL_CONSTANT, DEFAULT_MIN_ATTRACTION_RANGE, DEFAULT_MIN_ATTRACTOR_MASS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub gravitational_constant: f64,
    pub min_attraction_range: f64,
    /// Global upper attraction range; `0` or infinity means unbounded.
    pub max_attraction_range: f64,
    pub min_attractor_mass: f64,
    pub ecliptic_normal: [f64; 3],
    pub ecliptic_up: [f64; 3],
    pub integrator: IntegratorKind,
    /// Multiplier applied to every tick's delta time.
    pub time_scale: f64,
    /// Seconds between continuous most-proper attractor searches.
    pub attractor_search_interval: f64,
    pub keep_bodies_on_ecliptic: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: DEFAULT_GRAVITATIONAL_CONSTANT,
            min_attraction_range: DEFAULT_MIN_ATTRACTION_RANGE,
            max_attraction_range: 0.0,
            min_attractor_mass: DEFAULT_MIN_ATTRACTOR_MASS,
            ecliptic_normal: DEFAULT_ECLIPTIC_NORMAL.to_array(),
            ecliptic_up: DEFAULT_ECLIPTIC_UP.to_array(),
            integrator: IntegratorKind::default(),
            time_scale: 1.0,
            attractor_search_interval: DEFAULT_ATTRACTOR_SEARCH_INTERVAL,
            keep_bodies_on_ecliptic: false,
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded simulation config from {}", path.display());
        Ok(config)
    }

    /// Ecliptic normal and up, sanitised with [`sanitize_ecliptic`].
    pub fn ecliptic(&self) -> (DVec3, DVec3) {
        sanitize_ecliptic(
            DVec3::from_array(self.ecliptic_normal),
            DVec3::from_array(self.ecliptic_up),
        )
    }
}

/// Normalise the ecliptic normal and make `up` a unit vector lying in the plane.
///
/// A degenerate normal falls back to the default. A degenerate or parallel
/// `up` falls back to the default up, or any perpendicular if that is
/// parallel to the normal too.
pub fn sanitize_ecliptic(normal: DVec3, up: DVec3) -> (DVec3, DVec3) {
    let normal = if normal.is_finite() {
        normal.try_normalize().unwrap_or(DEFAULT_ECLIPTIC_NORMAL)
    } else {
        DEFAULT_ECLIPTIC_NORMAL
    };
    let in_plane = |v: DVec3| (v - normal * v.dot(normal)).try_normalize();
    let up = Some(up)
        .filter(|v| v.is_finite())
        .and_then(in_plane)
        .or_else(|| in_plane(DEFAULT_ECLIPTIC_UP))
        .unwrap_or_else(|| normal.any_orthonormal_vector());
    (normal, up)
}
