//! Core types and constants shared across the simulation.

use std::fmt;

use bevy::math::DVec3;
use serde::{Deserialize, Serialize};

/// Default gravitational constant used by a freshly constructed simulation.
///
/// The simulation works in arbitrary scene units, so this is a tuning value
/// rather than the SI constant.
pub const DEFAULT_GRAVITATIONAL_CONSTANT: f64 = 0.0001;

/// Bodies closer than this to an attractor receive no pull from it.
pub const DEFAULT_MIN_ATTRACTION_RANGE: f64 = 0.1;

/// Bodies at or above this mass take part in N-body attraction.
pub const DEFAULT_MIN_ATTRACTOR_MASS: f64 = 100.0;

/// Default interval (seconds of host time) between automatic attractor searches.
pub const DEFAULT_ATTRACTOR_SEARCH_INTERVAL: f64 = 1.0;

/// Minimal floating point value used for orbit validity checks.
pub const EPSILON: f64 = 1e-10;

/// Orbits whose period is shorter than this are not propagated by time.
pub const MIN_PERIOD: f64 = 1e-5;

/// Velocity along an orbit is undefined below this focal parameter.
pub const MIN_FOCAL_PARAMETER: f64 = 1e-5;

/// Lower bound on `|1 - e²|`, keeps near-parabolic orbits finite.
pub const MIN_COMPRESSION: f64 = 1e-12;

/// Default normal of the ecliptic plane.
pub const DEFAULT_ECLIPTIC_NORMAL: DVec3 = DVec3::NEG_Z;

/// Default "up" direction lying in the ecliptic plane.
pub const DEFAULT_ECLIPTIC_UP: DVec3 = DVec3::Y;

/// Stable handle of a body registered in a [`Simulation`](crate::simulation::Simulation).
///
/// Handles are never reused within one simulation, so a stale handle simply
/// stops resolving once its body is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Motion model actually applied to a body during the last tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MotionState {
    /// Body has not been stepped yet, is fixed, or is inactive.
    #[default]
    Idle,
    /// Closed-form propagation along the orbit around the attractor.
    KeplerianPropagation,
    /// Numerical integration of the pull from every attractor.
    NBodyIntegration,
}

/// Direction of travel for circularised orbits, viewed against the ecliptic normal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrbitDirection {
    Clockwise,
    CounterClockwise,
}
