//! Keplerian orbit state of one body relative to its attractor.
//!
//! [`OrbitData`] caches the full classical element set derived from a
//! relative position/velocity pair and keeps both representations in sync:
//! elements are rebuilt from Cartesian state by [`OrbitData::recalculate`],
//! and Cartesian state is rebuilt from the anomalies when time advances or
//! an element is edited.
//!
//! # Orbital plane basis
//!
//! `semi_major_axis_basis` points from the periapsis towards the orbit
//! centre (it is `-ê`), and `semi_minor_axis_basis` completes a right-handed
//! frame with the orbit normal. Positions along the curve are expressed in
//! this basis scaled by the semi-axes.

mod anomaly;
mod sampling;

#[cfg(test)]
mod proptest_orbit;

use std::f64::consts::TAU;

use bevy::log::warn;
use bevy::math::DVec3;
use thiserror::Error;

pub use anomaly::{
    eccentric_to_mean, eccentric_to_true, hyperbolic_asymptote, kepler_solver,
    kepler_solver_hyperbolic, mean_to_eccentric, mean_to_true, true_anomaly_for_distance,
    true_to_eccentric, true_to_mean, wrap_signed,
};
pub use sampling::OrbitPoints;

use crate::math::{angle_between, cross, dot, rotate_vector_by_angle};
use crate::types::{
    DEFAULT_ECLIPTIC_NORMAL, DEFAULT_ECLIPTIC_UP, DEFAULT_GRAVITATIONAL_CONSTANT, EPSILON,
    MIN_COMPRESSION, MIN_FOCAL_PARAMETER, MIN_PERIOD,
};

/// Errors raised when orbit elements cannot be computed at all.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum OrbitError {
    #[error("attractor mass must be finite and positive, got {0}")]
    InvalidAttractorMass(f64),

    #[error("gravitational constant must be finite and positive, got {0}")]
    InvalidGravitationalConstant(f64),
}

/// Cached orbit of a body around its attractor.
///
/// All vectors are relative to the attractor, which sits at the focus.
/// Element reads are only meaningful while `is_dirty` is false and
/// [`is_valid`](Self::is_valid) holds; an invalid orbit keeps finite sentinel
/// values instead of NaN.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitData {
    pub gravitational_constant: f64,
    pub ecliptic_normal: DVec3,
    pub ecliptic_up: DVec3,

    /// Position relative to the attractor.
    pub position: DVec3,
    /// Velocity relative to the attractor.
    pub velocity: DVec3,
    pub attractor_distance: f64,
    pub attractor_mass: f64,

    pub eccentricity_vector: DVec3,
    pub eccentricity: f64,
    pub semi_major_axis: f64,
    pub semi_minor_axis: f64,
    pub focal_parameter: f64,
    /// Twice the specific orbital energy, `v² - 2μ/r`.
    pub energy_total: f64,
    /// Orbital period, infinite for hyperbolic orbits.
    pub period: f64,

    pub true_anomaly: f64,
    pub eccentric_anomaly: f64,
    pub mean_anomaly: f64,

    pub periapsis: DVec3,
    pub periapsis_distance: f64,
    /// Apoapsis point, `(∞, ∞, ∞)` for hyperbolic orbits.
    pub apoapsis: DVec3,
    pub apoapsis_distance: f64,
    pub center_point: DVec3,
    /// `|1 - e²|`.
    pub orbit_compression_ratio: f64,

    pub orbit_normal: DVec3,
    pub semi_major_axis_basis: DVec3,
    pub semi_minor_axis_basis: DVec3,
    pub inclination: f64,
    pub orbit_normal_dot_ecliptic_normal: f64,

    /// Set by any external mutation, cleared by a full recalculation.
    pub is_dirty: bool,
}

impl Default for OrbitData {
    fn default() -> Self {
        Self {
            gravitational_constant: DEFAULT_GRAVITATIONAL_CONSTANT,
            ecliptic_normal: DEFAULT_ECLIPTIC_NORMAL,
            ecliptic_up: DEFAULT_ECLIPTIC_UP,
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            attractor_distance: 0.0,
            attractor_mass: 0.0,
            eccentricity_vector: DVec3::ZERO,
            eccentricity: 0.0,
            semi_major_axis: 0.0,
            semi_minor_axis: 0.0,
            focal_parameter: 0.0,
            energy_total: 0.0,
            period: 0.0,
            true_anomaly: 0.0,
            eccentric_anomaly: 0.0,
            mean_anomaly: 0.0,
            periapsis: DVec3::ZERO,
            periapsis_distance: 0.0,
            apoapsis: DVec3::ZERO,
            apoapsis_distance: 0.0,
            center_point: DVec3::ZERO,
            orbit_compression_ratio: 0.0,
            orbit_normal: DVec3::ZERO,
            semi_major_axis_basis: DVec3::ZERO,
            semi_minor_axis_basis: DVec3::ZERO,
            inclination: 0.0,
            orbit_normal_dot_ecliptic_normal: 0.0,
            is_dirty: true,
        }
    }
}

impl OrbitData {
    /// Rebuild every element from a relative position and velocity.
    ///
    /// Fails only when the attractor mass or gravitational constant make the
    /// gravitational parameter meaningless; in that case nothing is written.
    /// Repeated calls with identical inputs produce identical output.
    pub fn recalculate(
        &mut self,
        relative_position: DVec3,
        relative_velocity: DVec3,
        attractor_mass: f64,
        gravitational_constant: f64,
        ecliptic_normal: DVec3,
        ecliptic_up: DVec3,
    ) -> Result<(), OrbitError> {
        validate_parameters(attractor_mass, gravitational_constant)?;
        self.position = relative_position;
        self.velocity = relative_velocity;
        self.attractor_mass = attractor_mass;
        self.gravitational_constant = gravitational_constant;
        self.ecliptic_normal = ecliptic_normal;
        self.ecliptic_up = ecliptic_up;
        self.compute_elements();
        Ok(())
    }

    /// Rebuild every element from the currently stored state and parameters.
    pub fn refresh(&mut self) -> Result<(), OrbitError> {
        validate_parameters(self.attractor_mass, self.gravitational_constant)?;
        self.compute_elements();
        Ok(())
    }

    fn compute_elements(&mut self) {
        self.is_dirty = false;
        let mg = self.mg();
        let position = self.position;
        let velocity = self.velocity;
        self.attractor_distance = position.length();

        let angular_momentum = cross(position, velocity);
        self.orbit_normal = angular_momentum.normalize_or_zero();
        let normal_len_sq = self.orbit_normal.length_squared();
        let eccentricity_vector = if !(0.9..=1.1).contains(&normal_len_sq) {
            // Radial motion: no orbital plane, pick one containing the ecliptic up
            self.orbit_normal = cross(position, self.ecliptic_up).normalize_or_zero();
            DVec3::ZERO
        } else {
            cross(velocity, angular_momentum) / mg - position / self.attractor_distance
        };
        self.eccentricity_vector = eccentricity_vector;

        self.orbit_normal_dot_ecliptic_normal = dot(self.orbit_normal, self.ecliptic_normal);
        self.focal_parameter = angular_momentum.length_squared() / mg;
        self.eccentricity = eccentricity_vector.length();
        self.energy_total = velocity.length_squared() - 2.0 * mg / self.attractor_distance;

        self.semi_minor_axis_basis = cross(angular_momentum, eccentricity_vector).normalize_or_zero();
        if self.semi_minor_axis_basis.length_squared() < 0.5 {
            self.semi_minor_axis_basis = cross(self.orbit_normal, position).normalize_or_zero();
        }
        self.semi_major_axis_basis =
            cross(self.orbit_normal, self.semi_minor_axis_basis).normalize_or_zero();
        self.inclination = angle_between(self.orbit_normal, self.ecliptic_normal);

        let e = self.eccentricity;
        let prograde = dot(cross(position, self.semi_major_axis_basis), self.orbit_normal) >= 0.0;

        if e < 1.0 {
            self.orbit_compression_ratio = (1.0 - e * e).max(MIN_COMPRESSION);
            self.semi_major_axis = self.focal_parameter / self.orbit_compression_ratio;
            self.semi_minor_axis = self.semi_major_axis * self.orbit_compression_ratio.sqrt();
            self.center_point = -self.semi_major_axis * eccentricity_vector;
            self.period = TAU * (self.semi_major_axis.powi(3) / mg).sqrt();
            self.apoapsis = self.center_point + self.semi_major_axis_basis * self.semi_major_axis;
            self.periapsis = self.center_point - self.semi_major_axis_basis * self.semi_major_axis;
            self.periapsis_distance = self.periapsis.length();
            self.apoapsis_distance = self.apoapsis.length();

            let mut true_anomaly = angle_between(position, -self.semi_major_axis_basis);
            if !prograde {
                true_anomaly = TAU - true_anomaly;
            }
            self.true_anomaly = true_anomaly;
            self.eccentric_anomaly = true_to_eccentric(true_anomaly, e);
            self.mean_anomaly = eccentric_to_mean(self.eccentric_anomaly, e);
        } else {
            self.orbit_compression_ratio = (e * e - 1.0).max(MIN_COMPRESSION);
            self.semi_major_axis = self.focal_parameter / self.orbit_compression_ratio;
            self.semi_minor_axis = self.semi_major_axis * self.orbit_compression_ratio.sqrt();
            self.center_point = self.semi_major_axis * eccentricity_vector;
            self.period = f64::INFINITY;
            self.apoapsis = DVec3::splat(f64::INFINITY);
            self.periapsis = self.center_point + self.semi_major_axis_basis * self.semi_major_axis;
            self.periapsis_distance = self.periapsis.length();
            self.apoapsis_distance = f64::INFINITY;

            let mut true_anomaly = angle_between(position, eccentricity_vector);
            if !prograde {
                true_anomaly = -true_anomaly;
            }
            self.true_anomaly = true_anomaly;
            self.eccentric_anomaly = true_to_eccentric(true_anomaly, e);
            self.mean_anomaly = eccentric_to_mean(self.eccentric_anomaly, e);
        }
    }

    /// Gravitational parameter `μ = G·M` of the attractor.
    #[inline]
    pub fn mg(&self) -> f64 {
        self.attractor_mass * self.gravitational_constant
    }

    #[inline]
    pub fn is_elliptic(&self) -> bool {
        self.eccentricity < 1.0
    }

    /// Whether the elements describe an actual orbit.
    pub fn is_valid(&self) -> bool {
        self.eccentricity >= 0.0
            && self.period > EPSILON
            && self.attractor_distance > EPSILON
            && self.attractor_mass > EPSILON
    }

    /// Velocity relative to the attractor at the given true anomaly.
    pub fn velocity_at_true_anomaly(&self, true_anomaly: f64) -> DVec3 {
        if self.focal_parameter < MIN_FOCAL_PARAMETER {
            return DVec3::ZERO;
        }
        let speed = (self.mg() / self.focal_parameter).sqrt();
        let (sin_t, cos_t) = true_anomaly.sin_cos();
        self.semi_minor_axis_basis * (speed * (self.eccentricity + cos_t))
            + self.semi_major_axis_basis * (speed * sin_t)
    }

    pub fn velocity_at_eccentric_anomaly(&self, eccentric_anomaly: f64) -> DVec3 {
        self.velocity_at_true_anomaly(eccentric_to_true(eccentric_anomaly, self.eccentricity))
    }

    /// Position relative to the orbit centre (not the focus).
    pub fn central_position_at_eccentric_anomaly(&self, eccentric_anomaly: f64) -> DVec3 {
        let (x, y) = if self.is_elliptic() {
            (
                eccentric_anomaly.sin() * self.semi_minor_axis,
                -eccentric_anomaly.cos() * self.semi_major_axis,
            )
        } else {
            (
                eccentric_anomaly.sinh() * self.semi_minor_axis,
                eccentric_anomaly.cosh() * self.semi_major_axis,
            )
        };
        self.semi_minor_axis_basis * x + self.semi_major_axis_basis * y
    }

    pub fn central_position_at_true_anomaly(&self, true_anomaly: f64) -> DVec3 {
        self.central_position_at_eccentric_anomaly(true_to_eccentric(true_anomaly, self.eccentricity))
    }

    /// Position relative to the attractor.
    pub fn focal_position_at_eccentric_anomaly(&self, eccentric_anomaly: f64) -> DVec3 {
        self.central_position_at_eccentric_anomaly(eccentric_anomaly) + self.center_point
    }

    pub fn focal_position_at_true_anomaly(&self, true_anomaly: f64) -> DVec3 {
        self.central_position_at_true_anomaly(true_anomaly) + self.center_point
    }

    /// Current position relative to the orbit centre.
    pub fn central_position(&self) -> DVec3 {
        self.position - self.center_point
    }

    /// Propagate the body along its orbit by `delta_time`.
    ///
    /// Orbit shape is untouched; anomalies advance and position/velocity are
    /// rebuilt from the new eccentric anomaly.
    pub fn advance(&mut self, delta_time: f64) {
        self.advance_anomalies(delta_time);
        self.sync_state_with_anomaly();
    }

    /// Advance the three anomalies only.
    pub fn advance_anomalies(&mut self, delta_time: f64) {
        let previous_mean = self.mean_anomaly;
        let e = self.eccentricity;

        if self.is_elliptic() {
            let mut mean = self.mean_anomaly;
            if self.period > MIN_PERIOD {
                mean += TAU * delta_time / self.period;
            }
            self.mean_anomaly = mean.rem_euclid(TAU);
        } else {
            let mean_motion = (self.mg() / self.semi_major_axis.powi(3)).sqrt();
            self.mean_anomaly += mean_motion * delta_time;
        }

        if !self.mean_anomaly.is_finite() {
            warn!(
                "Non-finite mean anomaly after advancing by {}s (e = {}), keeping previous value",
                delta_time, e
            );
            self.mean_anomaly = previous_mean;
            return;
        }

        self.eccentric_anomaly = mean_to_eccentric(self.mean_anomaly, e);
        self.true_anomaly = eccentric_to_true(self.eccentric_anomaly, e);
    }

    /// Rebuild position and velocity from the current eccentric anomaly.
    pub fn sync_state_with_anomaly(&mut self) {
        self.position = self.focal_position_at_eccentric_anomaly(self.eccentric_anomaly);
        self.velocity = self.velocity_at_eccentric_anomaly(self.eccentric_anomaly);
    }

    /// Sampled curve points relative to the attractor.
    pub fn orbit_points(&self, points_count: usize, max_distance: f64) -> OrbitPoints {
        OrbitPoints::along_orbit(self, points_count, DVec3::ZERO, max_distance)
    }

    /// Sampled curve points offset by the attractor's world position.
    pub fn orbit_points_around(
        &self,
        points_count: usize,
        origin: DVec3,
        max_distance: f64,
    ) -> OrbitPoints {
        OrbitPoints::along_orbit(self, points_count, origin, max_distance)
    }

    /// Point where the body crosses the ecliptic moving towards its normal.
    ///
    /// `None` for invalid or ecliptic-aligned orbits, and for hyperbolic
    /// orbits whose node lies beyond the asymptote.
    pub fn ascending_node(&self) -> Option<DVec3> {
        self.node(true)
    }

    /// Point where the body crosses the ecliptic moving away from its normal.
    pub fn descending_node(&self) -> Option<DVec3> {
        self.node(false)
    }

    fn node(&self, ascending: bool) -> Option<DVec3> {
        if !self.is_valid() {
            return None;
        }
        // Line of nodes, pointing at the ascending node
        let mut line = cross(self.ecliptic_normal, self.orbit_normal);
        if line.length_squared() < EPSILON {
            return None;
        }
        if !ascending {
            line = -line;
        }

        // Signed angle from periapsis to the node, measured around the orbit normal
        let periapsis_direction = -self.semi_major_axis_basis;
        let true_anomaly = dot(cross(periapsis_direction, line), self.orbit_normal)
            .atan2(dot(periapsis_direction, line));

        if !self.is_elliptic() && true_anomaly.abs() >= hyperbolic_asymptote(self.eccentricity) {
            return None;
        }
        Some(self.focal_position_at_true_anomaly(true_anomaly))
    }

    /// Change the eccentricity while keeping the periapsis distance and mean anomaly.
    ///
    /// No-op on an invalid orbit, or when the new shape would not be finite
    /// (exactly parabolic).
    pub fn set_eccentricity(&mut self, eccentricity: f64) {
        if !self.is_valid() {
            return;
        }
        let e = eccentricity.abs();
        let mut edited = *self;
        edited.eccentricity = e;
        edited.orbit_compression_ratio = if e < 1.0 { 1.0 - e * e } else { e * e - 1.0 };
        edited.semi_major_axis = (self.periapsis_distance / (1.0 - e)).abs();
        edited.focal_parameter = edited.semi_major_axis * edited.orbit_compression_ratio;
        edited.semi_minor_axis = edited.semi_major_axis * edited.orbit_compression_ratio.sqrt();
        edited.center_point = if e < 1.0 {
            edited.semi_major_axis_basis * (edited.semi_major_axis * e)
        } else {
            -edited.semi_major_axis_basis * (edited.semi_major_axis * e)
        };
        if edited.is_elliptic() {
            edited.mean_anomaly = edited.mean_anomaly.rem_euclid(TAU);
        }
        edited.eccentric_anomaly = mean_to_eccentric(edited.mean_anomaly, e);
        edited.true_anomaly = eccentric_to_true(edited.eccentric_anomaly, e);
        edited.sync_state_with_anomaly();

        if !(edited.position.is_finite() && edited.velocity.is_finite()) {
            return;
        }
        self.position = edited.position;
        self.velocity = edited.velocity;
        self.compute_elements();
    }

    /// Move the body to a new mean anomaly on the same orbit.
    pub fn set_mean_anomaly(&mut self, mean_anomaly: f64) {
        if !self.is_valid() {
            return;
        }
        let e = self.eccentricity;
        self.mean_anomaly = if self.is_elliptic() {
            mean_anomaly.rem_euclid(TAU)
        } else {
            mean_anomaly % TAU
        };
        self.eccentric_anomaly = mean_to_eccentric(self.mean_anomaly, e);
        self.true_anomaly = eccentric_to_true(self.eccentric_anomaly, e);
        self.sync_state_with_anomaly();
    }

    /// Move the body to a new true anomaly on the same orbit.
    pub fn set_true_anomaly(&mut self, true_anomaly: f64) {
        if !self.is_valid() {
            return;
        }
        let e = self.eccentricity;
        self.true_anomaly = if self.is_elliptic() {
            true_anomaly.rem_euclid(TAU)
        } else {
            wrap_signed(true_anomaly)
        };
        self.eccentric_anomaly = true_to_eccentric(self.true_anomaly, e);
        self.mean_anomaly = eccentric_to_mean(self.eccentric_anomaly, e);
        self.sync_state_with_anomaly();
    }

    /// Move the body to a new eccentric (or hyperbolic) anomaly on the same orbit.
    pub fn set_eccentric_anomaly(&mut self, eccentric_anomaly: f64) {
        if !self.is_valid() {
            return;
        }
        let e = self.eccentricity;
        self.eccentric_anomaly = if self.is_elliptic() {
            eccentric_anomaly.rem_euclid(TAU)
        } else {
            eccentric_anomaly % TAU
        };
        self.true_anomaly = eccentric_to_true(self.eccentric_anomaly, e);
        self.mean_anomaly = eccentric_to_mean(self.eccentric_anomaly, e);
        self.sync_state_with_anomaly();
    }

    /// Rotate relative position and velocity around `axis` and rebuild the elements.
    pub fn rotate(&mut self, angle_rad: f64, axis: DVec3) -> Result<(), OrbitError> {
        let axis = axis.normalize_or_zero();
        if axis == DVec3::ZERO {
            return Ok(());
        }
        self.position = rotate_vector_by_angle(self.position, angle_rad, axis);
        self.velocity = rotate_vector_by_angle(self.velocity, angle_rad, axis);
        self.refresh()
    }
}

fn validate_parameters(attractor_mass: f64, gravitational_constant: f64) -> Result<(), OrbitError> {
    if !(attractor_mass.is_finite() && attractor_mass > 0.0) {
        return Err(OrbitError::InvalidAttractorMass(attractor_mass));
    }
    if !(gravitational_constant.is_finite() && gravitational_constant > 0.0) {
        return Err(OrbitError::InvalidGravitationalConstant(gravitational_constant));
    }
    Ok(())
}

/// Velocity giving a circular orbit around an attractor.
///
/// Speed is `sqrt(G·M/r)`, directed along `r × -orbit_normal` so the body
/// moves counter-clockwise around `orbit_normal`.
pub fn circle_orbit_velocity(
    attractor_position: DVec3,
    body_position: DVec3,
    attractor_mass: f64,
    orbit_normal: DVec3,
    gravitational_constant: f64,
) -> DVec3 {
    let offset = body_position - attractor_position;
    let distance = offset.length();
    if distance < EPSILON {
        return DVec3::ZERO;
    }
    let speed = (attractor_mass * gravitational_constant / distance).sqrt();
    cross(offset, -orbit_normal).normalize_or_zero() * speed
}
