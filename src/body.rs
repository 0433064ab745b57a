//! Simulation participants.

use bevy::math::DVec3;

use crate::math::{cube_root_safe, DEFAULT_CUBE_ROOT_MIN};
use crate::orbit::OrbitData;
use crate::types::{BodyId, MotionState};

/// One body taking part in the simulation.
///
/// Position and velocity are world-space and double precision. The attractor
/// is a non-owning handle into the same [`Simulation`](crate::simulation::Simulation);
/// it stops resolving once that body is removed.
///
/// Fields are public for reading and for building bodies before they are
/// registered. Once registered, prefer the `Simulation` setters, which keep
/// the cached orbit marked dirty.
#[derive(Clone, Debug)]
pub struct Body {
    id: BodyId,
    pub name: String,
    pub mass: f64,
    pub position: DVec3,
    pub velocity: DVec3,
    /// Presentation size hint, persisted with the scene.
    pub scale: f32,
    pub is_active: bool,
    /// Immovable anchor that still attracts others.
    pub is_fixed_position: bool,
    /// User intent: propagate along the Keplerian orbit when possible.
    pub use_kepler_motion: bool,
    /// Whether Keplerian propagation is currently in effect.
    pub is_kepler_motion: bool,
    pub attractor: Option<BodyId>,
    /// Velocity change queued by external forces, applied once per tick.
    pub additional_velocity: DVec3,
    /// Range beyond which this body does not attract others.
    pub max_attraction_range: f64,
    pub motion_state: MotionState,
    /// Interval of the continuous most-proper attractor search, if enabled.
    pub attractor_search_interval: Option<f64>,
    pub(crate) search_timer: f64,
    pub orbit: OrbitData,
}

impl Body {
    pub fn new(name: impl Into<String>, mass: f64, position: DVec3, velocity: DVec3) -> Self {
        Self {
            id: BodyId(0),
            name: name.into(),
            mass,
            position,
            velocity,
            scale: 1.0,
            is_active: true,
            is_fixed_position: false,
            use_kepler_motion: false,
            is_kepler_motion: false,
            attractor: None,
            additional_velocity: DVec3::ZERO,
            max_attraction_range: f64::INFINITY,
            motion_state: MotionState::Idle,
            attractor_search_interval: None,
            search_timer: 0.0,
            orbit: OrbitData::default(),
        }
    }

    /// Request Keplerian propagation.
    pub fn with_kepler_motion(mut self) -> Self {
        self.use_kepler_motion = true;
        self.is_kepler_motion = true;
        self
    }

    /// Pin the body in place.
    pub fn fixed(mut self) -> Self {
        self.is_fixed_position = true;
        self
    }

    pub fn with_attractor(mut self, attractor: BodyId) -> Self {
        self.attractor = Some(attractor);
        self
    }

    pub fn with_max_attraction_range(mut self, range: f64) -> Self {
        self.max_attraction_range = range;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Periodically re-select the most proper attractor.
    pub fn with_attractor_search(mut self, interval: f64) -> Self {
        self.attractor_search_interval = Some(interval);
        self
    }

    #[inline]
    pub fn id(&self) -> BodyId {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: BodyId) {
        self.id = id;
    }

    /// Gravitational parameter `G·m`.
    #[inline]
    pub fn mg(&self, gravitational_constant: f64) -> f64 {
        self.mass * gravitational_constant
    }

    /// Visual scale proportional to the cube root of the mass.
    pub fn scale_for_mass(&self, multiplier: f64) -> f64 {
        cube_root_safe(self.mass, DEFAULT_CUBE_ROOT_MIN) * multiplier
    }

    /// Whether Keplerian propagation is requested and not currently suspended.
    #[inline]
    pub fn wants_kepler_motion(&self) -> bool {
        self.use_kepler_motion && self.is_kepler_motion
    }

    /// Add a velocity change, applied at the next integration step.
    ///
    /// Suspends Keplerian motion so the change goes through the N-body step.
    pub fn add_external_velocity(&mut self, delta_velocity: DVec3) {
        self.additional_velocity += delta_velocity;
        self.terminate_kepler_motion();
        self.orbit.is_dirty = true;
    }

    /// Add a force, converted to a velocity change with the body's mass.
    pub fn add_external_force(&mut self, force: DVec3) {
        if self.mass <= 0.0 {
            return;
        }
        self.add_external_velocity(force / self.mass);
    }

    pub fn terminate_kepler_motion(&mut self) {
        self.is_kepler_motion = false;
    }

    /// Fold queued external velocity into the velocity.
    pub(crate) fn apply_additional_velocity(&mut self) {
        if self.additional_velocity != DVec3::ZERO {
            self.velocity += self.additional_velocity;
            self.additional_velocity = DVec3::ZERO;
        }
    }
}
