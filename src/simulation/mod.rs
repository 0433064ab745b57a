//! Caller-owned simulation context.
//!
//! [`Simulation`] owns the body registry and every simulation-wide
//! parameter. Hosts drive it by calling [`Simulation::tick`] once per fixed or
//! variable step; bodies are added, removed and edited only between ticks.

mod attractors;
mod editing;
mod step;

use std::collections::HashMap;

use bevy::log::warn;
use bevy::math::DVec3;
use bevy::prelude::Resource;
use thiserror::Error;

use crate::attractor::SelectionParams;
use crate::body::Body;
use crate::config::SimulationConfig;
use crate::orbit::{OrbitData, OrbitError};
use crate::physics::{AttractionRange, IntegratorKind};
use crate::types::BodyId;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SimulationError {
    #[error("unknown body {0}")]
    UnknownBody(BodyId),

    #[error("body mass must be finite and positive, got {0}")]
    InvalidMass(f64),

    #[error("gravitational constant must be finite and positive, got {0}")]
    InvalidGravitationalConstant(f64),

    #[error("{0} cannot be its own attractor")]
    SelfAttraction(BodyId),

    #[error(transparent)]
    Orbit(#[from] OrbitError),
}

/// Attractor change queued until the start of the next tick.
#[derive(Clone, Copy, Debug)]
struct AttractorRequest {
    body: BodyId,
    attractor: BodyId,
    check_in_range: bool,
}

#[derive(Resource, Debug)]
pub struct Simulation {
    bodies: Vec<Body>,
    index: HashMap<BodyId, usize>,
    next_id: u64,
    gravitational_constant: f64,
    attraction_range: AttractionRange,
    min_attractor_mass: f64,
    ecliptic_normal: DVec3,
    ecliptic_up: DVec3,
    attractor_search_interval: f64,
    pending_attractors: Vec<AttractorRequest>,
    pub integrator: IntegratorKind,
    /// Multiplier applied to every tick's delta time.
    pub time_scale: f64,
    /// Project every body onto the ecliptic before each tick.
    pub keep_bodies_on_ecliptic: bool,
    /// A paused simulation ignores [`tick`](Self::tick).
    pub paused: bool,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an empty simulation from a config.
    ///
    /// A non-positive or non-finite gravitational constant in the config is
    /// replaced by the default.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let (ecliptic_normal, ecliptic_up) = config.ecliptic();
        let defaults = SimulationConfig::default();
        let gravitational_constant = if is_valid_gravitational_constant(config.gravitational_constant) {
            config.gravitational_constant
        } else {
            warn!(
                "Invalid gravitational constant {} in config, using {}",
                config.gravitational_constant, defaults.gravitational_constant
            );
            defaults.gravitational_constant
        };
        Self {
            bodies: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
            gravitational_constant,
            attraction_range: AttractionRange {
                min: config.min_attraction_range,
                max: config.max_attraction_range,
            },
            min_attractor_mass: config.min_attractor_mass,
            ecliptic_normal,
            ecliptic_up,
            attractor_search_interval: config.attractor_search_interval,
            pending_attractors: Vec::new(),
            integrator: config.integrator,
            time_scale: config.time_scale,
            keep_bodies_on_ecliptic: config.keep_bodies_on_ecliptic,
            paused: false,
        }
    }

    /// Register a body and return its handle.
    ///
    /// The body's orbit is marked dirty and computed at the end of the next tick.
    pub fn add_body(&mut self, mut body: Body) -> Result<BodyId, SimulationError> {
        if !(body.mass.is_finite() && body.mass > 0.0) {
            return Err(SimulationError::InvalidMass(body.mass));
        }
        let id = BodyId(self.next_id);
        self.next_id += 1;
        body.assign_id(id);
        body.orbit.is_dirty = true;
        self.index.insert(id, self.bodies.len());
        self.bodies.push(body);
        Ok(id)
    }

    /// Deregister a body and hand it back to the caller.
    ///
    /// Bodies orbiting the removed one are detached, and queued attractor
    /// requests mentioning it are dropped.
    pub fn remove_body(&mut self, id: BodyId) -> Result<Body, SimulationError> {
        let idx = self.index_of(id)?;
        let removed = self.bodies.remove(idx);
        self.rebuild_index();
        for body in &mut self.bodies {
            if body.attractor == Some(id) {
                body.attractor = None;
                body.orbit.is_dirty = true;
            }
        }
        self.pending_attractors
            .retain(|request| request.body != id && request.attractor != id);
        Ok(removed)
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .bodies
            .iter()
            .enumerate()
            .map(|(idx, body)| (body.id(), idx))
            .collect();
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.index.get(&id).map(|&idx| &self.bodies[idx])
    }

    /// Direct mutable access to a body.
    ///
    /// Changing position, velocity, mass or attractor through this reference
    /// must be followed by marking `orbit.is_dirty`; the setters on
    /// `Simulation` do that already.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.index.get(&id).map(|&idx| &mut self.bodies[idx])
    }

    /// Bodies in registration order.
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.index.contains_key(&id)
    }

    /// Handle of the first body with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<BodyId> {
        self.bodies.iter().find(|body| body.name == name).map(Body::id)
    }

    pub fn gravitational_constant(&self) -> f64 {
        self.gravitational_constant
    }

    pub fn attraction_range(&self) -> AttractionRange {
        self.attraction_range
    }

    /// Set the global attraction limits; a `max` of zero means unbounded.
    pub fn set_attraction_range(&mut self, min: f64, max: f64) {
        self.attraction_range = AttractionRange { min, max };
    }

    pub fn min_attractor_mass(&self) -> f64 {
        self.min_attractor_mass
    }

    pub fn set_min_attractor_mass(&mut self, mass: f64) {
        self.min_attractor_mass = mass;
    }

    pub fn ecliptic_normal(&self) -> DVec3 {
        self.ecliptic_normal
    }

    pub fn ecliptic_up(&self) -> DVec3 {
        self.ecliptic_up
    }

    pub fn attractor_search_interval(&self) -> f64 {
        self.attractor_search_interval
    }

    pub fn set_attractor_search_interval(&mut self, interval: f64) {
        self.attractor_search_interval = interval;
    }

    pub(crate) fn selection_params(&self) -> SelectionParams {
        SelectionParams {
            gravitational_constant: self.gravitational_constant,
            min_attractor_mass: self.min_attractor_mass,
            range: self.attraction_range,
        }
    }

    fn index_of(&self, id: BodyId) -> Result<usize, SimulationError> {
        self.index
            .get(&id)
            .copied()
            .ok_or(SimulationError::UnknownBody(id))
    }

    /// Index of the body's attractor, if it has one that still exists.
    fn attractor_index(&self, idx: usize) -> Option<usize> {
        self.bodies[idx]
            .attractor
            .and_then(|id| self.index.get(&id).copied())
    }

    /// Rebuild a body's orbit from its state relative to its attractor.
    ///
    /// Bodies without an attractor get an empty, invalid orbit.
    fn recalculate_orbit(&mut self, idx: usize) {
        let Some(attractor_idx) = self.attractor_index(idx) else {
            self.bodies[idx].orbit = OrbitData {
                gravitational_constant: self.gravitational_constant,
                ecliptic_normal: self.ecliptic_normal,
                ecliptic_up: self.ecliptic_up,
                is_dirty: false,
                ..OrbitData::default()
            };
            return;
        };
        let attractor = &self.bodies[attractor_idx];
        let (attractor_position, attractor_velocity, attractor_mass) =
            (attractor.position, attractor.velocity, attractor.mass);

        let body = &mut self.bodies[idx];
        let result = body.orbit.recalculate(
            body.position - attractor_position,
            body.velocity - attractor_velocity,
            attractor_mass,
            self.gravitational_constant,
            self.ecliptic_normal,
            self.ecliptic_up,
        );
        if let Err(err) = result {
            warn!("Orbit of '{}' ({}) not recalculated: {}", body.name, body.id(), err);
            body.orbit.is_dirty = false;
        }
    }

    /// Copy the orbit's relative state back into world space.
    fn write_back_orbit_state(&mut self, idx: usize, attractor_idx: usize) {
        let attractor = &self.bodies[attractor_idx];
        let (attractor_position, attractor_velocity) = (attractor.position, attractor.velocity);
        let body = &mut self.bodies[idx];
        body.position = attractor_position + body.orbit.position;
        body.velocity = attractor_velocity + body.orbit.velocity;
    }

    fn mark_all_dirty(&mut self) {
        for body in &mut self.bodies {
            body.orbit.is_dirty = true;
        }
    }
}

fn is_valid_gravitational_constant(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
