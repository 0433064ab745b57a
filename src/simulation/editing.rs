//! State mutators, world-space queries and live orbit editing.

use bevy::log::debug;
use bevy::math::DVec3;

use super::{is_valid_gravitational_constant, Simulation, SimulationError};
use crate::body::Body;
use crate::config::sanitize_ecliptic;
use crate::math::{center_of_mass, cross, project_onto_plane};
use crate::orbit::{circle_orbit_velocity, OrbitData, OrbitPoints};
use crate::types::{BodyId, OrbitDirection};

impl Simulation {
    pub fn set_position(&mut self, id: BodyId, position: DVec3) -> Result<(), SimulationError> {
        self.edit(id, |body| body.position = position)
    }

    pub fn set_velocity(&mut self, id: BodyId, velocity: DVec3) -> Result<(), SimulationError> {
        self.edit(id, |body| body.velocity = velocity)
    }

    /// Position relative to the attractor, or world position without one.
    pub fn relative_position(&self, id: BodyId) -> Result<DVec3, SimulationError> {
        let idx = self.index_of(id)?;
        let origin = self.attractor_index(idx).map_or(DVec3::ZERO, |a| self.bodies[a].position);
        Ok(self.bodies[idx].position - origin)
    }

    /// Velocity relative to the attractor, or world velocity without one.
    pub fn relative_velocity(&self, id: BodyId) -> Result<DVec3, SimulationError> {
        let idx = self.index_of(id)?;
        let origin = self.attractor_index(idx).map_or(DVec3::ZERO, |a| self.bodies[a].velocity);
        Ok(self.bodies[idx].velocity - origin)
    }

    pub fn set_relative_position(
        &mut self,
        id: BodyId,
        relative_position: DVec3,
    ) -> Result<(), SimulationError> {
        let idx = self.index_of(id)?;
        let origin = self.attractor_index(idx).map_or(DVec3::ZERO, |a| self.bodies[a].position);
        self.edit(id, |body| body.position = origin + relative_position)
    }

    pub fn set_relative_velocity(
        &mut self,
        id: BodyId,
        relative_velocity: DVec3,
    ) -> Result<(), SimulationError> {
        let idx = self.index_of(id)?;
        let origin = self.attractor_index(idx).map_or(DVec3::ZERO, |a| self.bodies[a].velocity);
        self.edit(id, |body| body.velocity = origin + relative_velocity)
    }

    pub fn set_mass(&mut self, id: BodyId, mass: f64) -> Result<(), SimulationError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SimulationError::InvalidMass(mass));
        }
        self.edit(id, |body| body.mass = mass)
    }

    pub fn set_active(&mut self, id: BodyId, active: bool) -> Result<(), SimulationError> {
        self.edit(id, |body| body.is_active = active)
    }

    pub fn set_fixed_position(&mut self, id: BodyId, fixed: bool) -> Result<(), SimulationError> {
        self.edit(id, |body| body.is_fixed_position = fixed)
    }

    /// Request or stop Keplerian propagation for a body.
    pub fn set_use_kepler_motion(&mut self, id: BodyId, enabled: bool) -> Result<(), SimulationError> {
        self.edit(id, |body| {
            body.use_kepler_motion = enabled;
            body.is_kepler_motion = enabled;
        })
    }

    pub fn add_external_velocity(&mut self, id: BodyId, delta_velocity: DVec3) -> Result<(), SimulationError> {
        self.edit(id, |body| body.add_external_velocity(delta_velocity))
    }

    pub fn add_external_force(&mut self, id: BodyId, force: DVec3) -> Result<(), SimulationError> {
        self.edit(id, |body| body.add_external_force(force))
    }

    /// Apply `change` to one body and mark its orbit dirty.
    fn edit(
        &mut self,
        id: BodyId,
        change: impl FnOnce(&mut Body),
    ) -> Result<(), SimulationError> {
        let idx = self.index_of(id)?;
        let body = &mut self.bodies[idx];
        change(body);
        body.orbit.is_dirty = true;
        Ok(())
    }

    pub fn set_gravitational_constant(&mut self, value: f64) -> Result<(), SimulationError> {
        if !is_valid_gravitational_constant(value) {
            return Err(SimulationError::InvalidGravitationalConstant(value));
        }
        self.gravitational_constant = value;
        self.mark_all_dirty();
        Ok(())
    }

    /// Change the gravitational constant and rescale every velocity by
    /// `sqrt(new / old)`, so existing orbits keep their shape.
    pub fn set_gravitational_constant_proportional(
        &mut self,
        value: f64,
    ) -> Result<(), SimulationError> {
        let previous = self.gravitational_constant;
        self.set_gravitational_constant(value)?;
        if value != previous {
            self.change_all_velocities_by_factor((value / previous).abs().sqrt());
        }
        Ok(())
    }

    pub fn change_all_velocities_by_factor(&mut self, factor: f64) {
        for body in &mut self.bodies {
            body.velocity *= factor;
            body.orbit.is_dirty = true;
        }
    }

    /// Replace the ecliptic plane. Inputs are sanitised like config values.
    pub fn set_ecliptic(&mut self, normal: DVec3, up: DVec3) {
        let (normal, up) = sanitize_ecliptic(normal, up);
        self.ecliptic_normal = normal;
        self.ecliptic_up = up;
        self.mark_all_dirty();
    }

    /// Drop the out-of-plane components of a body's position and velocity.
    pub fn project_onto_ecliptic(&mut self, id: BodyId) -> Result<(), SimulationError> {
        let normal = self.ecliptic_normal;
        self.edit(id, |body| {
            body.position = project_onto_plane(body.position, normal);
            body.velocity = project_onto_plane(body.velocity, normal);
        })
    }

    pub fn project_all_onto_ecliptic(&mut self) {
        let normal = self.ecliptic_normal;
        for body in &mut self.bodies {
            body.position = project_onto_plane(body.position, normal);
            body.velocity = project_onto_plane(body.velocity, normal);
            body.orbit.is_dirty = true;
        }
    }

    /// Give a body the circular-orbit velocity around its attractor.
    ///
    /// The orbit plane is kept. Without a direction the current sense of
    /// rotation is kept as well; with one, the sense is chosen relative to
    /// the ecliptic normal. Returns whether the velocity was changed, which
    /// it is not for a body without an attractor.
    pub fn make_orbit_circular(
        &mut self,
        id: BodyId,
        direction: Option<OrbitDirection>,
    ) -> Result<bool, SimulationError> {
        let idx = self.index_of(id)?;
        let Some(attractor_idx) = self.attractor_index(idx) else {
            debug!("Can't circularise orbit of {}: no attractor", id);
            return Ok(false);
        };
        if self.bodies[idx].orbit.is_dirty {
            self.recalculate_orbit(idx);
        }

        let orbit_normal = self.bodies[idx].orbit.orbit_normal;
        let alignment = orbit_normal.dot(self.ecliptic_normal);
        let mut normal = if (orbit_normal.length_squared() - 1.0).abs() > 0.5 {
            self.ecliptic_normal
        } else {
            orbit_normal
        };
        if let Some(direction) = direction {
            let keep = match direction {
                OrbitDirection::Clockwise => alignment >= 0.0,
                OrbitDirection::CounterClockwise => alignment < 0.0,
            };
            if !keep {
                normal = -normal;
            }
        }

        let attractor = &self.bodies[attractor_idx];
        let relative_velocity = circle_orbit_velocity(
            attractor.position,
            self.bodies[idx].position,
            attractor.mass,
            normal,
            self.gravitational_constant,
        );
        let velocity = attractor.velocity + relative_velocity;
        let body = &mut self.bodies[idx];
        if body.velocity == velocity {
            return Ok(false);
        }
        body.velocity = velocity;
        body.orbit.is_dirty = true;
        Ok(true)
    }

    pub fn orbit(&self, id: BodyId) -> Result<&OrbitData, SimulationError> {
        let idx = self.index_of(id)?;
        Ok(&self.bodies[idx].orbit)
    }

    /// Whether the body has an attractor and a valid orbit around it.
    pub fn is_orbit_valid(&self, id: BodyId) -> Result<bool, SimulationError> {
        let idx = self.index_of(id)?;
        Ok(self.attractor_index(idx).is_some() && self.bodies[idx].orbit.is_valid())
    }

    /// Attractor position and orbit, if the body has a valid one.
    fn world_orbit(&self, id: BodyId) -> Result<Option<(DVec3, &OrbitData)>, SimulationError> {
        let idx = self.index_of(id)?;
        let orbit = &self.bodies[idx].orbit;
        Ok(self
            .attractor_index(idx)
            .filter(|_| orbit.is_valid())
            .map(|a| (self.bodies[a].position, orbit)))
    }

    /// World position of the occupied focus, i.e. the attractor.
    pub fn orbit_focus_point(&self, id: BodyId) -> Result<Option<DVec3>, SimulationError> {
        Ok(self.world_orbit(id)?.map(|(focus, _)| focus))
    }

    pub fn orbit_center_point(&self, id: BodyId) -> Result<Option<DVec3>, SimulationError> {
        Ok(self.world_orbit(id)?.map(|(focus, orbit)| focus + orbit.center_point))
    }

    pub fn periapsis_point(&self, id: BodyId) -> Result<Option<DVec3>, SimulationError> {
        Ok(self.world_orbit(id)?.map(|(focus, orbit)| focus + orbit.periapsis))
    }

    /// World apoapsis; all components are infinite for hyperbolic orbits.
    pub fn apoapsis_point(&self, id: BodyId) -> Result<Option<DVec3>, SimulationError> {
        Ok(self.world_orbit(id)?.map(|(focus, orbit)| focus + orbit.apoapsis))
    }

    pub fn ascending_node_point(&self, id: BodyId) -> Result<Option<DVec3>, SimulationError> {
        Ok(self
            .world_orbit(id)?
            .and_then(|(focus, orbit)| orbit.ascending_node().map(|node| focus + node)))
    }

    pub fn descending_node_point(&self, id: BodyId) -> Result<Option<DVec3>, SimulationError> {
        Ok(self
            .world_orbit(id)?
            .and_then(|(focus, orbit)| orbit.descending_node().map(|node| focus + node)))
    }

    /// Centre of mass of the body and its attractor.
    pub fn center_of_mass_with_attractor(&self, id: BodyId) -> Result<Option<DVec3>, SimulationError> {
        let idx = self.index_of(id)?;
        let body = &self.bodies[idx];
        Ok(self.attractor_index(idx).map(|a| {
            let attractor = &self.bodies[a];
            center_of_mass(body.position, body.mass, attractor.position, attractor.mass)
        }))
    }

    /// Sampled orbit curve.
    ///
    /// With `local_space` the points are relative to the attractor (or to the
    /// body itself when it has none). A body without attractor or with an
    /// invalid orbit yields a straight path along its velocity.
    pub fn orbit_points(
        &self,
        id: BodyId,
        points_count: usize,
        max_distance: f64,
        local_space: bool,
    ) -> Result<OrbitPoints, SimulationError> {
        let idx = self.index_of(id)?;
        let body = &self.bodies[idx];
        if let Some((focus, orbit)) = self.world_orbit(id)? {
            let origin = if local_space { DVec3::ZERO } else { focus };
            return Ok(orbit.orbit_points_around(points_count, origin, max_distance));
        }
        let center = if local_space { DVec3::ZERO } else { body.position };
        Ok(OrbitPoints::straight_line(center, body.velocity, max_distance))
    }

    /// Normal of the plane the body is moving in.
    ///
    /// The orbit normal when the orbit is valid; otherwise a normal built from
    /// the velocity and the ecliptic normal, or the ecliptic normal itself for
    /// a body at rest.
    pub fn velocity_plane_normal(&self, id: BodyId) -> Result<DVec3, SimulationError> {
        if let Some((_, orbit)) = self.world_orbit(id)? {
            return Ok(orbit.orbit_normal);
        }
        let velocity = self.bodies[self.index_of(id)?].velocity;
        if velocity.length_squared() > 1e-3 {
            let direction = velocity.normalize();
            let in_plane = cross(direction, self.ecliptic_normal);
            return Ok(cross(in_plane, direction));
        }
        Ok(self.ecliptic_normal)
    }

    pub fn set_eccentricity(&mut self, id: BodyId, eccentricity: f64) -> Result<(), SimulationError> {
        self.edit_orbit(id, |orbit| {
            orbit.set_eccentricity(eccentricity);
            Ok(())
        })
    }

    pub fn set_mean_anomaly(&mut self, id: BodyId, mean_anomaly: f64) -> Result<(), SimulationError> {
        self.edit_orbit(id, |orbit| {
            orbit.set_mean_anomaly(mean_anomaly);
            Ok(())
        })
    }

    pub fn set_true_anomaly(&mut self, id: BodyId, true_anomaly: f64) -> Result<(), SimulationError> {
        self.edit_orbit(id, |orbit| {
            orbit.set_true_anomaly(true_anomaly);
            Ok(())
        })
    }

    pub fn set_eccentric_anomaly(
        &mut self,
        id: BodyId,
        eccentric_anomaly: f64,
    ) -> Result<(), SimulationError> {
        self.edit_orbit(id, |orbit| {
            orbit.set_eccentric_anomaly(eccentric_anomaly);
            Ok(())
        })
    }

    /// Rotate the orbit around its focus.
    pub fn rotate_orbit(&mut self, id: BodyId, angle_rad: f64, axis: DVec3) -> Result<(), SimulationError> {
        self.edit_orbit(id, |orbit| Ok(orbit.rotate(angle_rad, axis)?))
    }

    /// Edit a body's orbit in place and write the resulting state back.
    ///
    /// A dirty orbit is recalculated first. No-op for a body without
    /// attractor.
    fn edit_orbit(
        &mut self,
        id: BodyId,
        change: impl FnOnce(&mut OrbitData) -> Result<(), SimulationError>,
    ) -> Result<(), SimulationError> {
        let idx = self.index_of(id)?;
        let Some(attractor_idx) = self.attractor_index(idx) else {
            return Ok(());
        };
        if self.bodies[idx].orbit.is_dirty {
            self.recalculate_orbit(idx);
        }
        change(&mut self.bodies[idx].orbit)?;
        self.write_back_orbit_state(idx, attractor_idx);
        Ok(())
    }
}
