//! The per-tick step.
//!
//! Order within one tick:
//! 1. queued attractor requests are resolved;
//! 2. continuous attractor searches run;
//! 3. bodies are projected onto the ecliptic, if enabled;
//! 4. orbits whose attractor changed mass are marked dirty;
//! 5. Keplerian bodies are propagated along their orbits;
//! 6. attractors are snapshotted and every other body is integrated;
//! 7. every orbit still dirty is recalculated once.
//!
//! Nothing here returns an error. Invalid attractors demote a body to N-body
//! integration for the tick and non-finite velocities are zeroed.

use bevy::log::{debug, warn};

use super::Simulation;
use crate::physics::{collect_attractor_sources, integrate};
use crate::types::MotionState;

impl Simulation {
    /// Advance the simulation by `delta_time` seconds of host time.
    ///
    /// Physics time is `delta_time * time_scale`; continuous attractor
    /// searches count host time. Ignored while paused or for a negative or
    /// non-finite `delta_time`.
    pub fn tick(&mut self, delta_time: f64) {
        if self.paused || !delta_time.is_finite() || delta_time < 0.0 {
            return;
        }
        let dt = delta_time * self.time_scale;

        self.resolve_attractor_requests();
        self.run_attractor_searches(delta_time);
        if self.keep_bodies_on_ecliptic {
            self.project_all_onto_ecliptic();
        }
        self.mark_changed_attractor_masses();
        self.kepler_pass(dt);
        self.n_body_pass(dt);
        self.refresh_dirty_orbits();
    }

    fn mark_changed_attractor_masses(&mut self) {
        for idx in 0..self.bodies.len() {
            if let Some(attractor_idx) = self.attractor_index(idx) {
                let attractor_mass = self.bodies[attractor_idx].mass;
                let orbit = &mut self.bodies[idx].orbit;
                if orbit.attractor_mass != attractor_mass {
                    orbit.is_dirty = true;
                }
            }
        }
    }

    fn kepler_pass(&mut self, dt: f64) {
        for idx in 0..self.bodies.len() {
            let body = &mut self.bodies[idx];
            if !body.is_active || body.is_fixed_position {
                body.motion_state = MotionState::Idle;
                continue;
            }
            if !body.wants_kepler_motion() {
                continue;
            }
            let Some(attractor_id) = body.attractor else {
                body.terminate_kepler_motion();
                continue;
            };

            let Some(attractor_idx) = self.attractor_index(idx) else {
                let body = &mut self.bodies[idx];
                warn!(
                    "Attractor {} of '{}' ({}) no longer exists, switching to N-body motion",
                    attractor_id,
                    body.name,
                    body.id()
                );
                body.attractor = None;
                body.terminate_kepler_motion();
                body.orbit.is_dirty = true;
                continue;
            };

            let attractor_mass = self.bodies[attractor_idx].mass;
            let body = &mut self.bodies[idx];
            if attractor_mass < body.mass {
                warn!(
                    "Attractor {} of '{}' ({}) is lighter than the body, detaching",
                    attractor_id,
                    body.name,
                    body.id()
                );
                body.attractor = None;
                body.terminate_kepler_motion();
                body.orbit.is_dirty = true;
                continue;
            }

            let was_dirty = body.orbit.is_dirty;
            if was_dirty {
                self.recalculate_orbit(idx);
            }

            let body = &mut self.bodies[idx];
            if !body.orbit.is_valid() {
                debug!(
                    "Orbit of '{}' ({}) is degenerate, switching to N-body motion",
                    body.name,
                    body.id()
                );
                body.terminate_kepler_motion();
                continue;
            }
            if !was_dirty {
                body.orbit.advance(dt);
            }
            body.motion_state = MotionState::KeplerianPropagation;
            self.write_back_orbit_state(idx, attractor_idx);
        }
    }

    fn n_body_pass(&mut self, dt: f64) {
        let sources = collect_attractor_sources(
            &self.bodies,
            self.gravitational_constant,
            self.min_attractor_mass,
        );
        let kind = self.integrator;
        let range = self.attraction_range;
        for body in &mut self.bodies {
            if !body.is_active || body.is_fixed_position || body.wants_kepler_motion() {
                continue;
            }
            integrate(kind, body, dt, &sources, &range);
            body.motion_state = MotionState::NBodyIntegration;
            if body.use_kepler_motion {
                // Retry Keplerian propagation next tick
                body.is_kepler_motion = true;
            }
        }
    }

    fn refresh_dirty_orbits(&mut self) {
        for idx in 0..self.bodies.len() {
            if self.bodies[idx].orbit.is_dirty {
                self.recalculate_orbit(idx);
            }
        }
    }
}
