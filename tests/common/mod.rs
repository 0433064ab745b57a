//! Common test utilities for integration tests.

#![allow(dead_code)]

use bevy::math::DVec3;
use celestial::orbit::circle_orbit_velocity;
use celestial::{Body, BodyId, Simulation};

pub const STAR_MASS: f64 = 1e6;
pub const ORBIT_RADIUS: f64 = 100.0;

/// Simulation with `G = 1` and nothing else in it.
pub fn unit_simulation() -> Simulation {
    let mut sim = Simulation::new();
    sim.set_gravitational_constant(1.0)
        .expect("1.0 is a valid gravitational constant");
    sim
}

/// Fixed star at the origin with one planet on a circular orbit in the XY plane.
///
/// `speed_factor` scales the circular speed, so values other than 1 give an
/// ellipse with the planet at periapsis (> 1) or apoapsis (< 1).
pub fn star_and_planet(speed_factor: f64, kepler: bool) -> (Simulation, BodyId, BodyId) {
    let mut sim = unit_simulation();
    let star = sim
        .add_body(Body::new("star", STAR_MASS, DVec3::ZERO, DVec3::ZERO).fixed())
        .expect("valid star");
    let position = DVec3::new(ORBIT_RADIUS, 0.0, 0.0);
    let velocity =
        circle_orbit_velocity(DVec3::ZERO, position, STAR_MASS, DVec3::Z, 1.0) * speed_factor;
    let mut planet = Body::new("planet", 1.0, position, velocity).with_attractor(star);
    if kepler {
        planet = planet.with_kepler_motion();
    }
    let planet = sim.add_body(planet).expect("valid planet");
    (sim, star, planet)
}

/// Specific orbital energy around a body of gravitational parameter `mu`.
pub fn orbital_energy(pos: DVec3, vel: DVec3, mu: f64) -> f64 {
    0.5 * vel.length_squared() - mu / pos.length()
}

/// Specific angular momentum vector.
pub fn angular_momentum(pos: DVec3, vel: DVec3) -> DVec3 {
    pos.cross(vel)
}

/// Orbital period for a semi-major axis.
pub fn orbital_period(semi_major_axis: f64, mu: f64) -> f64 {
    use std::f64::consts::TAU;
    TAU * (semi_major_axis.powi(3) / mu).sqrt()
}
