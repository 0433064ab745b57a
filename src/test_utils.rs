//! Test utilities for orbital mechanics tests.
//!
//! Provides fixtures for building orbits and bodies in scene units, and
//! assertions for physical invariants like energy and angular momentum
//! conservation.

use bevy::math::DVec3;

use crate::body::Body;
use crate::orbit::OrbitData;
use crate::types::{DEFAULT_ECLIPTIC_NORMAL, DEFAULT_ECLIPTIC_UP};

/// Fixtures for creating test orbits and bodies.
pub mod fixtures {
    use super::*;

    fn orbit_from(position: DVec3, velocity: DVec3, attractor_mass: f64, g: f64) -> OrbitData {
        let mut orbit = OrbitData::default();
        orbit
            .recalculate(
                position,
                velocity,
                attractor_mass,
                g,
                DEFAULT_ECLIPTIC_NORMAL,
                DEFAULT_ECLIPTIC_UP,
            )
            .expect("fixture parameters are valid");
        orbit
    }

    /// Circular orbit of radius `radius` in the XY plane, starting on +X.
    pub fn circular_orbit(radius: f64, attractor_mass: f64, g: f64) -> OrbitData {
        let speed = (g * attractor_mass / radius).sqrt();
        orbit_from(DVec3::new(radius, 0.0, 0.0), DVec3::new(0.0, speed, 0.0), attractor_mass, g)
    }

    /// Elliptic orbit starting at periapsis on +X.
    pub fn elliptic_orbit_at_periapsis(
        periapsis: f64,
        eccentricity: f64,
        attractor_mass: f64,
        g: f64,
    ) -> OrbitData {
        assert!(
            (0.0..1.0).contains(&eccentricity),
            "Eccentricity must be in [0, 1) for an elliptic orbit"
        );
        orbit_from(
            DVec3::new(periapsis, 0.0, 0.0),
            DVec3::new(0.0, periapsis_speed(periapsis, eccentricity, attractor_mass, g), 0.0),
            attractor_mass,
            g,
        )
    }

    /// Hyperbolic orbit starting at periapsis on +X.
    pub fn hyperbolic_orbit_at_periapsis(
        periapsis: f64,
        eccentricity: f64,
        attractor_mass: f64,
        g: f64,
    ) -> OrbitData {
        assert!(eccentricity > 1.0, "Eccentricity must exceed 1 for a hyperbolic orbit");
        orbit_from(
            DVec3::new(periapsis, 0.0, 0.0),
            DVec3::new(0.0, periapsis_speed(periapsis, eccentricity, attractor_mass, g), 0.0),
            attractor_mass,
            g,
        )
    }

    /// Speed at periapsis for a given eccentricity: `sqrt(μ(1 + e)/r_p)`.
    pub fn periapsis_speed(periapsis: f64, eccentricity: f64, attractor_mass: f64, g: f64) -> f64 {
        (g * attractor_mass * (1.0 + eccentricity) / periapsis).sqrt()
    }

    /// Fixed heavy body at the origin.
    pub fn star(mass: f64) -> Body {
        Body::new("star", mass, DVec3::ZERO, DVec3::ZERO).fixed()
    }

    /// Light body on a circular orbit around a star at the origin.
    pub fn planet(radius: f64, star_mass: f64, g: f64) -> Body {
        let speed = (g * star_mass / radius).sqrt();
        Body::new(
            "planet",
            1.0,
            DVec3::new(radius, 0.0, 0.0),
            DVec3::new(0.0, speed, 0.0),
        )
    }
}

/// Assertions for verifying physical invariants.
pub mod assertions {
    use super::*;

    /// Specific orbital energy `v²/2 - μ/r`.
    pub fn orbital_energy(pos: DVec3, vel: DVec3, mu: f64) -> f64 {
        0.5 * vel.length_squared() - mu / pos.length()
    }

    /// Specific angular momentum vector `r × v`.
    pub fn angular_momentum(pos: DVec3, vel: DVec3) -> DVec3 {
        pos.cross(vel)
    }

    /// Assert that energy is conserved within a relative tolerance.
    ///
    /// # Panics
    /// Panics if the relative drift exceeds `tolerance`.
    pub fn assert_energy_conserved(initial_energy: f64, final_energy: f64, tolerance: f64) {
        let drift = if initial_energy.abs() > 1e-10 {
            ((final_energy - initial_energy) / initial_energy).abs()
        } else {
            (final_energy - initial_energy).abs()
        };
        assert!(
            drift <= tolerance,
            "Energy not conserved: initial={initial_energy:.6e}, final={final_energy:.6e}, drift={drift:.6e}, tolerance={tolerance:.6e}"
        );
    }

    /// Assert that the angular momentum vector is conserved within a relative tolerance.
    pub fn assert_angular_momentum_conserved(initial_l: DVec3, final_l: DVec3, tolerance: f64) {
        let scale = initial_l.length().max(1e-10);
        let drift = (final_l - initial_l).length() / scale;
        assert!(
            drift <= tolerance,
            "Angular momentum not conserved: initial={initial_l:?}, final={final_l:?}, drift={drift:.6e}, tolerance={tolerance:.6e}"
        );
    }

    /// Kepler's third law, `T = 2π·sqrt(a³/μ)`.
    pub fn orbital_period(semi_major_axis: f64, mu: f64) -> f64 {
        use std::f64::consts::TAU;
        TAU * (semi_major_axis.powi(3) / mu).sqrt()
    }

    pub fn escape_velocity(distance: f64, mu: f64) -> f64 {
        (2.0 * mu / distance).sqrt()
    }
}

/// Utilities for creating headless Bevy apps for testing.
pub mod bevy_test {
    use bevy::prelude::*;

    /// Create a minimal Bevy app for testing without rendering.
    pub fn headless_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_circular_fixture_is_bound() {
        let orbit = fixtures::circular_orbit(10.0, 1000.0, 1.0);
        let energy = assertions::orbital_energy(orbit.position, orbit.velocity, orbit.mg());
        assert!(energy < 0.0);
        assert_relative_eq!(
            orbit.period,
            assertions::orbital_period(10.0, 1000.0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_hyperbolic_fixture_is_unbound() {
        let orbit = fixtures::hyperbolic_orbit_at_periapsis(10.0, 1.5, 1000.0, 1.0);
        assert!(orbit.velocity.length() > assertions::escape_velocity(10.0, 1000.0));
    }

    #[test]
    fn test_planet_fixture_speed() {
        let planet = fixtures::planet(25.0, 1e4, 0.01);
        assert_relative_eq!(planet.velocity.length(), 2.0, max_relative = 1e-12);
    }
}
