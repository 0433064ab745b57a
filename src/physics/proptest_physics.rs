//! Property-based tests for gravity and the N-body integrators.
//!
//! These tests verify physical invariants across a wide range of orbital parameters.

use bevy::math::DVec3;
use proptest::prelude::*;

use super::*;
use crate::body::Body;
use crate::test_utils::{assertions, fixtures};
use crate::types::BodyId;

const G: f64 = 1.0;
const STAR_MASS: f64 = 1e4;

fn star_source() -> [AttractorSource; 1] {
    [AttractorSource {
        id: BodyId(u64::MAX),
        position: DVec3::ZERO,
        mg: G * STAR_MASS,
        max_range: f64::INFINITY,
    }]
}

fn integrator_kind() -> impl Strategy<Value = IntegratorKind> {
    prop_oneof![
        Just(IntegratorKind::Euler),
        Just(IntegratorKind::Verlet),
        Just(IntegratorKind::RungeKutta),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(60))]

    /// Energy drift over one orbit stays small for the Verlet scheme.
    ///
    /// For a body around a fixed central mass the specific orbital energy
    /// E = v²/2 - μ/r should be conserved.
    #[test]
    fn prop_verlet_energy_conservation_one_orbit(
        periapsis in 5.0f64..50.0,
        eccentricity in 0.0f64..0.5,
    ) {
        let mu = G * STAR_MASS;
        let speed = fixtures::periapsis_speed(periapsis, eccentricity, STAR_MASS, G);
        let mut body = Body::new("probe", 1.0, DVec3::new(periapsis, 0.0, 0.0), DVec3::new(0.0, speed, 0.0));
        let initial_energy = assertions::orbital_energy(body.position, body.velocity, mu);

        let a = periapsis / (1.0 - eccentricity);
        let period = assertions::orbital_period(a, mu);
        let steps = 20_000;
        let dt = period / steps as f64;
        let sources = star_source();
        let range = AttractionRange::default();
        for _ in 0..steps {
            verlet_step(&mut body, dt, &sources, &range);
        }

        let final_energy = assertions::orbital_energy(body.position, body.velocity, mu);
        let drift = ((final_energy - initial_energy) / initial_energy).abs();
        prop_assert!(
            drift < 0.01,
            "Energy drift {:.4}% exceeds 1% tolerance (e={}, a={})",
            drift * 100.0, eccentricity, a
        );
    }

    /// Angular momentum about a single central attractor is conserved.
    #[test]
    fn prop_angular_momentum_conservation(
        periapsis in 5.0f64..50.0,
        eccentricity in 0.0f64..0.5,
        kind in integrator_kind(),
    ) {
        let mu = G * STAR_MASS;
        let speed = fixtures::periapsis_speed(periapsis, eccentricity, STAR_MASS, G);
        let mut body = Body::new("probe", 1.0, DVec3::new(periapsis, 0.0, 0.0), DVec3::new(0.0, speed, 0.0));
        let initial_l = assertions::angular_momentum(body.position, body.velocity);

        let period = assertions::orbital_period(periapsis / (1.0 - eccentricity), mu);
        let steps = 2_000;
        let dt = period / 4.0 / steps as f64;
        let sources = star_source();
        let range = AttractionRange::default();
        for _ in 0..steps {
            integrate(kind, &mut body, dt, &sources, &range);
        }

        let final_l = assertions::angular_momentum(body.position, body.velocity);
        // Direction never leaves the z axis for planar motion
        prop_assert!(final_l.x.abs() < 1e-9 && final_l.y.abs() < 1e-9);
        let drift = ((final_l.z - initial_l.z) / initial_l.z).abs();
        prop_assert!(drift < 0.01, "{:?}: angular momentum drift {:.4}%", kind, drift * 100.0);
    }

    /// Pull between two attractors is equal and opposite.
    #[test]
    fn prop_acceleration_antisymmetric(
        ax in -100.0f64..100.0, ay in -100.0f64..100.0, az in -100.0f64..100.0,
        bx in -100.0f64..100.0, by in -100.0f64..100.0, bz in -100.0f64..100.0,
        mg in 0.1f64..1e6,
    ) {
        let a = DVec3::new(ax, ay, az);
        let b = DVec3::new(bx, by, bz);
        let ab = acceleration_at(a, b, mg, 0.1, 0.0);
        let ba = acceleration_at(b, a, mg, 0.1, 0.0);
        prop_assert!((ab + ba).length() <= 1e-12 * ab.length().max(1.0));
    }

    /// Integrators never emit non-finite state, even when started next to an attractor.
    #[test]
    fn prop_integrators_stay_finite(
        x in -1.0f64..1.0, y in -1.0f64..1.0,
        vx in -1e3f64..1e3, vy in -1e3f64..1e3,
        dt in 1e-4f64..10.0,
        kind in integrator_kind(),
    ) {
        let mut body = Body::new("probe", 1.0, DVec3::new(x, y, 0.0), DVec3::new(vx, vy, 0.0));
        for _ in 0..10 {
            integrate(kind, &mut body, dt, &star_source(), &AttractionRange::default());
            prop_assert!(body.position.is_finite(), "{:?}", body.position);
            prop_assert!(body.velocity.is_finite(), "{:?}", body.velocity);
        }
    }
}

#[cfg(test)]
mod deterministic_tests {
    use super::*;

    #[test]
    fn test_two_equal_bodies_step_symmetrically() {
        let range = AttractionRange::default();
        let mut left = Body::new("left", 1000.0, DVec3::new(-1.0, 0.0, 0.0), DVec3::ZERO);
        let mut right = Body::new("right", 1000.0, DVec3::new(1.0, 0.0, 0.0), DVec3::ZERO);
        left.assign_id(BodyId(1));
        right.assign_id(BodyId(2));
        let sources = collect_attractor_sources([&left, &right], 0.01, 100.0);

        euler_step(&mut left, 0.25, &sources, &range);
        euler_step(&mut right, 0.25, &sources, &range);

        assert!((left.position + right.position).length() < 1e-15);
        assert!(left.position.x < -0.0 && left.position.x > -1.0);
    }
}
