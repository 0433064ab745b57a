//! Property-based tests for orbit elements and anomaly conversions.

use std::f64::consts::TAU;

use bevy::math::DVec3;
use proptest::prelude::*;

use super::*;
use crate::types::{DEFAULT_ECLIPTIC_NORMAL, DEFAULT_ECLIPTIC_UP};

fn elliptic_eccentricity() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(0.3), Just(0.7), Just(0.99), 0.0f64..0.99]
}

fn hyperbolic_eccentricity() -> impl Strategy<Value = f64> {
    prop_oneof![Just(1.2), Just(2.5), Just(5.0), 1.05f64..8.0]
}

fn vector(range: f64) -> impl Strategy<Value = DVec3> {
    (-range..range, -range..range, -range..range).prop_map(|(x, y, z)| DVec3::new(x, y, z))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// True → eccentric → true returns the starting angle on elliptic orbits.
    #[test]
    fn prop_elliptic_anomaly_roundtrip(
        e in elliptic_eccentricity(),
        t in 0.0f64..TAU,
    ) {
        let back = eccentric_to_true(true_to_eccentric(t, e), e);
        prop_assert!(
            wrap_signed(back - t).abs() < 1e-6,
            "e={}, t={}, back={}", e, t, back
        );
    }

    /// Same round trip on hyperbolic orbits, inside the asymptotes.
    #[test]
    fn prop_hyperbolic_anomaly_roundtrip(
        e in hyperbolic_eccentricity(),
        fraction in -0.99f64..0.99,
    ) {
        let t = fraction * hyperbolic_asymptote(e);
        let back = eccentric_to_true(true_to_eccentric(t, e), e);
        prop_assert!((back - t).abs() < 1e-6, "e={}, t={}, back={}", e, t, back);
    }

    /// The elliptic solver satisfies Kepler's equation.
    #[test]
    fn prop_kepler_solver_converges(
        m in 0.0f64..TAU,
        e in 0.0f64..0.95,
    ) {
        let big_e = mean_to_eccentric(m, e);
        let residual = big_e - e * big_e.sin() - m;
        prop_assert!(residual.abs() < 1e-9, "M={}, e={}, residual={}", m, e, residual);
    }

    /// Circular orbit period matches 2π·sqrt(a³/GM).
    #[test]
    fn prop_circular_period(
        radius in 0.5f64..1e4,
        mass in 1.0f64..1e8,
        g in 1e-4f64..10.0,
    ) {
        let speed = (g * mass / radius).sqrt();
        let mut orbit = OrbitData::default();
        orbit.recalculate(
            DVec3::new(radius, 0.0, 0.0),
            DVec3::new(0.0, speed, 0.0),
            mass,
            g,
            DEFAULT_ECLIPTIC_NORMAL,
            DEFAULT_ECLIPTIC_UP,
        ).unwrap();
        let expected = TAU * (radius.powi(3) / (g * mass)).sqrt();
        prop_assert!(
            ((orbit.period - expected) / expected).abs() < 1e-6,
            "period {} vs {}", orbit.period, expected
        );
    }

    /// Recalculating twice from the same inputs gives identical elements.
    #[test]
    fn prop_recalculate_idempotent(
        p in vector(50.0),
        v in vector(10.0),
        mass in 1.0f64..1e6,
    ) {
        let mut orbit = OrbitData::default();
        orbit.recalculate(p, v, mass, 0.01, DEFAULT_ECLIPTIC_NORMAL, DEFAULT_ECLIPTIC_UP).unwrap();
        let first = orbit;
        orbit.recalculate(p, v, mass, 0.01, DEFAULT_ECLIPTIC_NORMAL, DEFAULT_ECLIPTIC_UP).unwrap();
        prop_assert_eq!(first, orbit);
    }

    /// Elements rebuilt from position/velocity reproduce that position/velocity.
    #[test]
    fn prop_state_roundtrip(
        p in vector(20.0),
        v in vector(5.0),
    ) {
        prop_assume!(p.length() > 0.5 && v.length() > 0.05);
        prop_assume!(p.cross(v).length() > 1e-3 * p.length() * v.length());
        let mut orbit = OrbitData::default();
        orbit.recalculate(p, v, 1000.0, 0.01, DEFAULT_ECLIPTIC_NORMAL, DEFAULT_ECLIPTIC_UP).unwrap();
        prop_assume!((orbit.eccentricity - 1.0).abs() > 1e-3);

        let mut rebuilt = orbit;
        rebuilt.sync_state_with_anomaly();
        prop_assert!(
            (rebuilt.position - p).length() < 1e-6 * p.length(),
            "position {:?} vs {:?} (e={})", rebuilt.position, p, orbit.eccentricity
        );
        prop_assert!(
            (rebuilt.velocity - v).length() < 1e-6 * v.length(),
            "velocity {:?} vs {:?} (e={})", rebuilt.velocity, v, orbit.eccentricity
        );
    }

    /// Advancing never introduces non-finite state.
    #[test]
    fn prop_advance_stays_finite(
        p in vector(20.0),
        v in vector(5.0),
        dt in 0.0f64..100.0,
    ) {
        prop_assume!(p.length() > 0.5);
        let mut orbit = OrbitData::default();
        orbit.recalculate(p, v, 1000.0, 0.01, DEFAULT_ECLIPTIC_NORMAL, DEFAULT_ECLIPTIC_UP).unwrap();
        prop_assume!(orbit.is_valid());
        orbit.advance(dt);
        prop_assert!(orbit.position.is_finite(), "{:?}", orbit);
        prop_assert!(orbit.velocity.is_finite(), "{:?}", orbit);
    }
}
