//! Kepler equation solvers and conversions between true, eccentric and mean anomaly.
//!
//! All functions depend only on the anomaly and the eccentricity. Elliptic
//! orbits (`e < 1`) use the circular eccentric anomaly `E`; hyperbolic orbits
//! (`e >= 1`, parabolas included) use the hyperbolic anomaly `H`.

use std::f64::consts::{PI, TAU};

use crate::math::safe_acosh;

/// Residual below which the elliptic solver stops polishing.
const ELLIPTIC_TOLERANCE: f64 = 1e-13;

/// Maximum Newton polishing steps after the fixed Laguerre passes.
const ELLIPTIC_MAX_POLISH: usize = 16;

/// Step size below which the hyperbolic Newton iteration is converged.
const HYPERBOLIC_TOLERANCE: f64 = 1e-5;

/// Hard cap on hyperbolic Newton iterations.
const HYPERBOLIC_MAX_ITERATIONS: usize = 100;

/// Solve Kepler's equation `M = E - e·sin(E)` for an elliptic orbit.
///
/// Runs 2 (for `e < 0.4`) or 4 Laguerre-Conway passes starting from `E = M`,
/// then polishes with Newton steps until the residual drops below `1e-13`.
///
/// # Robustness
/// If an iteration produces a non-finite value the last finite estimate is
/// returned instead.
pub fn kepler_solver(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let passes = if eccentricity < 0.4 { 2 } else { 4 };
    let mut e_anomaly = mean_anomaly;

    for _ in 0..passes {
        let e_sin = eccentricity * e_anomaly.sin();
        let e_cos = eccentricity * e_anomaly.cos();
        let delta = e_anomaly - e_sin - mean_anomaly;
        let n = 1.0 - e_cos;
        let step = -5.0 * delta / (n + n.signum() * (16.0 * n * n - 20.0 * delta * e_sin).abs().sqrt());
        let next = e_anomaly + step;
        if !next.is_finite() {
            return e_anomaly;
        }
        e_anomaly = next;
    }

    for _ in 0..ELLIPTIC_MAX_POLISH {
        let residual = e_anomaly - eccentricity * e_anomaly.sin() - mean_anomaly;
        if residual.abs() < ELLIPTIC_TOLERANCE {
            break;
        }
        let next = e_anomaly - residual / (1.0 - eccentricity * e_anomaly.cos());
        if !next.is_finite() {
            break;
        }
        e_anomaly = next;
    }

    e_anomaly
}

/// Solve the hyperbolic Kepler equation `M = e·sinh(H) - H`.
///
/// Newton iteration seeded with Danby's guess `H₀ = ±ln(2|M|/e + 1.8)`.
/// A non-finite guess returns `M` unchanged; a non-finite step returns the
/// current estimate.
pub fn kepler_solver_hyperbolic(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let mut h_anomaly =
        mean_anomaly.signum() * (2.0 * mean_anomaly.abs() / eccentricity + 1.8).ln();
    if mean_anomaly == 0.0 {
        h_anomaly = 0.0;
    }
    if !h_anomaly.is_finite() {
        return mean_anomaly;
    }

    for _ in 0..HYPERBOLIC_MAX_ITERATIONS {
        let delta = (eccentricity * h_anomaly.sinh() - h_anomaly - mean_anomaly)
            / (eccentricity * h_anomaly.cosh() - 1.0);
        if !delta.is_finite() {
            return h_anomaly;
        }
        h_anomaly -= delta;
        if delta.abs() <= HYPERBOLIC_TOLERANCE {
            break;
        }
    }

    h_anomaly
}

/// Mean anomaly to eccentric (or hyperbolic) anomaly.
pub fn mean_to_eccentric(mean_anomaly: f64, eccentricity: f64) -> f64 {
    if eccentricity < 1.0 {
        kepler_solver(mean_anomaly, eccentricity)
    } else {
        kepler_solver_hyperbolic(mean_anomaly, eccentricity)
    }
}

/// Eccentric (or hyperbolic) anomaly to mean anomaly.
pub fn eccentric_to_mean(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    if eccentricity < 1.0 {
        eccentric_anomaly - eccentricity * eccentric_anomaly.sin()
    } else {
        eccentricity * eccentric_anomaly.sinh() - eccentric_anomaly
    }
}

/// Eccentric (or hyperbolic) anomaly to true anomaly.
///
/// Elliptic results lie in `[0, 2π)`; hyperbolic results in `(-π, π)`.
pub fn eccentric_to_true(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    let e = eccentricity;
    if e < 1.0 {
        // atan2 keeps the full quadrant, atan alone only covers [-π/2, π/2]
        let half = eccentric_anomaly / 2.0;
        let y = (1.0 + e).sqrt() * half.sin();
        let x = (1.0 - e).sqrt() * half.cos();
        (2.0 * y.atan2(x)).rem_euclid(TAU)
    } else {
        ((e * e - 1.0).sqrt() * eccentric_anomaly.sinh()).atan2(e - eccentric_anomaly.cosh())
    }
}

/// True anomaly to eccentric (or hyperbolic) anomaly.
///
/// Elliptic results lie in `[0, 2π)`. For hyperbolic orbits the true anomaly
/// is first normalised into `(-π, π]`; angles beyond the asymptote collapse
/// to zero through [`safe_acosh`].
pub fn true_to_eccentric(true_anomaly: f64, eccentricity: f64) -> f64 {
    let e = eccentricity;
    if e < 1.0 {
        let half = true_anomaly.rem_euclid(TAU) / 2.0;
        let y = (1.0 - e).sqrt() * half.sin();
        let x = (1.0 + e).sqrt() * half.cos();
        (2.0 * y.atan2(x)).rem_euclid(TAU)
    } else {
        let t = wrap_signed(true_anomaly);
        let cos_t = t.cos();
        safe_acosh((e + cos_t) / (1.0 + e * cos_t)) * t.signum()
    }
}

pub fn mean_to_true(mean_anomaly: f64, eccentricity: f64) -> f64 {
    eccentric_to_true(mean_to_eccentric(mean_anomaly, eccentricity), eccentricity)
}

pub fn true_to_mean(true_anomaly: f64, eccentricity: f64) -> f64 {
    eccentric_to_mean(true_to_eccentric(true_anomaly, eccentricity), eccentricity)
}

/// True anomaly at which the orbit reaches `distance` from its focus.
///
/// Returns `π` when the distance is never reached.
pub fn true_anomaly_for_distance(distance: f64, eccentricity: f64, semi_major_axis: f64) -> f64 {
    let compression = if eccentricity < 1.0 {
        1.0 - eccentricity * eccentricity
    } else {
        eccentricity * eccentricity - 1.0
    };
    let arg = (semi_major_axis * compression - distance) / (distance * eccentricity);
    if !(-1.0..=1.0).contains(&arg) {
        PI
    } else {
        arg.acos()
    }
}

/// Asymptote angle of a hyperbolic orbit, `acos(-1/e)`.
#[inline]
pub fn hyperbolic_asymptote(eccentricity: f64) -> f64 {
    (-1.0 / eccentricity).clamp(-1.0, 1.0).acos()
}

/// Normalise an angle into `(-π, π]`.
#[inline]
pub fn wrap_signed(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}
