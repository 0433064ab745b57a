//! Numerical integrators for N-body motion.
//!
//! Each step advances one body against a fixed snapshot of attractors. The
//! three schemes share the same bookkeeping: queued external velocity is
//! folded in after the force update, non-finite velocity is reset to zero,
//! and the body's orbit is marked dirty.

use bevy::log::warn;
use bevy::math::DVec3;
use serde::{Deserialize, Serialize};

use super::gravity::{acceleration_at, compute_acceleration_from_sources, AttractionRange, AttractorSource};
use crate::body::Body;

/// Integration scheme for bodies that are not on Keplerian rails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    /// Velocity update, then full position update.
    Euler,
    /// Half drift, kick, half drift.
    #[default]
    Verlet,
    /// Four-stage Runge-Kutta on the velocity increment between two half drifts.
    RungeKutta,
}

/// Advance `body` by `dt` with the chosen scheme.
pub fn integrate(
    kind: IntegratorKind,
    body: &mut Body,
    dt: f64,
    sources: &[AttractorSource],
    range: &AttractionRange,
) {
    match kind {
        IntegratorKind::Euler => euler_step(body, dt, sources, range),
        IntegratorKind::Verlet => verlet_step(body, dt, sources, range),
        IntegratorKind::RungeKutta => rk4_step(body, dt, sources, range),
    }
}

/// `v += Σa·dt`, then `x += v·dt`.
pub fn euler_step(body: &mut Body, dt: f64, sources: &[AttractorSource], range: &AttractionRange) {
    reset_non_finite_velocity(body);
    let acc = compute_acceleration_from_sources(body.position, Some(body.id()), sources, range);
    body.velocity += acc * dt;
    settle_velocity(body);
    body.position += body.velocity * dt;
    body.orbit.is_dirty = true;
}

/// `x += v·dt/2`, `v += a(x)·dt`, `x += v·dt/2`.
pub fn verlet_step(body: &mut Body, dt: f64, sources: &[AttractorSource], range: &AttractionRange) {
    reset_non_finite_velocity(body);
    let half_dt = dt / 2.0;
    body.position += body.velocity * half_dt;
    let acc = compute_acceleration_from_sources(body.position, Some(body.id()), sources, range);
    body.velocity += acc * dt;
    settle_velocity(body);
    body.position += body.velocity * half_dt;
    body.orbit.is_dirty = true;
}

/// Runge-Kutta velocity increment between two half drifts.
///
/// Per attractor the stages are `t1 = a(x)·dt`, `t2 = a(x + t1/2)·dt`,
/// `t3 = a(x + t2/2)·dt`, `t4 = a(x + t3)·dt`, evaluated after the first
/// half drift and combined with weights `(1, 2, 2, 1)/6`. The stage offsets
/// add velocity increments to a position, which is not textbook RK4; the
/// scheme is kept as is so scenes behave the same as their saved runs.
pub fn rk4_step(body: &mut Body, dt: f64, sources: &[AttractorSource], range: &AttractionRange) {
    reset_non_finite_velocity(body);
    let half_dt = dt / 2.0;
    body.position += body.velocity * half_dt;

    let x = body.position;
    let mut result = DVec3::ZERO;
    for source in sources {
        if source.id == body.id() {
            continue;
        }
        let max_range = range.max_for(source.max_range);
        let acc = |at: DVec3| acceleration_at(at, source.position, source.mg, range.min, max_range);
        let t1 = acc(x) * dt;
        let t2 = acc(x + t1 * 0.5) * dt;
        let t3 = acc(x + t2 * 0.5) * dt;
        let t4 = acc(x + t3) * dt;
        result += (t1 + t2 * 2.0 + t3 * 2.0 + t4) / 6.0;
    }
    body.velocity += result;
    settle_velocity(body);
    body.position += body.velocity * half_dt;
    body.orbit.is_dirty = true;
}

/// Fold in queued external velocity and drop non-finite results.
fn settle_velocity(body: &mut Body) {
    body.apply_additional_velocity();
    reset_non_finite_velocity(body);
}

fn reset_non_finite_velocity(body: &mut Body) {
    if !body.velocity.is_finite() {
        warn!(
            "Velocity of '{}' ({}) is {:?}, resetting to zero",
            body.name,
            body.id(),
            body.velocity
        );
        body.velocity = DVec3::ZERO;
    }
}
