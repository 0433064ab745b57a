//! Gravity and N-body integration.
//!
//! Pure functions: nothing here looks up bodies by handle or touches the
//! simulation registry. The caller snapshots its attractors with
//! [`collect_attractor_sources`] and then steps each body against that
//! snapshot.

mod gravity;
mod integrator;

#[cfg(test)]
mod proptest_physics;

pub use gravity::{
    acceleration_at, compute_acceleration_from_sources, relative_perturbation_ratio,
    AttractionRange, AttractorSource,
};
pub use integrator::{euler_step, integrate, rk4_step, verlet_step, IntegratorKind};

use crate::body::Body;

/// Snapshot of every active body heavy enough to attract others.
pub fn collect_attractor_sources<'a>(
    bodies: impl IntoIterator<Item = &'a Body>,
    gravitational_constant: f64,
    min_attractor_mass: f64,
) -> Vec<AttractorSource> {
    bodies
        .into_iter()
        .filter(|body| body.is_active && body.mass >= min_attractor_mass)
        .map(|body| AttractorSource {
            id: body.id(),
            position: body.position,
            mg: body.mg(gravitational_constant),
            max_range: body.max_attraction_range,
        })
        .collect()
}
