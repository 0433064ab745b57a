//! Newtonian attraction between bodies.
//!
//! Attractors are passed around as [`AttractorSource`] snapshots so a full
//! N-body pass reads one consistent set of positions while bodies are being
//! written.

use bevy::math::DVec3;

use crate::types::{BodyId, DEFAULT_MIN_ATTRACTION_RANGE};

/// Position and gravitational parameter of one attracting body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttractorSource {
    pub id: BodyId,
    pub position: DVec3,
    /// Gravitational parameter `G·m`.
    pub mg: f64,
    /// Per-attractor range limit, `f64::INFINITY` when unbounded.
    pub max_range: f64,
}

/// Global attraction range limits.
///
/// A `max` of zero or infinity means unbounded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttractionRange {
    pub min: f64,
    pub max: f64,
}

impl Default for AttractionRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_ATTRACTION_RANGE,
            max: 0.0,
        }
    }
}

impl AttractionRange {
    /// Effective upper limit against an attractor with its own limit.
    ///
    /// Zero stands for unbounded on either side, so it never wins the minimum.
    pub fn max_for(&self, attractor_max_range: f64) -> f64 {
        let global = unbounded_as_infinity(self.max);
        let own = unbounded_as_infinity(attractor_max_range);
        let max = global.min(own);
        if max.is_infinite() { 0.0 } else { max }
    }

    /// Whether `distance` lies within the effective upper limit.
    pub fn reaches(&self, distance: f64, attractor_max_range: f64) -> bool {
        let max = self.max_for(attractor_max_range);
        max == 0.0 || distance <= max
    }
}

#[inline]
fn unbounded_as_infinity(range: f64) -> f64 {
    if range == 0.0 || range.is_nan() { f64::INFINITY } else { range }
}

/// Gravitational acceleration pulling `point` towards an attractor.
///
/// Zero when the attractor is closer than `min_range` or farther than
/// `max_range` (`max_range == 0` means unbounded).
#[inline]
pub fn acceleration_at(
    point: DVec3,
    attractor_position: DVec3,
    attractor_mg: f64,
    min_range: f64,
    max_range: f64,
) -> DVec3 {
    let distance_vector = attractor_position - point;
    let distance_squared = distance_vector.length_squared();
    if (max_range != 0.0 && distance_squared > max_range * max_range)
        || distance_squared < min_range * min_range
    {
        return DVec3::ZERO;
    }
    let distance = distance_squared.sqrt();
    distance_vector * (attractor_mg / (distance_squared * distance))
}

/// Sum of accelerations at `point` from every source except `exclude`.
#[inline]
pub fn compute_acceleration_from_sources(
    point: DVec3,
    exclude: Option<BodyId>,
    sources: &[AttractorSource],
    range: &AttractionRange,
) -> DVec3 {
    let mut acc = DVec3::ZERO;
    for source in sources {
        if Some(source.id) == exclude {
            continue;
        }
        acc += acceleration_at(
            point,
            source.position,
            source.mg,
            range.min,
            range.max_for(source.max_range),
        );
    }
    acc
}

/// How strongly `perturbing` pulls on `target` relative to `main`.
///
/// Uses the default minimum range and no upper limit. A zero main pull
/// gives infinity, unless the perturbing pull is zero too.
pub fn relative_perturbation_ratio(
    target: DVec3,
    main: &AttractorSource,
    perturbing: &AttractorSource,
) -> f64 {
    let main_acc =
        acceleration_at(target, main.position, main.mg, DEFAULT_MIN_ATTRACTION_RANGE, 0.0).length();
    let perturb_acc = acceleration_at(
        target,
        perturbing.position,
        perturbing.mg,
        DEFAULT_MIN_ATTRACTION_RANGE,
        0.0,
    )
    .length();
    if main_acc == 0.0 {
        return if perturb_acc == 0.0 { 0.0 } else { f64::INFINITY };
    }
    perturb_acc / main_acc
}
