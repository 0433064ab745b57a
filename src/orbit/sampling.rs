//! Lazy sampling of orbit curves into point sequences.

use std::f64::consts::TAU;
use std::iter::FusedIterator;

use bevy::math::DVec3;

use super::{true_anomaly_for_distance, OrbitData};

/// Velocity below which a free body gets no straight-line path.
const MIN_LINE_SPEED_SQUARED: f64 = 1e-4;

/// Finite sequence of curve points, restartable by cloning.
///
/// Built by [`OrbitData::orbit_points`] or [`OrbitPoints::straight_line`].
/// Points are computed on demand; nothing is allocated.
#[derive(Clone, Debug)]
pub struct OrbitPoints {
    orbit: OrbitData,
    origin: DVec3,
    path: Path,
    index: usize,
    count: usize,
}

#[derive(Clone, Copy, Debug)]
enum Path {
    Empty,
    /// Whole ellipse, true anomaly from 0 to 2π inclusive.
    Closed,
    /// Visible arc, true anomaly from `-max_angle` to `max_angle`.
    Arc { max_angle: f64 },
    Line { start: DVec3, step: DVec3 },
}

impl OrbitPoints {
    pub fn empty() -> Self {
        Self {
            orbit: OrbitData::default(),
            origin: DVec3::ZERO,
            path: Path::Empty,
            index: 0,
            count: 0,
        }
    }

    pub(super) fn along_orbit(
        orbit: &OrbitData,
        points_count: usize,
        origin: DVec3,
        max_distance: f64,
    ) -> Self {
        if points_count < 2 || !orbit.semi_major_axis.is_finite() {
            return Self::empty();
        }

        let path = if orbit.is_elliptic() {
            if orbit.apoapsis_distance < max_distance {
                Path::Closed
            } else {
                Path::Arc {
                    max_angle: true_anomaly_for_distance(
                        max_distance,
                        orbit.eccentricity,
                        orbit.semi_major_axis,
                    ),
                }
            }
        } else {
            if max_distance < orbit.periapsis_distance {
                return Self::empty();
            }
            Path::Arc {
                max_angle: true_anomaly_for_distance(
                    max_distance,
                    orbit.eccentricity,
                    orbit.semi_major_axis,
                ),
            }
        };

        Self {
            orbit: *orbit,
            origin,
            path,
            index: 0,
            count: points_count,
        }
    }

    /// Three-point path through `center` along `velocity`, used for bodies
    /// without an attractor.
    ///
    /// Empty when the body is practically at rest.
    pub fn straight_line(center: DVec3, velocity: DVec3, max_distance: f64) -> Self {
        if velocity.length_squared() < MIN_LINE_SPEED_SQUARED {
            return Self::empty();
        }
        let step = velocity.normalize_or_zero() * max_distance;
        Self {
            orbit: OrbitData::default(),
            origin: DVec3::ZERO,
            path: Path::Line {
                start: center - step,
                step,
            },
            index: 0,
            count: 3,
        }
    }

    fn point(&self, i: usize) -> DVec3 {
        let last = (self.count - 1) as f64;
        let local = match self.path {
            Path::Empty => DVec3::ZERO,
            Path::Closed => self.orbit.focal_position_at_true_anomaly(i as f64 * TAU / last),
            Path::Arc { max_angle } => self
                .orbit
                .focal_position_at_true_anomaly(-max_angle + i as f64 * 2.0 * max_angle / last),
            Path::Line { start, step } => start + step * i as f64,
        };
        local + self.origin
    }
}

impl Iterator for OrbitPoints {
    type Item = DVec3;

    fn next(&mut self) -> Option<DVec3> {
        if self.index >= self.count {
            return None;
        }
        let point = self.point(self.index);
        self.index += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for OrbitPoints {}

impl FusedIterator for OrbitPoints {}
