//! Small vector and scalar helpers used by the orbit and integrator code.
//!
//! Everything here is pure and deterministic: identical inputs always give
//! bit-identical outputs, which the property tests rely on.

use bevy::math::{DVec3, Vec3};

/// Default lower clamp for [`cube_root_safe`].
pub const DEFAULT_CUBE_ROOT_MIN: f64 = 0.1;

/// Inverse hyperbolic cosine that never leaves its domain.
///
/// Returns `ln(x + sqrt(x² - 1))` for `x >= 1` and `0` otherwise.
#[inline]
pub fn safe_acosh(x: f64) -> f64 {
    if x < 1.0 {
        return 0.0;
    }
    (x + (x * x - 1.0).sqrt()).ln()
}

#[inline]
pub fn dot(a: DVec3, b: DVec3) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

#[inline]
pub fn dot_f32(a: Vec3, b: Vec3) -> f32 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

#[inline]
pub fn cross(a: DVec3, b: DVec3) -> DVec3 {
    DVec3::new(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

#[inline]
pub fn cross_f32(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

/// Rotate `v` by `angle_rad` around the unit `axis` (Rodrigues rotation matrix).
pub fn rotate_vector_by_angle(v: DVec3, angle_rad: f64, axis: DVec3) -> DVec3 {
    let (sin_t, cos_t) = angle_rad.sin_cos();
    let one_minus_cos = 1.0 - cos_t;
    let n = axis;

    let a11 = one_minus_cos * n.x * n.x + cos_t;
    let a12 = one_minus_cos * n.x * n.y - n.z * sin_t;
    let a13 = one_minus_cos * n.x * n.z + n.y * sin_t;
    let a21 = one_minus_cos * n.x * n.y + n.z * sin_t;
    let a22 = one_minus_cos * n.y * n.y + cos_t;
    let a23 = one_minus_cos * n.y * n.z - n.x * sin_t;
    let a31 = one_minus_cos * n.x * n.z - n.y * sin_t;
    let a32 = one_minus_cos * n.y * n.z + n.x * sin_t;
    let a33 = one_minus_cos * n.z * n.z + cos_t;

    DVec3::new(
        v.x * a11 + v.y * a12 + v.z * a13,
        v.x * a21 + v.y * a22 + v.z * a23,
        v.x * a31 + v.y * a32 + v.z * a33,
    )
}

/// Single precision variant of [`rotate_vector_by_angle`].
pub fn rotate_vector_by_angle_f32(v: Vec3, angle_rad: f32, axis: Vec3) -> Vec3 {
    rotate_vector_by_angle(v.as_dvec3(), angle_rad as f64, axis.as_dvec3()).as_vec3()
}

/// Real cube root with negative and near-zero arguments clamped to `min_value`.
///
/// A negative `min_value` is treated as zero.
#[inline]
pub fn cube_root_safe(x: f64, min_value: f64) -> f64 {
    let floor = min_value.max(0.0);
    let arg = if x < min_value || x < 0.0 { floor } else { x };
    arg.powf(1.0 / 3.0)
}

/// Unsigned angle between two vectors in radians.
///
/// Zero-length inputs give `0` instead of NaN.
pub fn angle_between(a: DVec3, b: DVec3) -> f64 {
    let denominator = (a.length_squared() * b.length_squared()).sqrt();
    if denominator < 1e-300 || !denominator.is_finite() {
        return 0.0;
    }
    (dot(a, b) / denominator).clamp(-1.0, 1.0).acos()
}

pub fn center_of_mass(pos1: DVec3, mass1: f64, pos2: DVec3, mass2: f64) -> DVec3 {
    (pos1 * mass1 + pos2 * mass2) / (mass1 + mass2)
}

/// Remove the component of `v` along the unit `normal`.
#[inline]
pub fn project_onto_plane(v: DVec3, normal: DVec3) -> DVec3 {
    v - normal * dot(v, normal)
}
