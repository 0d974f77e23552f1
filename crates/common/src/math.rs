//! Vector and matrix helpers on top of `glam`.
//!
//! `glam` supplies the value types and the basic operators (`+`, `-`, `*`,
//! `dot`, `cross`). This module adds the guarded operations the camera and
//! the rasterizer boundary rely on. Angles are radians unless a name says
//! otherwise.

use glam::{EulerRot, Mat4, Vec3, Vec4};

/// Vectors shorter than this are treated as zero length.
pub const EPSILON: f32 = 1e-6;

/// Errors from degenerate vector math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("vector has zero length or the basis collapsed")]
    Degenerate,
    #[error("non-finite input")]
    NonFinite,
}

/// Normalize `v`, refusing zero-length and non-finite input instead of
/// producing NaN.
pub fn normalize(v: Vec3) -> Result<Vec3, MathError> {
    if !v.is_finite() {
        return Err(MathError::NonFinite);
    }
    let len = v.length();
    if !len.is_finite() {
        return Err(MathError::NonFinite);
    }
    if len < EPSILON {
        return Err(MathError::Degenerate);
    }
    Ok(v / len)
}

/// Right-handed view matrix looking from `eye` towards `center`.
///
/// Layout is column-major and identical to `gluLookAt`, which is what the
/// rasterizer's matrix-load call expects.
pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Result<Mat4, MathError> {
    if !eye.is_finite() {
        return Err(MathError::NonFinite);
    }
    let f = normalize(center - eye)?;
    let s = normalize(f.cross(up))?;
    let u = s.cross(f);

    Ok(Mat4::from_cols(
        Vec4::new(s.x, u.x, -f.x, 0.0),
        Vec4::new(s.y, u.y, -f.y, 0.0),
        Vec4::new(s.z, u.z, -f.z, 0.0),
        Vec4::new(-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0),
    ))
}

/// Rotation from per-axis angles, composed as `Rx * Ry * Rz`.
pub fn rotation(axis_angles: Vec3) -> Mat4 {
    Mat4::from_euler(EulerRot::XYZ, axis_angles.x, axis_angles.y, axis_angles.z)
}

/// Rotation of `angle` radians about `axis` (normalized here).
pub fn axis_rotation(axis: Vec3, angle: f32) -> Result<Mat4, MathError> {
    if !angle.is_finite() {
        return Err(MathError::NonFinite);
    }
    Ok(Mat4::from_axis_angle(normalize(axis)?, angle))
}

/// OpenGL-style perspective projection (clip z in [-1, 1]), as `gluPerspective`.
pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh_gl(fov_y_degrees.to_radians(), aspect, near, far)
}
