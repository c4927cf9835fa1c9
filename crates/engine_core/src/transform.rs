//! Transform component and utilities for spatial positioning.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// Below this length a direction vector is treated as degenerate.
pub const DIRECTION_EPSILON: f32 = 1e-6;

/// A 3D transform representing position, rotation, and scale.
///
/// Rotation is kept unit-length by every mutator in this crate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation: rotation.normalize(),
            ..Default::default()
        }
    }

    /// Builder-style uniform scale.
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Create the model matrix for this transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Front direction: local +Z rotated into world space.
    pub fn front(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Get the right direction (positive X).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get the up direction (positive Y).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Transform a local-space point into world space (scale ignored).
    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Translate the transform by a delta.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Rotate about a world-space axis (pre-multiplied).
    pub fn rotate_world(&mut self, axis: Vec3, angle: f32) {
        let axis = safe_normalize(axis, Vec3::Y);
        self.rotation = (Quat::from_axis_angle(axis, angle) * self.rotation).normalize();
    }

    /// Rotate about a local-space axis (post-multiplied).
    pub fn rotate_local(&mut self, axis: Vec3, angle: f32) {
        let axis = safe_normalize(axis, Vec3::Y);
        self.rotation = (self.rotation * Quat::from_axis_angle(axis, angle)).normalize();
    }

    /// Turn so that the front (+Z) points at `target`.
    ///
    /// Keeps the current rotation when the target coincides with the position.
    pub fn look_at(&mut self, target: Vec3) {
        if let Some(rotation) = look_rotation(target - self.position, Vec3::Y) {
            self.rotation = rotation;
        }
    }
}

/// Normalize `v`, or return `fallback` when `v` is too short to have a direction.
pub fn safe_normalize(v: Vec3, fallback: Vec3) -> Vec3 {
    let len = v.length();
    if len < DIRECTION_EPSILON || !len.is_finite() {
        fallback
    } else {
        v / len
    }
}

/// Rotation whose +Z axis points along `direction` with +Y as close to `up` as possible.
///
/// Returns `None` for a degenerate direction. When `direction` is parallel to
/// `up`, world +X is used to pick the roll instead.
pub fn look_rotation(direction: Vec3, up: Vec3) -> Option<Quat> {
    if direction.length_squared() < DIRECTION_EPSILON * DIRECTION_EPSILON {
        return None;
    }
    let forward = direction.normalize();
    let mut right = up.cross(forward);
    if right.length_squared() < 1e-8 {
        right = Vec3::X.cross(forward);
        if right.length_squared() < 1e-8 {
            right = Vec3::Z.cross(forward);
        }
    }
    let right = right.normalize();
    let true_up = forward.cross(right);
    Some(Quat::from_mat3(&glam::Mat3::from_cols(right, true_up, forward)).normalize())
}

/// Raw transform data for GPU upload (instance data).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TransformRaw {
    pub model: [[f32; 4]; 4],
}

impl From<&Transform> for TransformRaw {
    fn from(transform: &Transform) -> Self {
        Self {
            model: transform.to_matrix().to_cols_array_2d(),
        }
    }
}

impl From<Transform> for TransformRaw {
    fn from(transform: Transform) -> Self {
        Self::from(&transform)
    }
}

impl From<Mat4> for TransformRaw {
    fn from(matrix: Mat4) -> Self {
        Self {
            model: matrix.to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_is_local_positive_z() {
        let t = Transform::default();
        assert!((t.front() - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn look_at_points_front_at_target() {
        let mut t = Transform::from_position(Vec3::new(10.0, -4.0, 3.0));
        let target = Vec3::new(-20.0, 15.0, 40.0);
        t.look_at(target);
        let expected = (target - t.position).normalize();
        assert!(t.front().dot(expected) > 0.9999);
        assert!((t.rotation.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn look_at_straight_up_still_resolves() {
        let mut t = Transform::default();
        t.look_at(Vec3::new(0.0, 50.0, 0.0));
        assert!(t.front().dot(Vec3::Y) > 0.9999);
    }

    #[test]
    fn look_at_own_position_keeps_rotation() {
        let mut t = Transform::from_position_rotation(Vec3::ONE, Quat::from_rotation_y(0.7));
        let before = t.rotation;
        t.look_at(Vec3::ONE);
        assert_eq!(t.rotation, before);
    }

    #[test]
    fn safe_normalize_uses_fallback_for_zero() {
        assert_eq!(safe_normalize(Vec3::ZERO, Vec3::X), Vec3::X);
        let n = safe_normalize(Vec3::new(0.0, 3.0, 4.0), Vec3::X);
        assert!((n.length() - 1.0).abs() < 1e-6);
    }
}
