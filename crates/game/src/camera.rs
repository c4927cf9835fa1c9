//! The scene's main camera.

use engine_core::{look_rotation, Transform, Velocity};
use glam::{Mat4, Vec3};
use physics::{integrate, PhysicsBody};
use renderer::CameraSnapshot;

/// Perspective camera that looks down its local -Z axis.
///
/// It carries its own physics profile so it can drift like any other body,
/// but camera controllers zero its rates every frame and drive the pose
/// directly.
#[derive(Debug, Clone)]
pub struct Camera {
    pub transform: Transform,
    pub velocity: Velocity,
    pub body: PhysicsBody,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            transform: Transform::from_position(Vec3::new(0.0, 10.0, 20.0)),
            velocity: Velocity::default(),
            body: PhysicsBody::default(),
            fov_degrees: 45.0,
            aspect: 1.0,
            near: 0.1,
            far: 2000.0,
        };
        camera.resize(width, height);
        camera
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Viewing direction in world space.
    pub fn forward(&self) -> Vec3 {
        self.transform.rotation * Vec3::NEG_Z
    }

    /// Turn to look at `target`. No-op when the target is the camera position.
    pub fn look_at(&mut self, target: Vec3) {
        // Local +Z has to point away from the target.
        if let Some(rotation) = look_rotation(self.transform.position - target, Vec3::Y) {
            self.transform.rotation = rotation;
        }
    }

    pub fn integrate(&mut self, dt: f32) {
        integrate(&mut self.transform, &mut self.velocity, &self.body, dt);
    }

    /// Stop the integrator from moving the camera on its own.
    pub fn clear_motion(&mut self) {
        self.velocity.clear();
        self.body.clear_acceleration();
    }

    pub fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            transform: self.transform,
            fov_degrees: self.fov_degrees,
            aspect: self.aspect,
            near: self.near,
            far: self.far,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.snapshot().view_matrix()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.snapshot().projection_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_points_view_direction_at_target() {
        let mut camera = Camera::new(800, 600);
        camera.transform.position = Vec3::new(0.0, 0.0, 1.0);
        camera.look_at(Vec3::new(0.0, 0.0, -1.0));
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-5);

        camera.look_at(Vec3::new(10.0, 0.0, 1.0));
        assert!((camera.forward() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn resize_guards_zero_height() {
        let mut camera = Camera::new(800, 600);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        camera.resize(1024, 0);
        assert_eq!(camera.aspect, 1024.0);
    }
}
