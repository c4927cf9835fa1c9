//! Common components shared by every simulated object.

use glam::Vec3;

/// Velocity component for moving entities.
///
/// `angular` is a rotation-rate vector in the body's local frame (rad/s per
/// axis), not Euler angles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Velocity {
    pub fn new(linear: Vec3) -> Self {
        Self {
            linear,
            angular: Vec3::ZERO,
        }
    }

    pub fn with_angular(linear: Vec3, angular: Vec3) -> Self {
        Self { linear, angular }
    }

    /// Zero both linear and angular rates.
    pub fn clear(&mut self) {
        self.linear = Vec3::ZERO;
        self.angular = Vec3::ZERO;
    }
}

/// Visual description handed to the renderer. Entities without one still simulate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshInstance {
    /// Asset key of the geometry, e.g. `ship_x-wing` or `earth`.
    pub geometry_id: String,
    pub material_id: Option<String>,
    /// Optional 0xRRGGBB color override.
    pub color: Option<u32>,
}

impl MeshInstance {
    pub fn new(geometry_id: impl Into<String>) -> Self {
        Self {
            geometry_id: geometry_id.into(),
            material_id: None,
            color: None,
        }
    }

    pub fn with_material(mut self, material_id: impl Into<String>) -> Self {
        self.material_id = Some(material_id.into());
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }
}

/// Countdown for short-lived entities (projectiles, effects).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    pub age: f32,
    pub limit: f32,
}

impl Lifetime {
    pub fn new(seconds: f32) -> Self {
        Self {
            age: 0.0,
            limit: seconds,
        }
    }

    /// Advance the age and report whether the limit has been exceeded.
    pub fn update(&mut self, dt: f32) -> bool {
        self.age += dt;
        self.is_expired()
    }

    pub fn is_expired(&self) -> bool {
        self.age > self.limit
    }

    /// Fraction of the lifetime used, clamped to [0, 1].
    pub fn progress(&self) -> f32 {
        if self.limit <= 0.0 {
            1.0
        } else {
            (self.age / self.limit).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_expires_strictly_after_limit() {
        let mut life = Lifetime::new(1.0);
        assert!(!life.update(0.5));
        assert!(!life.update(0.5));
        assert!(life.update(0.01));
        assert_eq!(life.progress(), 1.0);
    }

    #[test]
    fn mesh_instance_builder() {
        let mesh = MeshInstance::new("earth").with_material("planet").with_color(0xff8800);
        assert_eq!(mesh.geometry_id, "earth");
        assert_eq!(mesh.material_id.as_deref(), Some("planet"));
        assert_eq!(mesh.color, Some(0xff8800));
    }
}
