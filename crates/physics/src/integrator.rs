//! Per-frame motion integration.
//!
//! Two profiles exist. [`integrate`] is the thrust profile used by ships,
//! bullets and the camera: acceleration acts along the front axis and the
//! forward component of velocity can never go negative, so a ship decelerates
//! to a stop along its nose but keeps any sideways drift. [`integrate_free`]
//! is the celestial profile: no thrust, no forward clamp, plus an optional
//! constant spin.

use engine_core::{safe_normalize, Transform, Velocity, DIRECTION_EPSILON};
use glam::{Quat, Vec3};

/// Per-entity kinematic limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionLimits {
    /// Maximum linear speed [m/s].
    pub max_speed: f32,
    /// Maximum forward thrust [m/s²].
    pub max_acceleration: f32,
    /// Maximum magnitude of the angular velocity vector [rad/s].
    pub max_angular_speed: f32,
    /// Maximum angular acceleration per local axis (pitch, yaw, roll) [rad/s²].
    pub max_angular_acceleration: Vec3,
}

impl MotionLimits {
    /// No effective limit on anything.
    pub const UNBOUNDED: Self = Self {
        max_speed: f32::MAX,
        max_acceleration: f32::MAX,
        max_angular_speed: f32::MAX,
        max_angular_acceleration: Vec3::splat(f32::MAX),
    };

    pub fn new(
        max_speed: f32,
        max_acceleration: f32,
        max_angular_speed: f32,
        max_angular_acceleration: Vec3,
    ) -> Self {
        Self {
            max_speed,
            max_acceleration,
            max_angular_speed,
            max_angular_acceleration,
        }
    }
}

impl Default for MotionLimits {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Physics profile attached to anything the integrator moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsBody {
    /// Scalar thrust along local +Z [m/s²].
    pub acceleration: f32,
    /// Angular acceleration per local axis [rad/s²].
    pub angular_acceleration: Vec3,
    /// Fraction of linear velocity left after one second (1.0 = no decay).
    pub drag: f32,
    /// Fraction of angular velocity left after one second.
    pub angular_drag: f32,
    pub limits: MotionLimits,
    /// Static bodies skip translational and angular integration entirely.
    pub is_static: bool,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            acceleration: 0.0,
            angular_acceleration: Vec3::ZERO,
            drag: 1.0,
            angular_drag: 1.0,
            limits: MotionLimits::UNBOUNDED,
            is_static: false,
        }
    }
}

impl PhysicsBody {
    pub fn with_limits(limits: MotionLimits) -> Self {
        Self {
            limits,
            ..Default::default()
        }
    }

    pub fn with_drag(mut self, drag: f32, angular_drag: f32) -> Self {
        self.drag = drag;
        self.angular_drag = angular_drag;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Map normalized control signals onto accelerations.
    ///
    /// `throttle` scales `max_acceleration`; `turn` is (pitch, yaw, roll) and
    /// scales `max_angular_acceleration` per axis.
    pub fn apply_controls(&mut self, throttle: f32, turn: Vec3) {
        self.acceleration = throttle * self.limits.max_acceleration;
        self.angular_acceleration = turn * self.limits.max_angular_acceleration;
    }

    /// Drop any commanded acceleration.
    pub fn clear_acceleration(&mut self) {
        self.acceleration = 0.0;
        self.angular_acceleration = Vec3::ZERO;
    }
}

/// Thrust-profile integration step. No-op for static bodies.
pub fn integrate(transform: &mut Transform, velocity: &mut Velocity, body: &PhysicsBody, dt: f32) {
    if body.is_static || dt <= 0.0 {
        return;
    }

    // Linear
    let front = transform.front();
    velocity.linear += front * (body.acceleration * dt);
    velocity.linear *= body.drag.powf(dt);
    velocity.linear = velocity.linear.clamp_length_max(body.limits.max_speed);
    let forward = velocity.linear.dot(front);
    if forward < 0.0 {
        velocity.linear -= front * forward;
    }
    transform.position += velocity.linear * dt;

    // Angular
    velocity.angular += body.angular_acceleration * dt;
    velocity.angular *= body.angular_drag.powf(dt);
    velocity.angular = velocity.angular.clamp_length_max(body.limits.max_angular_speed);
    rotate_by_rate(transform, velocity.angular, dt);
}

/// Free-body integration: drag and drift without thrust or the forward clamp.
pub fn integrate_free(
    transform: &mut Transform,
    velocity: &mut Velocity,
    body: &PhysicsBody,
    dt: f32,
) {
    if body.is_static || dt <= 0.0 {
        return;
    }
    velocity.linear *= body.drag.powf(dt);
    transform.position += velocity.linear * dt;

    velocity.angular *= body.angular_drag.powf(dt);
    rotate_by_rate(transform, velocity.angular, dt);
}

/// Reference frame a spin axis is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpinSpace {
    #[default]
    World,
    Local,
}

/// Constant spin about an axis. Applies to static bodies too.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    axis: Vec3,
    /// Angular speed [rad/s].
    pub speed: f32,
    pub space: SpinSpace,
}

impl Default for Spin {
    fn default() -> Self {
        Self {
            axis: Vec3::Y,
            speed: 0.0,
            space: SpinSpace::World,
        }
    }
}

impl Spin {
    /// A degenerate axis falls back to world up.
    pub fn new(axis: Vec3, speed: f32, space: SpinSpace) -> Self {
        Self {
            axis: safe_normalize(axis, Vec3::Y),
            speed,
            space,
        }
    }

    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    pub fn set_axis(&mut self, axis: Vec3) {
        self.axis = safe_normalize(axis, Vec3::Y);
    }

    pub fn apply(&self, transform: &mut Transform, dt: f32) {
        if self.speed.abs() <= DIRECTION_EPSILON {
            return;
        }
        let angle = self.speed * dt;
        match self.space {
            SpinSpace::World => transform.rotate_world(self.axis, angle),
            SpinSpace::Local => transform.rotate_local(self.axis, angle),
        }
    }
}

/// Rotate by an angular-rate vector over `dt`, composed in the local frame.
pub fn rotate_by_rate(transform: &mut Transform, angular: Vec3, dt: f32) {
    let rate = angular.length();
    if rate > DIRECTION_EPSILON {
        let delta = Quat::from_axis_angle(angular / rate, rate * dt);
        transform.rotation = (transform.rotation * delta).normalize();
    }
}

/// Rotation reached after integrating `angular` (local frame) for `dt` seconds.
pub fn predict_rotation(rotation: Quat, angular: Vec3, dt: f32) -> Quat {
    let rate = angular.length();
    if rate > DIRECTION_EPSILON {
        (rotation * Quat::from_axis_angle(angular / rate, rate * dt)).normalize()
    } else {
        rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drifting_body(drag: f32) -> PhysicsBody {
        PhysicsBody::default().with_drag(drag, 1.0)
    }

    #[test]
    fn drag_decay_is_frame_rate_independent() {
        let body = drifting_body(0.5);
        let start = Velocity::new(Vec3::new(0.0, 0.0, 40.0));

        let mut once_t = Transform::default();
        let mut once_v = start;
        integrate(&mut once_t, &mut once_v, &body, 0.2);

        let mut twice_t = Transform::default();
        let mut twice_v = start;
        integrate(&mut twice_t, &mut twice_v, &body, 0.1);
        integrate(&mut twice_t, &mut twice_v, &body, 0.1);

        let expected = 40.0 * 0.5f32.powf(0.2);
        assert!((once_v.linear.length() - expected).abs() < 1e-4);
        assert!((twice_v.linear.length() - once_v.linear.length()).abs() < 1e-4);
    }

    #[test]
    fn forward_velocity_never_goes_negative() {
        let limits = MotionLimits::new(100.0, 30.0, 5.0, Vec3::splat(4.0));
        let mut body = PhysicsBody::with_limits(limits).with_drag(0.9, 0.8);
        let mut t = Transform::default();
        let mut v = Velocity::new(Vec3::new(3.0, -2.0, 10.0));

        for step in 0..600 {
            let throttle = if step % 50 < 30 { -1.0 } else { 0.7 };
            let turn = Vec3::new((step as f32 * 0.1).sin(), (step as f32 * 0.07).cos(), 0.3);
            body.apply_controls(throttle, turn);
            // The clamp is checked against the heading used for the linear step.
            let front = t.front();
            integrate(&mut t, &mut v, &body, 1.0 / 60.0);
            assert!(v.linear.dot(front) >= -1e-4, "step {step}");
            assert!((t.rotation.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn reverse_thrust_keeps_lateral_drift() {
        let mut body = PhysicsBody::with_limits(MotionLimits::new(50.0, 20.0, 1.0, Vec3::ONE));
        body.apply_controls(-1.0, Vec3::ZERO);
        let mut t = Transform::default();
        let mut v = Velocity::new(Vec3::new(5.0, 0.0, 0.5));
        integrate(&mut t, &mut v, &body, 0.5);
        assert!(v.linear.z.abs() < 1e-6);
        assert!((v.linear.x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn speed_is_clamped_by_uniform_rescale() {
        let body = PhysicsBody::with_limits(MotionLimits::new(10.0, 0.0, 1.0, Vec3::ONE));
        let mut t = Transform::default();
        let mut v = Velocity::new(Vec3::new(30.0, 0.0, 40.0));
        integrate(&mut t, &mut v, &body, 0.01);
        assert!((v.linear.length() - 10.0).abs() < 1e-4);
        assert!((v.linear.x / v.linear.z - 0.75).abs() < 1e-4);
    }

    #[test]
    fn angular_speed_is_clamped_and_rotation_stays_unit() {
        let mut body = PhysicsBody::with_limits(MotionLimits::new(1.0, 1.0, 2.0, Vec3::splat(100.0)));
        body.apply_controls(0.0, Vec3::new(1.0, 1.0, 1.0));
        let mut t = Transform::default();
        let mut v = Velocity::default();
        for _ in 0..120 {
            integrate(&mut t, &mut v, &body, 1.0 / 60.0);
        }
        assert!(v.angular.length() <= 2.0 + 1e-4);
        assert!((t.rotation.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn static_bodies_do_not_move() {
        let body = PhysicsBody::default().as_static();
        let mut t = Transform::default();
        let mut v = Velocity::new(Vec3::X * 5.0);
        integrate(&mut t, &mut v, &body, 1.0);
        integrate_free(&mut t, &mut v, &body, 1.0);
        assert_eq!(t.position, Vec3::ZERO);
    }

    #[test]
    fn free_profile_allows_backward_drift() {
        let body = PhysicsBody::default();
        let mut t = Transform::default();
        let mut v = Velocity::new(Vec3::new(0.0, 0.0, -4.0));
        integrate_free(&mut t, &mut v, &body, 1.0);
        assert!((t.position.z + 4.0).abs() < 1e-6);
    }

    #[test]
    fn world_spin_rotates_about_world_axis() {
        let spin = Spin::new(Vec3::Y, std::f32::consts::FRAC_PI_2, SpinSpace::World);
        let mut t = Transform::default();
        spin.apply(&mut t, 1.0);
        assert!((t.front() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn degenerate_spin_axis_falls_back_to_up() {
        let spin = Spin::new(Vec3::ZERO, 1.0, SpinSpace::Local);
        assert_eq!(spin.axis(), Vec3::Y);
    }

    #[test]
    fn predicted_rotation_matches_integration() {
        let rotation = Quat::from_rotation_x(0.3);
        let angular = Vec3::new(0.0, 1.5, 0.0);
        let mut t = Transform::from_position_rotation(Vec3::ZERO, rotation);
        rotate_by_rate(&mut t, angular, 0.1);
        let predicted = predict_rotation(rotation, angular, 0.1);
        assert!(t.rotation.dot(predicted).abs() > 0.99999);
    }
}
