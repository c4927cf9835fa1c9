//! Camera controllers: ship follow camera and a free debug fly camera.

use std::f32::consts::{FRAC_PI_2, PI};

use engine_core::{Transform, Velocity};
use glam::{EulerRot, Quat, Vec3};
use hecs::Entity;
use input::{InputState, KeyCode, MouseButton};
use physics::{predict_rotation, PhysicsBody};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::scene::Scene;
use crate::ship::CameraView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraMode {
    FirstPerson,
    #[default]
    ThirdPerson,
}

impl CameraMode {
    pub fn toggled(self) -> Self {
        match self {
            CameraMode::FirstPerson => CameraMode::ThirdPerson,
            CameraMode::ThirdPerson => CameraMode::FirstPerson,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    elapsed: f32,
    start_position: Vec3,
    start_rotation: Quat,
}

/// Follows a ship in cockpit or chase view.
///
/// The target is extrapolated one frame ahead to hide integration lag.
/// Cockpit view snaps to the predicted pose every frame. Chase view blends
/// in over a short transition and then smooths exponentially.
#[derive(Debug, Clone)]
pub struct ShipCameraController {
    pub target: Entity,
    mode: CameraMode,
    first_frame: bool,
    transition: Option<Transition>,
    pub transition_duration: f32,
    pub position_sharpness: f32,
    pub rotation_sharpness: f32,
}

impl ShipCameraController {
    pub fn new(target: Entity, mode: CameraMode) -> Self {
        Self {
            target,
            mode,
            first_frame: true,
            transition: None,
            transition_duration: 0.3,
            position_sharpness: 10.0,
            rotation_sharpness: 14.0,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Switch view; the switch is applied on the next update.
    pub fn set_mode(&mut self, mode: CameraMode) {
        if mode != self.mode {
            self.mode = mode;
            self.first_frame = true;
        }
    }

    pub fn update(&mut self, scene: &mut Scene, input: &InputState, dt: f32) {
        if !scene.is_active(self.target) {
            return;
        }
        if input.is_key_pressed(KeyCode::KeyV) {
            self.set_mode(self.mode.toggled());
            log::debug!("Camera mode -> {:?}", self.mode);
        }

        let Some((position, rotation)) = self.desired_pose(scene, dt) else {
            return;
        };
        let camera = &mut scene.camera;

        if std::mem::take(&mut self.first_frame) {
            match self.mode {
                CameraMode::FirstPerson => {
                    self.transition = None;
                    snap(camera, position, rotation);
                }
                CameraMode::ThirdPerson => {
                    // Sampled at t = 0 this frame: the camera holds its pose.
                    self.transition = Some(Transition {
                        elapsed: 0.0,
                        start_position: camera.transform.position,
                        start_rotation: camera.transform.rotation,
                    });
                }
            }
        } else if let Some(mut transition) = self.transition {
            transition.elapsed += dt;
            let t = (transition.elapsed / self.transition_duration.max(f32::EPSILON)).min(1.0);
            camera.transform.position = transition.start_position.lerp(position, t);
            camera.transform.rotation = transition.start_rotation.slerp(rotation, t).normalize();
            self.transition = (t < 1.0).then_some(transition);
        } else {
            match self.mode {
                CameraMode::FirstPerson => snap(camera, position, rotation),
                CameraMode::ThirdPerson => {
                    let tp = 1.0 - (-self.position_sharpness * dt).exp();
                    let tr = 1.0 - (-self.rotation_sharpness * dt).exp();
                    camera.transform.position = camera.transform.position.lerp(position, tp);
                    camera.transform.rotation =
                        camera.transform.rotation.slerp(rotation, tr).normalize();
                }
            }
        }

        camera.clear_motion();
        log::trace!(
            "camera pos={:?} target pos={:?}",
            camera.transform.position,
            position
        );
    }

    /// Camera pose for the target's predicted state one frame ahead.
    fn desired_pose(&self, scene: &Scene, dt: f32) -> Option<(Vec3, Quat)> {
        let transform = scene.world.get::<&Transform>(self.target).ok().map(|t| *t)?;
        let view = scene.world.get::<&CameraView>(self.target).ok().map(|v| *v)?;
        let velocity = scene
            .world
            .get::<&Velocity>(self.target)
            .ok()
            .map(|v| *v)
            .unwrap_or_default();
        let acceleration = scene
            .world
            .get::<&PhysicsBody>(self.target)
            .map(|b| b.acceleration)
            .unwrap_or(0.0);

        let predicted_position = transform.position
            + velocity.linear * dt
            + transform.front() * (0.5 * acceleration * dt * dt);
        let predicted_rotation = predict_rotation(transform.rotation, velocity.angular, dt);

        let (offset, pitch_down) = match self.mode {
            CameraMode::FirstPerson => (view.cockpit_offset, view.first_person_pitch_down),
            CameraMode::ThirdPerson => (view.third_person_offset, view.third_person_pitch_down),
        };
        let position = predicted_position + predicted_rotation * offset;
        // The camera looks down -Z while ships fly along +Z.
        let rotation = (predicted_rotation
            * Quat::from_rotation_y(PI)
            * Quat::from_rotation_x(-pitch_down))
        .normalize();
        Some((position, rotation))
    }
}

fn snap(camera: &mut Camera, position: Vec3, rotation: Quat) {
    camera.transform.position = position;
    camera.transform.rotation = rotation;
}

// ── Free camera ─────────────────────────────────────────────────────────

/// Debug fly camera: drag with the left mouse button to look, WASD to move.
#[derive(Debug, Clone)]
pub struct FreeCameraController {
    pub yaw: f32,
    pub pitch: f32,
    pub move_speed: f32,
    pub boost_multiplier: f32,
    /// Radians per pixel of mouse drag.
    pub look_sensitivity: f32,
}

impl FreeCameraController {
    const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.1;

    /// Start from the camera's current viewing direction.
    pub fn new(camera: &Camera) -> Self {
        let forward = camera.forward();
        Self {
            yaw: (-forward.x).atan2(-forward.z),
            pitch: forward.y.clamp(-1.0, 1.0).asin(),
            move_speed: 10.0,
            boost_multiplier: 3.0,
            look_sensitivity: 0.02,
        }
    }

    pub fn update(&mut self, camera: &mut Camera, input: &InputState, dt: f32) {
        if input.is_mouse_held(MouseButton::Left) {
            let delta = input.mouse_delta();
            self.yaw -= delta.x * self.look_sensitivity;
            self.pitch = (self.pitch - delta.y * self.look_sensitivity)
                .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
        }
        camera.transform.rotation = Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0);

        let mut speed = self.move_speed;
        if input.is_key_held(KeyCode::ShiftLeft) {
            speed *= self.boost_multiplier;
        }

        let local = Vec3::new(
            input.axis(KeyCode::KeyA, KeyCode::KeyD),
            0.0,
            -input.axis_vertical(KeyCode::KeyS, KeyCode::KeyW),
        );
        let mut movement = camera.transform.rotation * local;
        if input.is_key_held(KeyCode::KeyE) || input.is_key_held(KeyCode::Space) {
            movement.y += 1.0;
        }
        if input.is_key_held(KeyCode::KeyQ) || input.is_key_held(KeyCode::ControlLeft) {
            movement.y -= 1.0;
        }
        camera.transform.translate(movement * speed * dt);
        camera.clear_motion();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ship::{spawn_ship, ShipClass};
    use input::ElementState;

    const DT: f32 = 0.1;

    fn setup() -> (Scene, Entity) {
        let mut scene = Scene::with_seed(800, 600, 21);
        let ship = spawn_ship(&mut scene, ShipClass::TFighter, Transform::default());
        scene.update(0.0);
        (scene, ship)
    }

    fn cockpit_pose() -> Vec3 {
        ShipClass::TFighter.spec().camera_view.cockpit_offset
    }

    #[test]
    fn first_person_snaps_immediately() {
        let (mut scene, ship) = setup();
        let mut controller = ShipCameraController::new(ship, CameraMode::FirstPerson);
        controller.update(&mut scene, &InputState::new(), DT);

        assert!((scene.camera.transform.position - cockpit_pose()).length() < 1e-5);
        // Looking along the ship's front.
        assert!((scene.camera.forward() - Vec3::Z).length() < 1e-5);
        assert!(!controller.is_transitioning());
    }

    #[test]
    fn third_person_blends_over_transition() {
        let (mut scene, ship) = setup();
        let start = scene.camera.transform.position;
        let target = ShipClass::TFighter.spec().camera_view.third_person_offset;
        let mut controller = ShipCameraController::new(ship, CameraMode::ThirdPerson);
        let input = InputState::new();

        controller.update(&mut scene, &input, 0.15);
        assert!((scene.camera.transform.position - start).length() < 1e-5);
        assert!(controller.is_transitioning());

        controller.update(&mut scene, &input, 0.15);
        let halfway = start.lerp(target, 0.5);
        assert!((scene.camera.transform.position - halfway).length() < 1e-4);

        controller.update(&mut scene, &input, 0.16);
        assert!((scene.camera.transform.position - target).length() < 1e-4);
        assert!(!controller.is_transitioning());
    }

    #[test]
    fn v_toggles_to_cockpit_with_no_blend_frame() {
        let (mut scene, ship) = setup();
        let mut controller = ShipCameraController::new(ship, CameraMode::ThirdPerson);
        let mut input = InputState::new();
        controller.update(&mut scene, &input, DT);

        input.process_keyboard(KeyCode::KeyV, ElementState::Pressed);
        controller.update(&mut scene, &input, DT);
        assert_eq!(controller.mode(), CameraMode::FirstPerson);
        assert!((scene.camera.transform.position - cockpit_pose()).length() < 1e-5);
    }

    #[test]
    fn prediction_leads_a_moving_target() {
        let (mut scene, ship) = setup();
        scene.set_velocity(ship, Velocity::new(Vec3::new(0.0, 0.0, 10.0)));
        let mut controller = ShipCameraController::new(ship, CameraMode::FirstPerson);
        controller.update(&mut scene, &InputState::new(), DT);
        let expected = cockpit_pose() + Vec3::new(0.0, 0.0, 1.0);
        assert!((scene.camera.transform.position - expected).length() < 1e-5);
        assert_eq!(scene.camera.velocity.linear, Vec3::ZERO);
    }

    #[test]
    fn inactive_target_leaves_camera_alone() {
        let (mut scene, ship) = setup();
        let before = scene.camera.transform;
        scene.remove(ship);
        let mut controller = ShipCameraController::new(ship, CameraMode::FirstPerson);
        controller.update(&mut scene, &InputState::new(), DT);
        assert_eq!(scene.camera.transform, before);
    }

    #[test]
    fn free_camera_keeps_initial_direction_and_moves_forward() {
        let mut camera = Camera::new(800, 600);
        camera.transform.position = Vec3::ZERO;
        camera.look_at(Vec3::new(1.0, 0.0, 0.0));
        let mut free = FreeCameraController::new(&camera);

        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        free.update(&mut camera, &input, 1.0);

        assert!((camera.forward() - Vec3::X).length() < 1e-5);
        assert!((camera.transform.position - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn free_camera_pitch_is_clamped() {
        let mut camera = Camera::new(800, 600);
        let mut free = FreeCameraController::new(&camera);
        let mut input = InputState::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.process_mouse_motion((0.0, -10_000.0));
        free.update(&mut camera, &input, DT);
        assert!((free.pitch - FreeCameraController::PITCH_LIMIT).abs() < 1e-6);
    }
}
