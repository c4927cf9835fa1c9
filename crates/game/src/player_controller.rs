//! Maps keyboard and mouse state onto the possessed ship's controls.

use hecs::Entity;
use input::{InputState, KeyCode};

use crate::scene::Scene;
use crate::ship;

#[derive(Debug, Clone)]
pub struct PlayerController {
    target: Option<Entity>,
    /// Mouse steers pitch/yaw when set, arrow keys otherwise.
    pub use_mouse_steering: bool,
    pub mouse_sensitivity: f32,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self {
            target: None,
            use_mouse_steering: true,
            mouse_sensitivity: 0.02,
        }
    }
}

impl PlayerController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take control of `ship`.
    pub fn possess(&mut self, ship: Entity) {
        self.target = Some(ship);
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn update(&self, scene: &mut Scene, input: &InputState) {
        let Some(target) = self.target else {
            return;
        };
        if !scene.is_active(target) {
            return;
        }

        let throttle = input.axis_vertical(KeyCode::KeyS, KeyCode::KeyW);
        let roll = input.axis(KeyCode::KeyQ, KeyCode::KeyE);
        let (pitch, yaw) = if self.use_mouse_steering {
            let delta = input.mouse_delta();
            (-delta.y * self.mouse_sensitivity, -delta.x * self.mouse_sensitivity)
        } else {
            // Positive yaw swings the nose to the ship's left, so the right
            // arrow is negated.
            (
                input.axis_vertical(KeyCode::ArrowDown, KeyCode::ArrowUp),
                -input.axis(KeyCode::ArrowLeft, KeyCode::ArrowRight),
            )
        };

        ship::set_control_input(scene, target, throttle, pitch, yaw, roll);
        ship::set_firing(scene, target, input.is_fire_held());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ship::{spawn_ship, ShipClass, ShipControls};
    use engine_core::Transform;
    use input::{ElementState, MouseButton};

    fn controls(scene: &Scene, e: Entity) -> ShipControls {
        *scene.world.get::<&ShipControls>(e).unwrap()
    }

    #[test]
    fn mouse_steering_maps_and_clamps() {
        let mut scene = Scene::with_seed(800, 600, 8);
        let ship = spawn_ship(&mut scene, ShipClass::XFighter, Transform::default());
        let mut player = PlayerController::new();
        player.possess(ship);

        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyE, ElementState::Pressed);
        input.process_mouse_motion((10.0, -500.0));
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        player.update(&mut scene, &input);

        let c = controls(&scene, ship);
        assert_eq!(c.throttle, 1.0);
        assert_eq!(c.roll, 1.0);
        assert!((c.yaw + 0.2).abs() < 1e-6);
        assert_eq!(c.pitch, 1.0);
        assert!(c.firing);
    }

    #[test]
    fn keyboard_steering_turns_right_on_right_arrow() {
        let mut scene = Scene::with_seed(800, 600, 8);
        let ship = spawn_ship(&mut scene, ShipClass::XFighter, Transform::default());
        let mut player = PlayerController::new();
        player.use_mouse_steering = false;
        player.possess(ship);

        let mut input = InputState::new();
        input.process_keyboard(KeyCode::ArrowRight, ElementState::Pressed);
        player.update(&mut scene, &input);

        let c = controls(&scene, ship);
        assert_eq!(c.yaw, -1.0);
        assert!(!c.firing);
    }

    #[test]
    fn nothing_happens_without_a_live_target() {
        let mut scene = Scene::with_seed(800, 600, 8);
        let ship = spawn_ship(&mut scene, ShipClass::XFighter, Transform::default());
        let mut player = PlayerController::new();
        player.possess(ship);
        scene.remove(ship);

        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        player.update(&mut scene, &input);
        assert_eq!(controls(&scene, ship).throttle, 0.0);
    }
}
