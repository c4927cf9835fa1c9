//! Keyboard and mouse state for the frame being simulated.
//!
//! Window events are folded in through the `process_*` methods as they arrive.
//! Held state persists across frames; pressed/released edges and the mouse
//! delta live until `end_frame`, which the game loop calls after rendering.

use glam::Vec2;
use std::collections::HashSet;

/// Manages input state for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Keys pressed this frame.
    keys_pressed: HashSet<KeyCode>,
    /// Keys released this frame.
    keys_released: HashSet<KeyCode>,

    /// Mouse buttons currently held.
    mouse_held: HashSet<MouseButton>,
    /// Mouse buttons pressed this frame.
    mouse_pressed: HashSet<MouseButton>,
    /// Mouse buttons released this frame.
    mouse_released: HashSet<MouseButton>,

    /// Mouse position in window coordinates.
    mouse_position: Vec2,
    /// Mouse movement accumulated since the last `end_frame`.
    mouse_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop per-frame edges and the mouse delta. Held state is kept.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_pressed.clear();
        self.mouse_released.clear();
        self.mouse_delta = Vec2::ZERO;
    }

    /// Release everything, e.g. when the window loses focus.
    pub fn reset(&mut self) {
        self.keys_held.clear();
        self.mouse_held.clear();
        self.end_frame();
    }

    /// Process a keyboard event. OS key repeat does not produce a new press edge.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.keys_held.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
                self.keys_released.insert(key);
            }
        }
    }

    /// Process a mouse button event.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.mouse_held.insert(button) {
                    self.mouse_pressed.insert(button);
                }
            }
            ElementState::Released => {
                self.mouse_held.remove(&button);
                self.mouse_released.insert(button);
            }
        }
    }

    /// Process raw mouse motion.
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        self.mouse_delta.x += delta.0 as f32;
        self.mouse_delta.y += delta.1 as f32;
    }

    /// Process cursor position update.
    pub fn process_cursor_position(&mut self, position: (f64, f64)) {
        self.mouse_position = Vec2::new(position.0 as f32, position.1 as f32);
    }

    // Query methods

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Check if a key was pressed this frame.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a key was released this frame.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn is_any_key_held(&self) -> bool {
        !self.keys_held.is_empty()
    }

    /// Check if a mouse button is held.
    pub fn is_mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Check if a mouse button was pressed this frame.
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    /// Check if a mouse button was released this frame.
    pub fn is_mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_released.contains(&button)
    }

    /// Get the mouse position in window coordinates.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Get the mouse movement delta for this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Horizontal axis in [-1, 1] from two opposing keys.
    ///
    /// `ArrowLeft`/`ArrowRight` always count as the negative/positive keys too.
    pub fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        self.axis_with_fallback(negative, positive, KeyCode::ArrowLeft, KeyCode::ArrowRight)
    }

    /// Vertical axis in [-1, 1], with `ArrowDown`/`ArrowUp` as fallback keys.
    pub fn axis_vertical(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        self.axis_with_fallback(negative, positive, KeyCode::ArrowDown, KeyCode::ArrowUp)
    }

    fn axis_with_fallback(
        &self,
        negative: KeyCode,
        positive: KeyCode,
        fallback_negative: KeyCode,
        fallback_positive: KeyCode,
    ) -> f32 {
        let mut value = 0.0;
        if self.is_key_held(positive) || self.is_key_held(fallback_positive) {
            value += 1.0;
        }
        if self.is_key_held(negative) || self.is_key_held(fallback_negative) {
            value -= 1.0;
        }
        value
    }

    /// Check if a boost modifier is held (Shift).
    pub fn is_boost_held(&self) -> bool {
        self.is_key_held(KeyCode::ShiftLeft) || self.is_key_held(KeyCode::ShiftRight)
    }

    /// Check if fire is held (left mouse button or Space).
    pub fn is_fire_held(&self) -> bool {
        self.is_mouse_held(MouseButton::Left) || self.is_key_held(KeyCode::Space)
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_edges_last_one_frame() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        assert!(input.is_key_held(KeyCode::KeyW));
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(!input.is_key_released(KeyCode::KeyW));

        input.end_frame();
        assert!(!input.is_key_pressed(KeyCode::KeyW));
        assert!(input.is_key_held(KeyCode::KeyW));

        input.process_keyboard(KeyCode::KeyW, ElementState::Released);
        assert!(!input.is_key_held(KeyCode::KeyW));
        assert!(input.is_key_released(KeyCode::KeyW));

        input.end_frame();
        assert!(!input.is_key_released(KeyCode::KeyW));
    }

    #[test]
    fn repeated_press_is_not_a_new_edge() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyA, ElementState::Pressed);
        input.end_frame();
        input.process_keyboard(KeyCode::KeyA, ElementState::Pressed);
        assert!(input.is_key_held(KeyCode::KeyA));
        assert!(!input.is_key_pressed(KeyCode::KeyA));
    }

    #[test]
    fn axes_include_arrow_fallback() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::ArrowRight, ElementState::Pressed);
        assert_eq!(input.axis(KeyCode::KeyA, KeyCode::KeyD), 1.0);

        input.process_keyboard(KeyCode::KeyA, ElementState::Pressed);
        assert_eq!(input.axis(KeyCode::KeyA, KeyCode::KeyD), 0.0);

        input.process_keyboard(KeyCode::ArrowUp, ElementState::Pressed);
        assert_eq!(input.axis_vertical(KeyCode::KeyS, KeyCode::KeyW), 1.0);
        assert!(input.is_any_key_held());
    }

    #[test]
    fn mouse_state_and_delta() {
        let mut input = InputState::new();
        input.process_cursor_position((120.0, 240.0));
        assert_eq!(input.mouse_position(), Vec2::new(120.0, 240.0));

        input.process_mouse_motion((3.0, -1.0));
        input.process_mouse_motion((2.0, 4.0));
        assert_eq!(input.mouse_delta(), Vec2::new(5.0, 3.0));

        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(input.is_mouse_held(MouseButton::Left));
        assert!(input.is_mouse_pressed(MouseButton::Left));
        assert!(input.is_fire_held());

        input.end_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        assert!(!input.is_mouse_pressed(MouseButton::Left));
        assert!(input.is_mouse_held(MouseButton::Left));

        input.process_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(!input.is_mouse_held(MouseButton::Left));
        assert!(input.is_mouse_released(MouseButton::Left));
    }
}
