//! Top-level frame driver: owns the scene, input, clock, levels and renderer.

use std::time::Duration;

use engine_core::Time;
use input::InputState;
use renderer::{RenderError, Renderer, SurfaceConfig};

use crate::config::GameConfig;
use crate::level::{GameContext, Level, LevelManager};
use crate::scene::Scene;

pub struct Game<R: Renderer> {
    pub scene: Scene,
    pub input: InputState,
    pub time: Time,
    pub config: GameConfig,
    levels: LevelManager,
    renderer: R,
}

impl<R: Renderer> Game<R> {
    pub fn new(config: GameConfig, renderer: R) -> Self {
        let scene = match config.seed {
            Some(seed) => Scene::with_seed(config.window_width, config.window_height, seed),
            None => Scene::new(config.window_width, config.window_height),
        };
        let mut time = Time::new();
        time.set_time_scale(config.time_scale);
        time.set_max_delta(Duration::from_secs_f32(config.max_frame_delta.max(0.0)));

        Self {
            scene,
            input: InputState::new(),
            time,
            config,
            levels: LevelManager::new(),
            renderer,
        }
    }

    /// Bring up the renderer for the configured surface.
    pub fn init(&mut self) -> Result<(), RenderError> {
        let surface = SurfaceConfig::new(self.config.window_width, self.config.window_height);
        self.renderer.init(&surface)?;
        self.scene.camera.resize(surface.width, surface.height);
        log::info!("Renderer ready at {}x{}", surface.width, surface.height);
        Ok(())
    }

    /// Switch to `level`, replacing whatever is running.
    pub fn start(&mut self, level: Box<dyn Level>) {
        let mut ctx = GameContext {
            scene: &mut self.scene,
            input: &self.input,
            config: &self.config,
        };
        self.levels.change(&mut ctx, level);
    }

    /// Advance one frame by `raw` wall-clock time and render it.
    pub fn frame(&mut self, raw: Duration) -> Result<(), RenderError> {
        self.time.advance(raw);
        let dt = self.time.delta_seconds();

        self.scene.update(dt);
        {
            let mut ctx = GameContext {
                scene: &mut self.scene,
                input: &self.input,
                config: &self.config,
            };
            self.levels.update(&mut ctx, dt);
            self.levels.post_update(&mut ctx, dt);
        }

        let ui = self.levels.ui(&self.scene);
        let snapshot = self.scene.snapshot(ui);
        let result = self.renderer.render(&snapshot);
        self.input.end_frame();
        result
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.window_width = width;
        self.config.window_height = height;
        self.scene.camera.resize(width, height);
        self.renderer.resize(width, height);
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn levels(&self) -> &LevelManager {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::CombatLevel;
    use input::{ElementState, KeyCode};
    use renderer::{AssetStore, HeadlessRenderer};

    fn game() -> Game<HeadlessRenderer> {
        let config = GameConfig {
            seed: Some(5),
            window_width: 640,
            window_height: 480,
            ..GameConfig::default()
        };
        Game::new(config, HeadlessRenderer::new(AssetStore::new()))
    }

    #[test]
    fn frames_render_the_level() {
        let mut game = game();
        game.init().unwrap();
        game.start(Box::new(CombatLevel::new()));

        game.frame(Duration::from_millis(16)).unwrap();
        let stats = game.renderer().stats();
        assert_eq!(stats.frames, 1);
        // Two planets and the meteor ring; no assets loaded, so all missing.
        assert_eq!(stats.draws, 0);
        assert_eq!(stats.missing_meshes, 302);
        assert!(stats.ui_nodes > 0);
        assert!((game.scene.camera.aspect - 640.0 / 480.0).abs() < 1e-6);
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut game = game();
        game.init().unwrap();
        game.frame(Duration::from_secs(3)).unwrap();
        assert!((game.time.delta_seconds() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn pressing_a_key_launches_the_player() {
        let mut game = game();
        game.init().unwrap();
        game.start(Box::new(CombatLevel::new()));
        game.frame(Duration::from_millis(16)).unwrap();

        game.input_mut().process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        game.frame(Duration::from_millis(16)).unwrap();
        assert_eq!(game.scene.ships().len(), 1);
        // Edges are cleared after every frame.
        assert!(!game.input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn render_before_init_fails() {
        let mut game = game();
        assert!(matches!(
            game.frame(Duration::from_millis(16)),
            Err(RenderError::NotInitialized)
        ));
    }
}
