//! Levels own the controllers and the game rules for one stretch of play.

use std::f32::consts::TAU;

use engine_core::Transform;
use glam::{Vec2, Vec3};
use hecs::Entity;
use input::{InputState, KeyCode};
use physics::{Spin, SpinSpace};
use rand::Rng;
use renderer::UiNode;

use crate::camera_controller::{FreeCameraController, ShipCameraController};
use crate::celestial::{spawn_meteor, spawn_planet, MeteorOptions, PlanetModel, PlanetOptions};
use crate::collision::CollisionSystem;
use crate::config::GameConfig;
use crate::director::EncounterDirector;
use crate::enemy_controller::EnemyController;
use crate::hud::{self, HudConfig, HudInfo};
use crate::player_controller::PlayerController;
use crate::scene::Scene;
use crate::ship::{self, ShipClass};

/// What a level gets to work with each frame.
pub struct GameContext<'a> {
    pub scene: &'a mut Scene,
    pub input: &'a InputState,
    pub config: &'a GameConfig,
}

pub trait Level {
    fn name(&self) -> &str;
    fn on_enter(&mut self, ctx: &mut GameContext);
    /// Runs after the scene has been integrated.
    fn on_update(&mut self, ctx: &mut GameContext, dt: f32);
    /// Runs after every level update; collision and cleanup go here.
    fn on_post_update(&mut self, _ctx: &mut GameContext, _dt: f32) {}
    fn on_exit(&mut self, ctx: &mut GameContext);
    /// Overlay for the current frame.
    fn ui(&self, _scene: &Scene) -> Option<UiNode> {
        None
    }
}

/// Holds the active level and handles switching.
#[derive(Default)]
pub struct LevelManager {
    current: Option<Box<dyn Level>>,
}

impl LevelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit the current level, clear the scene, then enter `level`.
    pub fn change(&mut self, ctx: &mut GameContext, mut level: Box<dyn Level>) {
        if let Some(mut old) = self.current.take() {
            log::info!("Exiting level {}", old.name());
            old.on_exit(ctx);
        }
        ctx.scene.clear();
        log::info!("Entering level {}", level.name());
        level.on_enter(ctx);
        self.current = Some(level);
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref().map(|l| l.name())
    }

    pub fn update(&mut self, ctx: &mut GameContext, dt: f32) {
        if let Some(level) = self.current.as_mut() {
            level.on_update(ctx, dt);
        }
    }

    pub fn post_update(&mut self, ctx: &mut GameContext, dt: f32) {
        if let Some(level) = self.current.as_mut() {
            level.on_post_update(ctx, dt);
        }
    }

    pub fn ui(&self, scene: &Scene) -> Option<UiNode> {
        self.current.as_ref().and_then(|l| l.ui(scene))
    }
}

// ── Combat level ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatState {
    /// Start screen; any key launches.
    Waiting,
    Playing,
    GameOver,
    Victory,
}

/// Controllers that only exist once the player has launched.
struct Session {
    player: Entity,
    player_controller: PlayerController,
    camera: ShipCameraController,
    /// Debug fly camera; while set it owns the view and the ship coasts.
    free_camera: Option<FreeCameraController>,
    enemies: EnemyController,
    collisions: CollisionSystem,
    director: EncounterDirector,
}

pub struct CombatLevel {
    state: CombatState,
    session: Option<Session>,
    hud: HudConfig,
}

impl Default for CombatLevel {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatLevel {
    const RING_METEORS: usize = 300;
    const RING_RADIUS: f32 = 300.0;
    const RING_THICKNESS: f32 = 40.0;
    const RING_HEIGHT: f32 = 25.0;
    const FREE_CAMERA_KEY: KeyCode = KeyCode::F1;

    pub fn new() -> Self {
        Self {
            state: CombatState::Waiting,
            session: None,
            hud: HudConfig::default(),
        }
    }

    pub fn state(&self) -> CombatState {
        self.state
    }

    pub fn player(&self) -> Option<Entity> {
        self.session.as_ref().map(|s| s.player)
    }

    pub fn enemy_controller(&self) -> Option<&EnemyController> {
        self.session.as_ref().map(|s| &s.enemies)
    }

    pub fn director(&self) -> Option<&EncounterDirector> {
        self.session.as_ref().map(|s| &s.director)
    }

    pub fn free_camera_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.free_camera.is_some())
    }

    fn spawn_celestials(scene: &mut Scene) {
        let mercury_center = Vec3::new(150.0, 0.0, 400.0);
        spawn_planet(
            scene,
            PlanetOptions {
                model: PlanetModel::MercuryPlanet,
                position: mercury_center,
                scale: 30.0,
                hit_radius: 150.0,
                spin_speed: 0.02,
            },
        );

        let spacing = TAU / Self::RING_METEORS as f32;
        for i in 0..Self::RING_METEORS {
            let options = {
                let rng = scene.rng_mut();
                let angle = i as f32 * spacing + rng.gen_range(-1.0..=1.0) * spacing * 0.55;
                let radius = Self::RING_RADIUS + rng.gen_range(-1.0..=1.0) * Self::RING_THICKNESS;
                let height = rng.gen_range(-1.0..=1.0) * Self::RING_HEIGHT;
                let (sin, cos) = angle.sin_cos();

                let tangent = Vec3::new(-sin, 0.0, cos);
                let radial = Vec3::new(cos, 0.0, sin);
                let velocity = tangent * rng.gen_range(3.0..=9.0)
                    + radial * rng.gen_range(-1.2..=1.2)
                    + Vec3::Y * rng.gen_range(-0.6..=0.6);
                let spin_axis = Vec3::new(
                    rng.gen_range(-1.0..=1.0),
                    rng.gen_range(-1.0..=1.0),
                    rng.gen_range(-1.0..=1.0),
                );

                MeteorOptions {
                    model: None,
                    position: mercury_center + Vec3::new(cos * radius, height, sin * radius),
                    scale: 6.0 + rng.gen::<f32>() * 500.0,
                    hit_radius: 8.0 + rng.gen::<f32>() * 6.0,
                    spin: Some(Spin::new(spin_axis, rng.gen_range(-0.5..=0.5), SpinSpace::Local)),
                    velocity,
                    max_distance: Some(1000.0),
                }
            };
            spawn_meteor(scene, options);
        }

        spawn_planet(
            scene,
            PlanetOptions {
                model: PlanetModel::LavaPlanet,
                position: Vec3::new(-300.0, 100.0, 120.0),
                scale: 150.0,
                hit_radius: 150.0,
                spin_speed: 0.01,
            },
        );
    }

    fn start_game(&mut self, ctx: &mut GameContext) {
        let scene = &mut *ctx.scene;
        let player = ship::spawn_ship(scene, ShipClass::XFighter, Transform::default());

        let mut player_controller = PlayerController::new();
        player_controller.use_mouse_steering = ctx.config.mouse_steering;
        player_controller.mouse_sensitivity = ctx.config.mouse_sensitivity;
        player_controller.possess(player);

        let (enemies, director) = match ctx.config.seed {
            Some(seed) => (
                EnemyController::with_seed(player, ctx.config.enemy.clone(), seed),
                EncounterDirector::with_seed(ctx.config.total_waves, seed),
            ),
            None => (
                EnemyController::new(player, ctx.config.enemy.clone()),
                EncounterDirector::new(ctx.config.total_waves),
            ),
        };

        self.session = Some(Session {
            player,
            player_controller,
            camera: ShipCameraController::new(player, ctx.config.start_camera_mode),
            free_camera: None,
            enemies,
            collisions: CollisionSystem::new(),
            director,
        });
        self.state = CombatState::Playing;
        log::info!("Launch: player ship {:?}", player);
    }
}

impl Level for CombatLevel {
    fn name(&self) -> &str {
        "combat"
    }

    fn on_enter(&mut self, ctx: &mut GameContext) {
        self.state = CombatState::Waiting;
        self.session = None;
        self.hud.screen_size = Vec2::new(ctx.config.window_width as f32, ctx.config.window_height as f32);

        let scene = &mut *ctx.scene;
        scene.background = Some("sky_galaxy".to_string());
        scene.camera.transform.position = Vec3::new(0.0, 0.0, 1.0);
        scene.camera.look_at(Vec3::new(0.0, 0.0, -1.0));
        Self::spawn_celestials(scene);
    }

    fn on_update(&mut self, ctx: &mut GameContext, dt: f32) {
        match self.state {
            CombatState::Waiting => {
                if ctx.input.is_any_key_held() {
                    self.start_game(ctx);
                }
            }
            CombatState::Playing => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                let scene = &mut *ctx.scene;
                if ctx.input.is_key_pressed(Self::FREE_CAMERA_KEY) {
                    session.free_camera = match session.free_camera.take() {
                        Some(_) => None,
                        None => Some(FreeCameraController::new(&scene.camera)),
                    };
                    log::info!("Free camera {}", if session.free_camera.is_some() { "on" } else { "off" });
                }

                if session.free_camera.is_some() {
                    ship::set_control_input(scene, session.player, 0.0, 0.0, 0.0, 0.0);
                    ship::set_firing(scene, session.player, false);
                } else {
                    session.player_controller.update(scene, ctx.input);
                }
                session.enemies.update(scene, dt);
                match session.free_camera.as_mut() {
                    Some(free) => free.update(&mut scene.camera, ctx.input, dt),
                    None => session.camera.update(scene, ctx.input, dt),
                }

                if !scene.is_active(session.player) {
                    log::info!("Player destroyed during wave {}", session.director.wave());
                    self.state = CombatState::GameOver;
                    return;
                }

                let player_transform = scene.transform(session.player).unwrap_or_default();
                let spawns = session
                    .director
                    .update(dt, session.enemies.enemy_count(), &player_transform);
                for position in spawns {
                    let mut transform = Transform::from_position(position);
                    transform.look_at(player_transform.position);
                    let enemy = ship::spawn_ship(scene, ShipClass::TFighter, transform);
                    session.enemies.add_enemy(scene, enemy);
                }

                if session.director.is_victory() {
                    log::info!("Victory after {} waves", session.director.total_waves());
                    self.state = CombatState::Victory;
                }
            }
            CombatState::GameOver | CombatState::Victory => {}
        }
    }

    fn on_post_update(&mut self, ctx: &mut GameContext, dt: f32) {
        if self.state != CombatState::Playing {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            let report = session.collisions.resolve(ctx.scene, dt);
            if report.damage_events > 0 {
                log::debug!("Collisions: {:?}", report);
            }
        }
    }

    fn on_exit(&mut self, _ctx: &mut GameContext) {
        self.session = None;
    }

    fn ui(&self, scene: &Scene) -> Option<UiNode> {
        let node = match self.state {
            CombatState::Waiting => hud::start_screen(),
            CombatState::GameOver => {
                let wave = self.director().map(|d| d.wave()).unwrap_or(0);
                hud::game_over_screen(wave)
            }
            CombatState::Victory => {
                let total = self.director().map(|d| d.total_waves()).unwrap_or(0);
                hud::victory_screen(total)
            }
            CombatState::Playing => {
                let session = self.session.as_ref()?;
                let info = HudInfo {
                    player: ship::combatant(scene, session.player),
                    max_shield: ShipClass::XFighter.spec().shield,
                    wave: session.director.wave(),
                    total_waves: session.director.total_waves(),
                    enemies_alive: session.enemies.enemy_count(),
                };
                hud::combat_hud(&info, &self.hud)
            }
        };
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{CelestialKind, Kind};
    use crate::ship::ShipControls;
    use input::ElementState;

    fn config() -> GameConfig {
        GameConfig {
            seed: Some(99),
            total_waves: 1,
            ..GameConfig::default()
        }
    }

    #[test]
    fn entering_builds_the_backdrop() {
        let mut scene = Scene::with_seed(800, 600, 99);
        let input = InputState::new();
        let config = config();
        let mut ctx = GameContext { scene: &mut scene, input: &input, config: &config };
        let mut levels = LevelManager::new();
        levels.change(&mut ctx, Box::new(CombatLevel::new()));
        scene.flush();

        let count = |kind: Kind| scene.entities().iter().filter(|e| scene.kind(**e) == Some(kind)).count();
        assert_eq!(count(Kind::Celestial(CelestialKind::Planet)), 2);
        assert_eq!(count(Kind::Celestial(CelestialKind::Meteor)), 300);
        assert!(scene.ships().is_empty());
        assert_eq!(scene.background.as_deref(), Some("sky_galaxy"));
        assert!((scene.camera.forward() - Vec3::NEG_Z).length() < 1e-5);
        assert_eq!(levels.current_name(), Some("combat"));
    }

    #[test]
    fn any_key_launches_and_spawns_waves() {
        let mut scene = Scene::with_seed(800, 600, 99);
        let mut input = InputState::new();
        let config = config();
        let mut level = CombatLevel::new();
        {
            let mut ctx = GameContext { scene: &mut scene, input: &input, config: &config };
            level.on_enter(&mut ctx);
            level.on_update(&mut ctx, 0.1);
        }
        assert_eq!(level.state(), CombatState::Waiting);
        assert!(level.ui(&scene).unwrap().find("start").is_some());

        input.process_keyboard(KeyCode::Enter, ElementState::Pressed);
        for _ in 0..40 {
            scene.update(0.1);
            let mut ctx = GameContext { scene: &mut scene, input: &input, config: &config };
            level.on_update(&mut ctx, 0.1);
            level.on_post_update(&mut ctx, 0.1);
        }
        assert_eq!(level.state(), CombatState::Playing);
        assert!(level.player().is_some());
        assert!(level.enemy_controller().unwrap().enemy_count() > 0);
        assert_eq!(scene.ships().len(), 1 + level.enemy_controller().unwrap().enemy_count());
        assert!(level.ui(&scene).unwrap().find("crosshair").is_some());
    }

    #[test]
    fn losing_the_player_ends_the_game() {
        let mut scene = Scene::with_seed(800, 600, 99);
        let mut input = InputState::new();
        let config = config();
        let mut level = CombatLevel::new();
        input.process_keyboard(KeyCode::Space, ElementState::Pressed);
        {
            let mut ctx = GameContext { scene: &mut scene, input: &input, config: &config };
            level.on_enter(&mut ctx);
            level.on_update(&mut ctx, 0.1);
        }
        let player = level.player().unwrap();
        ship::apply_damage(&mut scene, player, 1_000.0);

        let mut ctx = GameContext { scene: &mut scene, input: &input, config: &config };
        level.on_update(&mut ctx, 0.1);
        assert_eq!(level.state(), CombatState::GameOver);
        assert!(level.ui(&scene).unwrap().find("game_over").is_some());
    }

    #[test]
    fn debug_key_hands_the_view_to_the_free_camera() {
        let mut scene = Scene::with_seed(800, 600, 99);
        let mut input = InputState::new();
        let config = config();
        let mut level = CombatLevel::new();
        input.process_keyboard(KeyCode::Enter, ElementState::Pressed);
        {
            let mut ctx = GameContext { scene: &mut scene, input: &input, config: &config };
            level.on_enter(&mut ctx);
            level.on_update(&mut ctx, 0.1);
        }
        let player = level.player().unwrap();
        input.process_keyboard(KeyCode::Enter, ElementState::Released);
        input.end_frame();

        input.process_keyboard(KeyCode::F1, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        let before = scene.camera.transform.position;
        {
            let mut ctx = GameContext { scene: &mut scene, input: &input, config: &config };
            level.on_update(&mut ctx, 0.1);
        }
        assert!(level.free_camera_active());
        // W flies the camera at 10 m/s instead of throttling the ship.
        let moved = scene.camera.transform.position - before;
        assert!((moved - scene.camera.forward()).length() < 1e-3);
        assert_eq!(scene.world.get::<&ShipControls>(player).unwrap().throttle, 0.0);

        input.process_keyboard(KeyCode::F1, ElementState::Released);
        input.end_frame();
        input.process_keyboard(KeyCode::F1, ElementState::Pressed);
        {
            let mut ctx = GameContext { scene: &mut scene, input: &input, config: &config };
            level.on_update(&mut ctx, 0.1);
        }
        assert!(!level.free_camera_active());
        assert_eq!(scene.world.get::<&ShipControls>(player).unwrap().throttle, 1.0);
    }
}
