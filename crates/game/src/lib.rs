//! Voidstrike: space-combat simulation core.
//!
//! Ships, bullets, celestial bodies and effects live in a [`scene::Scene`];
//! levels drive the player, enemy and camera controllers over it, and a
//! [`game::Game`] steps everything once per frame and hands an immutable
//! frame snapshot to a [`renderer::Renderer`].

pub mod bullet;
pub mod camera;
pub mod camera_controller;
pub mod celestial;
pub mod collision;
pub mod components;
pub mod config;
pub mod director;
pub mod effects;
pub mod enemy_controller;
pub mod game;
pub mod hud;
pub mod level;
pub mod player_controller;
pub mod scene;
pub mod ship;

pub use config::GameConfig;
pub use game::Game;
pub use scene::Scene;
