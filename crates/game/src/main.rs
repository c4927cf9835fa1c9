//! Voidstrike headless runner.
//!
//! Drives the combat level without a window: launches, flies forward with the
//! trigger held and reports what the renderer was handed.
//!
//! Usage: `voidstrike [frames]` (default 1800, i.e. 30 s at 60 Hz).

use std::time::Duration;

use anyhow::{Context, Result};
use game::level::CombatLevel;
use game::{Game, GameConfig};
use input::{ElementState, KeyCode, MouseButton};
use renderer::{AssetStore, HeadlessRenderer};

const DEFAULT_FRAMES: u64 = 1800;
const FRAME: Duration = Duration::from_nanos(16_666_667);

/// Geometry ids the simulation refers to.
const GEOMETRY_IDS: &[&str] = &[
    "ship_x-wing",
    "ship_t-fighter",
    "ship_challenger_v1",
    "earth",
    "lava_planet",
    "mercury_planet",
    "meteor_a",
    "meteor_b",
    "meteor_c",
    "meteor_d",
];

fn placeholder_assets() -> AssetStore {
    let mut assets = AssetStore::new();
    for id in GEOMETRY_IDS {
        assets.insert(*id, ());
    }
    assets
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let frames = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("frame count must be a positive integer, got {arg:?}"))?,
        None => DEFAULT_FRAMES,
    };

    let config = GameConfig::load();
    log::info!("Starting Voidstrike headless session: {} frames", frames);

    let mut game = Game::new(config, HeadlessRenderer::new(placeholder_assets()));
    game.init().context("failed to initialize renderer")?;
    game.start(Box::new(CombatLevel::new()));

    game.frame(FRAME).context("first frame failed")?;
    let input = game.input_mut();
    input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
    input.process_mouse_button(MouseButton::Left, ElementState::Pressed);

    for frame in 1..frames {
        game.frame(FRAME)
            .with_context(|| format!("frame {frame} failed"))?;

        if frame % 600 == 0 {
            let stats = game.renderer().stats();
            log::info!(
                "t={:.1}s ships={} draws={} particles={}",
                game.time.elapsed_seconds(),
                game.scene.ships().len(),
                stats.draws,
                stats.particles
            );
        }
    }

    let stats = game.renderer().stats();
    log::info!(
        "Session finished after {:.1}s: {} frames rendered, {} ships in play, {} missing meshes",
        game.time.elapsed_seconds(),
        stats.frames,
        game.scene.ships().len(),
        stats.missing_meshes
    );
    Ok(())
}
