//! HUD (Heads-Up Display) trees for the combat level.
//! Builds crosshair, hull/shield bars, wave status and full-screen banners as
//! `UiNode` trees; the renderer lays them out.

use glam::{Vec2, Vec4};
use renderer::UiNode;

use crate::ship::Combatant;

const WHITE: Vec4 = Vec4::new(1.0, 1.0, 1.0, 0.9);
const HULL: Vec4 = Vec4::new(0.2, 0.9, 0.3, 0.9);
const HULL_LOW: Vec4 = Vec4::new(0.95, 0.25, 0.2, 0.9);
const SHIELD: Vec4 = Vec4::new(0.3, 0.6, 1.0, 0.9);
const BAR_BACK: Vec4 = Vec4::new(0.0, 0.0, 0.0, 0.5);

/// HUD layout configuration
#[derive(Debug, Clone)]
pub struct HudConfig {
    pub screen_size: Vec2,
    pub bar_size: Vec2,
    pub crosshair_size: f32,
    /// Hull fraction below which the bar turns red.
    pub low_health: f32,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            screen_size: Vec2::new(1280.0, 720.0),
            bar_size: Vec2::new(260.0, 14.0),
            crosshair_size: 18.0,
            low_health: 0.3,
        }
    }
}

/// Everything the in-flight HUD shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudInfo {
    pub player: Option<Combatant>,
    /// Shield the player started with, for scaling the shield bar.
    pub max_shield: f32,
    pub wave: u32,
    pub total_waves: u32,
    pub enemies_alive: usize,
}

pub fn crosshair(config: &HudConfig) -> UiNode {
    let s = config.crosshair_size;
    let t = 2.0;
    UiNode::group("crosshair")
        .with_z(10)
        .with_child(UiNode::rect("crosshair.h", Vec2::new(s, t), WHITE))
        .with_child(UiNode::rect("crosshair.v", Vec2::new(t, s), WHITE))
}

fn bar(id: &str, fraction: f32, color: Vec4, config: &HudConfig) -> UiNode {
    let fraction = fraction.clamp(0.0, 1.0);
    let size = config.bar_size;
    let fill = Vec2::new(size.x * fraction, size.y);
    UiNode::group(id)
        .with_child(UiNode::rect(format!("{id}.back"), size, BAR_BACK))
        // Fill is left-aligned inside the background.
        .with_child(
            UiNode::rect(format!("{id}.fill"), fill, color).at(-(size.x - fill.x) * 0.5, 0.0),
        )
}

/// Hull and shield bars in the bottom-left corner.
pub fn status_bars(player: &Combatant, max_shield: f32, config: &HudConfig) -> UiNode {
    let half = config.screen_size * 0.5;
    let x = -half.x + config.bar_size.x * 0.5 + 24.0;
    let y = -half.y + 40.0;

    let hull = player.health_fraction();
    let hull_color = if hull < config.low_health { HULL_LOW } else { HULL };
    let mut group = UiNode::group("status").at(x, y).with_z(5);
    group.push(bar("status.hull", hull, hull_color, config));
    if max_shield > 0.0 {
        group.push(bar("status.shield", player.shield / max_shield, SHIELD, config).at(0.0, 20.0));
    }
    group
}

pub fn wave_status(wave: u32, total_waves: u32, enemies_alive: usize, config: &HudConfig) -> UiNode {
    let half = config.screen_size * 0.5;
    UiNode::text(
        "wave",
        format!("WAVE {wave}/{total_waves}  HOSTILES {enemies_alive}"),
        20.0,
        WHITE,
    )
    .at(0.0, half.y - 32.0)
    .with_z(5)
}

/// In-flight HUD.
pub fn combat_hud(info: &HudInfo, config: &HudConfig) -> UiNode {
    let mut root = UiNode::group("hud");
    root.push(crosshair(config));
    if let Some(player) = &info.player {
        root.push(status_bars(player, info.max_shield, config));
    }
    if info.wave > 0 {
        root.push(wave_status(info.wave, info.total_waves, info.enemies_alive, config));
    }
    root
}

fn banner(id: &str, title: &str, subtitle: &str) -> UiNode {
    UiNode::group(id)
        .with_z(20)
        .with_child(UiNode::rect(format!("{id}.shade"), Vec2::new(10_000.0, 10_000.0), Vec4::new(0.0, 0.0, 0.0, 0.45)))
        .with_child(UiNode::text(format!("{id}.title"), title, 56.0, WHITE).at(0.0, 40.0))
        .with_child(UiNode::text(format!("{id}.subtitle"), subtitle, 22.0, WHITE).at(0.0, -20.0))
}

pub fn start_screen() -> UiNode {
    banner("start", "VOIDSTRIKE", "Press any key to launch")
}

pub fn game_over_screen(wave: u32) -> UiNode {
    banner("game_over", "SHIP DESTROYED", &format!("You fell during wave {wave}"))
}

pub fn victory_screen(total_waves: u32) -> UiNode {
    banner("victory", "SECTOR CLEAR", &format!("All {total_waves} waves repelled"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::UiContent;

    #[test]
    fn hull_bar_scales_and_turns_red_when_low() {
        let config = HudConfig::default();
        let mut player = Combatant::new(100.0, 50.0, 2.0);
        player.take_damage(130.0);
        let node = status_bars(&player, 50.0, &config);

        let fill = node.find("status.hull.fill").unwrap();
        match &fill.content {
            UiContent::Rect { size, color } => {
                assert!((size.x - config.bar_size.x * 0.2).abs() < 1e-3);
                assert_eq!(*color, HULL_LOW);
            }
            other => panic!("unexpected content {other:?}"),
        }
        assert!(node.find("status.shield").is_some());
    }

    #[test]
    fn hud_omits_bars_without_player() {
        let info = HudInfo {
            player: None,
            max_shield: 0.0,
            wave: 2,
            total_waves: 5,
            enemies_alive: 3,
        };
        let hud = combat_hud(&info, &HudConfig::default());
        assert!(hud.find("crosshair").is_some());
        assert!(hud.find("status").is_none());
        match &hud.find("wave").unwrap().content {
            UiContent::Text { text, .. } => assert_eq!(text, "WAVE 2/5  HOSTILES 3"),
            other => panic!("unexpected content {other:?}"),
        }
    }
}
