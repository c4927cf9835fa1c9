//! Game configuration (window, controls, pacing, AI). Loaded from config.ron at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::camera_controller::CameraMode;
use crate::enemy_controller::EnemyTuning;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("could not serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Persistent game settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Surface width in pixels.
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// Surface height in pixels.
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Radians of pitch/yaw command per pixel of mouse motion.
    #[serde(default = "default_mouse_sensitivity")]
    pub mouse_sensitivity: f32,
    /// Steer with the mouse instead of the arrow keys.
    #[serde(default = "default_true")]
    pub mouse_steering: bool,
    /// Simulation speed multiplier (1.0 = real time).
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,
    /// Longest frame step in seconds; slower frames are clamped.
    #[serde(default = "default_max_frame_delta")]
    pub max_frame_delta: f32,
    #[serde(default = "default_total_waves")]
    pub total_waves: u32,
    #[serde(default)]
    pub start_camera_mode: CameraMode,
    #[serde(default)]
    pub enemy: EnemyTuning,
    /// Fixed seed for reproducible sessions; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    720
}
fn default_mouse_sensitivity() -> f32 {
    0.02
}
fn default_true() -> bool {
    true
}
fn default_time_scale() -> f32 {
    1.0
}
fn default_max_frame_delta() -> f32 {
    0.1
}
fn default_total_waves() -> u32 {
    5
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            mouse_sensitivity: default_mouse_sensitivity(),
            mouse_steering: default_true(),
            time_scale: default_time_scale(),
            max_frame_delta: default_max_frame_delta(),
            total_waves: default_total_waves(),
            start_camera_mode: CameraMode::default(),
            enemy: EnemyTuning::default(),
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn from_ron_str(data: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(data)?)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_ron_str(&data)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            log::info!("No config at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid config at {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    /// Save current config to `config.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Err(e) = self.save_to(&path) {
            log::warn!("Could not write config to {:?}: {}", path, e);
        }
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_struct_gives_defaults() {
        let config = GameConfig::from_ron_str("()").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.total_waves, 5);
        assert_eq!(config.start_camera_mode, CameraMode::ThirdPerson);
        assert_eq!(config.enemy.detection_range, 160.0);
    }

    #[test]
    fn partial_config_overrides_only_given_fields() {
        let config = GameConfig::from_ron_str(
            "(total_waves: 2, mouse_steering: false, start_camera_mode: FirstPerson, enemy: (attack_range: 90.0), seed: Some(42))",
        )
        .unwrap();
        assert_eq!(config.total_waves, 2);
        assert!(!config.mouse_steering);
        assert_eq!(config.start_camera_mode, CameraMode::FirstPerson);
        assert_eq!(config.enemy.attack_range, 90.0);
        assert_eq!(config.enemy.lose_range, 260.0);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.window_width, 1280);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(matches!(
            GameConfig::from_ron_str("(total_waves: \"many\")"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn pretty_output_reads_back() {
        let mut config = GameConfig::default();
        config.time_scale = 0.5;
        let text = config.to_ron_string().unwrap();
        assert_eq!(GameConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("voidstrike-no-such-config.ron");
        assert!(matches!(GameConfig::load_from(&path), Err(ConfigError::Io(_))));
    }
}
