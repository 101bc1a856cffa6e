//! Game Configuration
//!
//! Tuning constants for the player and the round rules. `Default` returns the
//! shipped values; `assets/config.json` may override any subset of them.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::Deserialize;
use tracing::info;

use crate::error::{GameError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "assets/config.json";
pub const DEFAULT_SCORE_LOG_PATH: &str = "assets/scores/data.txt";

/// Player movement, gravity and gun tuning.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Signed gravity at spawn; negative pulls toward -Y
    pub gravity: f32,
    /// World units per gravity unit (the level is built in centimetres)
    pub gravity_scale: f32,
    /// Terminal speed along the gravity axis (units/s)
    pub max_fall_speed: f32,
    /// Minimum seconds between two gravity reversals
    pub reverse_cooldown: f32,
    /// Longest continuous fall (seconds) during which a reversal is still accepted
    pub max_reverse_fall_time: f32,
    /// Gun flip rate (degrees/s)
    pub gun_rotation_speed: f32,
    pub gun_max_rotation: f32,
    /// Gun slide rate (units/s)
    pub gun_translation_speed: f32,
    pub gun_max_translation: f32,
    /// Ray growth rate while shooting (units/s)
    pub ray_growth_speed: f32,
    pub ray_max_length: f32,
    pub light_radius: f32,
    /// Walk speed (units/s)
    pub move_speed: f32,
    pub jump_speed: f32,
    /// Radians per pixel of mouse motion
    pub look_sensitivity: f32,
    /// Ellipsoid radii of the player's collision volume
    pub collider_radius: Vec3,
    /// Spectator orbit rate (degrees/s)
    pub spectator_spin_speed: f32,
    pub spawn_position: Vec3,
    pub far_plane: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            gravity_scale: 100.0,
            max_fall_speed: 2500.0,
            reverse_cooldown: 0.5,
            max_reverse_fall_time: 0.2,
            gun_rotation_speed: 600.0,
            gun_max_rotation: 180.0,
            gun_translation_speed: 30.0,
            gun_max_translation: 7.0,
            ray_growth_speed: 500.0,
            ray_max_length: 1000.0,
            light_radius: 90.0,
            move_speed: 300.0,
            jump_speed: 400.0,
            look_sensitivity: 0.002,
            collider_radius: Vec3::new(30.0, 60.0, 30.0),
            spectator_spin_speed: 20.0,
            spawn_position: Vec3::ZERO,
            far_plane: 5000.0,
        }
    }
}

/// Win/kill volumes and score drain.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RoundRules {
    /// Center of the goal pad
    pub goal: Vec3,
    /// Distance from `goal` that counts as reaching it
    pub goal_radius: f32,
    /// The player dies below this camera height
    pub kill_min_y: f32,
    /// The player dies above this camera height
    pub kill_max_y: f32,
    pub starting_score: f32,
    /// Score lost per second of play
    pub score_drain: f32,
    /// Extra score lost per second while the ray is held
    pub shooting_drain: f32,
    /// Extra score lost per second while the light is held
    pub lighting_drain: f32,
    /// Upper bound on a single frame's delta time (seconds)
    pub max_delta_time: f32,
}

impl Default for RoundRules {
    fn default() -> Self {
        Self {
            goal: Vec3::new(2017.0, -400.0, 2700.0),
            goal_radius: 150.0,
            kill_min_y: -1500.0,
            kill_max_y: 1500.0,
            starting_score: 20000.0,
            score_drain: 500.0,
            shooting_drain: 5000.0,
            lighting_drain: 1000.0,
            max_delta_time: 0.1,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player: PlayerTuning,
    pub round: RoundRules,
    pub score_log_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            round: RoundRules::default(),
            score_log_path: PathBuf::from(DEFAULT_SCORE_LOG_PATH),
        }
    }
}

impl GameConfig {
    /// Load overrides from `path`, falling back to defaults when the file is absent
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|e| GameError::io(path, e))?;
        let config = serde_json::from_str(&text).map_err(|source| GameError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }
}
