//! Encounter tuning and stage records.
//!
//! Both load from RON or JSON, picked by file extension, and are validated
//! before use.

use bevy::math::Vec2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::boss::AttackTable;
use crate::constants::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse RON in {path}")]
    Ron {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to parse JSON")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("unsupported config format for {0} (expected .ron or .json)")]
    UnsupportedFormat(PathBuf),
}

/// Player-side tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_health: u8,
    /// Units per 1/60 s
    pub speed: f32,
    pub dash_multiplier: f32,
    pub attack_damage: u32,
    pub supermove_damage: u32,
    pub attack_range: f32,
    pub shield_threshold: u32,
    pub start_tension: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: PLAYER_MAX_HEALTH,
            speed: PLAYER_SPEED,
            dash_multiplier: PLAYER_DASH_MULT,
            attack_damage: PLAYER_ATTACK_DAMAGE,
            supermove_damage: PLAYER_SUPERMOVE_DAMAGE,
            attack_range: PLAYER_ATTACK_RANGE,
            shield_threshold: PLAYER_SHIELD_THRESHOLD,
            start_tension: PLAYER_START_TENSION,
        }
    }
}

/// Boss-side tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub max_health: u32,
    pub melee_range: f32,
    pub phase_two_threshold: u32,
    pub projectile_speed: f32,
    pub missile_speed: f32,
    pub attack_table: AttackTable,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            max_health: BOSS_MAX_HEALTH,
            melee_range: BOSS_MELEE_RANGE,
            phase_two_threshold: BOSS_PHASE_TWO_THRESHOLD,
            projectile_speed: BOSS_PROJECTILE_SPEED,
            missile_speed: BOSS_MISSILE_SPEED,
            attack_table: AttackTable::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    pub seed: u64,
    pub player: PlayerTuning,
    pub boss: BossTuning,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            player: PlayerTuning::default(),
            boss: BossTuning::default(),
        }
    }
}

impl EncounterConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.player;
        let b = &self.boss;
        let checks = [
            (p.max_health > 0, "player.max_health must be positive"),
            (positive(p.speed), "player.speed must be positive"),
            (
                positive(p.dash_multiplier),
                "player.dash_multiplier must be positive",
            ),
            (p.attack_damage > 0, "player.attack_damage must be positive"),
            (
                p.supermove_damage > 0,
                "player.supermove_damage must be positive",
            ),
            (positive(p.attack_range), "player.attack_range must be positive"),
            (
                p.shield_threshold > 0,
                "player.shield_threshold must be positive",
            ),
            (
                p.start_tension <= TENSION_MAX,
                "player.start_tension exceeds the tension maximum",
            ),
            (b.max_health > 0, "boss.max_health must be positive"),
            (positive(b.melee_range), "boss.melee_range must be positive"),
            (
                b.phase_two_threshold < b.max_health,
                "boss.phase_two_threshold must be below boss.max_health",
            ),
            (
                positive(b.projectile_speed),
                "boss.projectile_speed must be positive",
            ),
            (positive(b.missile_speed), "boss.missile_speed must be positive"),
        ];
        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, reason)) => Err(ConfigError::Invalid((*reason).to_string())),
            None => Ok(()),
        }
    }

    /// Load and validate from a `.ron` or `.json` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = load_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Geometry of one arena stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    pub field_width: f32,
    pub field_height: f32,
    pub player_spawn: [f32; 2],
    pub boss_spawn: [f32; 2],
}

impl Default for StageConfig {
    fn default() -> Self {
        Self::stage1()
    }
}

impl StageConfig {
    /// Narrow corridor stage
    pub fn stage1() -> Self {
        Self {
            name: "stage1".into(),
            field_width: 252.0,
            field_height: 654.0,
            player_spawn: [136.0, 136.0],
            boss_spawn: [200.0, 576.0],
        }
    }

    /// Wide open stage
    pub fn stage2() -> Self {
        Self {
            name: "stage2".into(),
            field_width: 1024.0,
            field_height: 768.0,
            player_spawn: [236.0, 236.0],
            boss_spawn: [900.0, 576.0],
        }
    }

    /// Bundled preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "stage1" => Some(Self::stage1()),
            "stage2" => Some(Self::stage2()),
            _ => None,
        }
    }

    pub fn player_position(&self) -> Vec2 {
        Vec2::from_array(self.player_spawn)
    }

    pub fn boss_position(&self) -> Vec2 {
        Vec2::from_array(self.boss_spawn)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.field_width > ARENA_MARGIN && self.field_height > ARENA_MARGIN) {
            return Err(ConfigError::Invalid(format!(
                "stage {} must be larger than the {ARENA_MARGIN} unit margin",
                self.name
            )));
        }
        let inside = |p: [f32; 2]| {
            (ARENA_MARGIN..=self.field_width).contains(&p[0])
                && (ARENA_MARGIN..=self.field_height).contains(&p[1])
        };
        if !inside(self.player_spawn) || !inside(self.boss_spawn) {
            return Err(ConfigError::Invalid(format!(
                "stage {} spawns must lie inside the arena",
                self.name
            )));
        }
        Ok(())
    }

    /// Load and validate from a `.ron` or `.json` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let stage: Self = load_file(path)?;
        stage.validate()?;
        Ok(stage)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let stage: Self = serde_json::from_str(json)?;
        stage.validate()?;
        Ok(stage)
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

/// Deserialize `path` according to its extension.
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => ron::from_str(&content).map_err(|source| ConfigError::Ron {
            path: path.to_path_buf(),
            source,
        }),
        Some("json") => Ok(serde_json::from_str(&content)?),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}
