//! Game configuration
//!
//! Pacing, level cap, orbit and targeting tuning. Persisted as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;

/// Tunable game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Pacing ===
    /// Flat-mode pause between highlights (seconds)
    pub sequence_step_delay: f32,
    /// Player response window (seconds); advisory unless enforced
    pub input_timeout: f32,
    /// Fail the round when `input_timeout` elapses without a selection
    pub enforce_input_timeout: bool,
    /// Give up waiting for the orbiter after this long (None = wait forever)
    pub arrival_timeout: Option<f32>,
    /// Delay before the first playback of a new game
    pub start_delay: f32,
    /// Orbiter grow time before playback
    pub grow_duration: f32,
    /// Pause after an orbit-mode highlight
    pub highlight_hold: f32,
    /// Orbiter shrink time before the input window opens
    pub settle_duration: f32,
    /// Pause between a completed round and the next level
    pub next_level_delay: f32,
    /// Input guard release after a correct pick
    pub input_cooldown: f32,

    // === Progression ===
    /// Completing this level ends the game
    pub max_level: u32,

    // === Orbit ===
    /// Distance from the observer at which orbs are spawned
    pub spawn_distance: f32,
    /// Orbit radius; half the spawn distance by default
    pub orbit_radius: f32,
    /// Linear approach speed, converted to angular speed by the navigator
    pub approach_speed: f32,

    // === Targeting ===
    pub selection_max_distance: f32,
    /// Degrees from the observer's forward direction
    pub selection_max_angle_deg: f32,
    /// Committed selection is cleared this long after being forwarded
    pub selection_clear_delay: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            sequence_step_delay: SEQUENCE_STEP_DELAY,
            input_timeout: INPUT_TIMEOUT,
            enforce_input_timeout: false,
            arrival_timeout: None,
            start_delay: START_DELAY,
            grow_duration: GROW_DURATION,
            highlight_hold: HIGHLIGHT_HOLD,
            settle_duration: SETTLE_DURATION,
            next_level_delay: NEXT_LEVEL_DELAY,
            input_cooldown: INPUT_COOLDOWN,

            max_level: MAX_LEVEL,

            spawn_distance: SPAWN_DISTANCE,
            orbit_radius: SPAWN_DISTANCE * 0.5,
            approach_speed: APPROACH_SPEED,

            selection_max_distance: SELECTION_MAX_DISTANCE,
            selection_max_angle_deg: SELECTION_MAX_ANGLE_DEG,
            selection_clear_delay: SELECTION_CLEAR_DELAY,
        }
    }
}

impl GameConfig {
    /// Defaults with the orbit radius derived from a spawn distance
    pub fn with_spawn_distance(spawn_distance: f32) -> Self {
        Self {
            spawn_distance,
            orbit_radius: spawn_distance * 0.5,
            ..Self::default()
        }
    }

    /// Angular speed of the orbiter (radians per second)
    pub fn angular_speed(&self) -> f32 {
        self.approach_speed / self.orbit_radius
    }

    /// Reject values the engine or navigator cannot work with
    pub fn validate(&self) -> Result<(), SimError> {
        if self.max_level == 0 {
            return Err(SimError::InvalidConfig("max_level must be at least 1".into()));
        }
        if !(self.orbit_radius > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "orbit_radius must be positive, got {}",
                self.orbit_radius
            )));
        }
        if !(self.approach_speed > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "approach_speed must be positive, got {}",
                self.approach_speed
            )));
        }
        if !(self.selection_max_distance > 0.0) || !(self.selection_max_angle_deg > 0.0) {
            return Err(SimError::InvalidConfig(
                "selection limits must be positive".into(),
            ));
        }
        let delays = [
            ("sequence_step_delay", self.sequence_step_delay),
            ("input_timeout", self.input_timeout),
            ("start_delay", self.start_delay),
            ("grow_duration", self.grow_duration),
            ("highlight_hold", self.highlight_hold),
            ("settle_duration", self.settle_duration),
            ("next_level_delay", self.next_level_delay),
            ("input_cooldown", self.input_cooldown),
            ("selection_clear_delay", self.selection_clear_delay),
        ];
        for (name, value) in delays {
            if !(value >= 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if let Some(timeout) = self.arrival_timeout {
            if !(timeout > 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "arrival_timeout must be positive, got {timeout}"
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON document (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.orbit_radius - 0.75).abs() < 1e-6);
        assert!(!config.enforce_input_timeout);
        assert!(config.arrival_timeout.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GameConfig::from_json(r#"{ "max_level": 3, "sequence_step_delay": 0.25 }"#)
            .expect("valid config");
        assert_eq!(config.max_level, 3);
        assert!((config.sequence_step_delay - 0.25).abs() < 1e-6);
        assert!((config.approach_speed - APPROACH_SPEED).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_zero_max_level() {
        let err = GameConfig::from_json(r#"{ "max_level": 0 }"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = GameConfig::from_json("{ max_level: ").unwrap_err();
        assert!(matches!(err, SimError::ConfigParse(_)));
    }

    #[test]
    fn test_spawn_distance_sets_radius() {
        let config = GameConfig::with_spawn_distance(2.0);
        assert!((config.orbit_radius - 1.0).abs() < 1e-6);
        assert!((config.angular_speed() - APPROACH_SPEED).abs() < 1e-6);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!(
            "sphere_says_config_{}.json",
            std::process::id()
        ));
        let mut config = GameConfig::default();
        config.max_level = 7;
        config.arrival_timeout = Some(4.0);
        config.save(&path).expect("save");
        let loaded = GameConfig::load(&path).expect("load");
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
