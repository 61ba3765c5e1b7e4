use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::grid::{Grid, Position};

/// Smallest board the obstacle generators can lay patterns on
pub const MIN_GRID_SIDE: usize = 10;

/// Selectable starting speeds; 1 is the default 150 ms pace
pub const STARTING_SPEEDS: RangeInclusive<u8> = 1..=3;

/// Configuration for the game
///
/// Durations are stored in milliseconds so the struct round-trips through JSON
/// without nested duration objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width of the game grid in cells
    pub grid_width: usize,
    /// Height of the game grid in cells
    pub grid_height: usize,

    /// Lives at the start of a session
    pub initial_lives: u32,
    /// Countdown for time-trial sessions
    pub time_limit_ms: u64,

    // Speed progression
    /// Tick interval at level 1
    pub base_interval_ms: u64,
    /// Interval reduction per level
    pub level_interval_step_ms: u64,
    /// Floor for level-driven speed-ups
    pub min_level_interval_ms: u64,
    /// Floor while a speed power-up is active
    pub min_boosted_interval_ms: u64,
    pub speed_factor: f64,
    pub slow_factor: f64,

    // Scoring
    pub points_per_level: u32,
    pub normal_food_points: u32,
    pub special_food_points: u32,
    pub special_food_chance: f64,

    // Power-ups
    /// Chance of a power-up appearing after food is eaten
    pub power_up_chance_on_eat: f64,
    /// How often the background power-up roll happens
    pub power_up_roll_interval_ms: u64,
    pub power_up_roll_chance: f64,
    /// How long an unpicked power-up stays on the board
    pub power_up_lifetime_ms: u64,
    /// How long a collected effect lasts
    pub power_up_duration_ms: u64,
    /// Shrink only applies to snakes longer than this
    pub shrink_min_length: usize,

    /// Pause between losing a life and the snake reappearing
    pub respawn_delay_ms: u64,
    /// Random draws before spawners fall back to a linear scan
    pub spawn_attempts: usize,
    /// Obstacles closer than this (Chebyshev) to the start cell or the snake are dropped
    pub obstacle_guard_radius: i32,
    pub max_obstacle_patterns: u32,

    /// Fixed RNG seed, random when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 20,
            initial_lives: 3,
            time_limit_ms: 60_000,
            base_interval_ms: 150,
            level_interval_step_ms: 10,
            min_level_interval_ms: 70,
            min_boosted_interval_ms: 50,
            speed_factor: 0.7,
            slow_factor: 1.5,
            points_per_level: 50,
            normal_food_points: 10,
            special_food_points: 25,
            special_food_chance: 0.1,
            power_up_chance_on_eat: 0.15,
            power_up_roll_interval_ms: 10_000,
            power_up_roll_chance: 0.3,
            power_up_lifetime_ms: 10_000,
            power_up_duration_ms: 5_000,
            shrink_min_length: 5,
            respawn_delay_ms: 1_000,
            spawn_attempts: 64,
            obstacle_guard_radius: 2,
            max_obstacle_patterns: 5,
            seed: None,
        }
    }
}

/// Reasons a configuration is rejected
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid must be at least {min}x{min} cells, got {width}x{height}")]
    GridTooSmall {
        width: usize,
        height: usize,
        min: usize,
    },
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },
    #[error("{field} must be within [0, 1], got {value}")]
    NotAProbability { field: &'static str, value: f64 },
    #[error("min_level_interval_ms ({min}) exceeds base_interval_ms ({base})")]
    IntervalFloorAboveBase { min: u64, base: u64 },
    #[error("starting speed must be within {min}..={max}, got {speed}")]
    SpeedOutOfRange { speed: u8, min: u8, max: u8 },
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        }
    }

    /// Read a JSON config file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: GameConfig =
            serde_json::from_str(&raw).context("Failed to parse game config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width < MIN_GRID_SIDE || self.grid_height < MIN_GRID_SIDE {
            return Err(ConfigError::GridTooSmall {
                width: self.grid_width,
                height: self.grid_height,
                min: MIN_GRID_SIDE,
            });
        }

        let positive = [
            ("initial_lives", self.initial_lives as u64),
            ("base_interval_ms", self.base_interval_ms),
            ("min_level_interval_ms", self.min_level_interval_ms),
            ("min_boosted_interval_ms", self.min_boosted_interval_ms),
            ("points_per_level", self.points_per_level as u64),
            ("power_up_duration_ms", self.power_up_duration_ms),
            ("power_up_lifetime_ms", self.power_up_lifetime_ms),
            ("power_up_roll_interval_ms", self.power_up_roll_interval_ms),
            ("spawn_attempts", self.spawn_attempts as u64),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::NotPositive { field: *field });
        }

        let probabilities = [
            ("special_food_chance", self.special_food_chance),
            ("power_up_chance_on_eat", self.power_up_chance_on_eat),
            ("power_up_roll_chance", self.power_up_roll_chance),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::NotAProbability { field, value });
            }
        }

        if self.speed_factor <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "speed_factor",
            });
        }
        if self.slow_factor <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "slow_factor",
            });
        }

        if self.min_level_interval_ms > self.base_interval_ms {
            return Err(ConfigError::IntervalFloorAboveBase {
                min: self.min_level_interval_ms,
                base: self.base_interval_ms,
            });
        }

        Ok(())
    }

    /// Derive the level-1 interval from a starting speed: 180 ms minus 30 ms per step
    pub fn set_starting_speed(&mut self, speed: u8) -> Result<(), ConfigError> {
        if !STARTING_SPEEDS.contains(&speed) {
            return Err(ConfigError::SpeedOutOfRange {
                speed,
                min: *STARTING_SPEEDS.start(),
                max: *STARTING_SPEEDS.end(),
            });
        }
        self.base_interval_ms = 180 - 30 * speed as u64;
        if self.min_level_interval_ms > self.base_interval_ms {
            return Err(ConfigError::IntervalFloorAboveBase {
                min: self.min_level_interval_ms,
                base: self.base_interval_ms,
            });
        }
        Ok(())
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.grid_width, self.grid_height)
    }

    /// Where the player snake (re)appears
    pub fn player_start(&self) -> Position {
        self.grid().center()
    }

    /// Where the battle opponent (re)appears
    pub fn opponent_start(&self) -> Position {
        let center = self.grid().center();
        Position::new(
            (center.x + 4).min(self.grid_width as i32 - 1),
            (center.y + 4).min(self.grid_height as i32 - 1),
        )
    }

    /// Tick interval for a level with no power-up applied
    pub fn level_interval(&self, level: u32) -> Duration {
        let reduction = self
            .level_interval_step_ms
            .saturating_mul(level.saturating_sub(1) as u64);
        let ms = self
            .base_interval_ms
            .saturating_sub(reduction)
            .max(self.min_level_interval_ms);
        Duration::from_millis(ms)
    }

    pub fn level_for_score(&self, score: u32) -> u32 {
        score / self.points_per_level + 1
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.grid_width, 20);
        assert_eq!(config.grid_height, 20);
        assert_eq!(config.initial_lives, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_config() {
        let config = GameConfig::new(15, 25);
        assert_eq!(config.grid_width, 15);
        assert_eq!(config.grid_height, 25);
        assert_eq!(config.base_interval_ms, 150);
    }

    #[test]
    fn test_level_interval_has_floor() {
        let config = GameConfig::default();
        assert_eq!(config.level_interval(1), Duration::from_millis(150));
        assert_eq!(config.level_interval(2), Duration::from_millis(140));
        assert_eq!(config.level_interval(9), Duration::from_millis(70));
        assert_eq!(config.level_interval(50), Duration::from_millis(70));
    }

    #[test]
    fn test_level_interval_non_increasing() {
        let config = GameConfig::default();
        let mut previous = config.level_interval(1);
        for level in 2..40 {
            let next = config.level_interval(level);
            assert!(next <= previous);
            previous = next;
        }
    }

    #[test]
    fn test_level_for_score() {
        let config = GameConfig::default();
        assert_eq!(config.level_for_score(0), 1);
        assert_eq!(config.level_for_score(49), 1);
        assert_eq!(config.level_for_score(50), 2);
        assert_eq!(config.level_for_score(125), 3);
    }

    #[test]
    fn test_start_cells() {
        let config = GameConfig::default();
        assert_eq!(config.player_start(), Position::new(10, 10));
        assert_eq!(config.opponent_start(), Position::new(14, 14));
    }

    #[test]
    fn test_validation_errors() {
        let config = GameConfig::new(4, 20);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GridTooSmall { .. })
        ));

        let config = GameConfig {
            special_food_chance: 1.5,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotAProbability {
                field: "special_food_chance",
                value: 1.5
            })
        );

        let config = GameConfig {
            initial_lives: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "initial_lives"
            })
        );
    }

    #[test]
    fn test_starting_speed() {
        let mut config = GameConfig::default();
        config.set_starting_speed(1).unwrap();
        assert_eq!(config.level_interval(1), Duration::from_millis(150));

        config.set_starting_speed(3).unwrap();
        assert_eq!(config.level_interval(1), Duration::from_millis(90));
        assert_eq!(config.level_interval(2), Duration::from_millis(80));
        assert_eq!(config.level_interval(5), Duration::from_millis(70));
        assert!(config.validate().is_ok());

        assert_eq!(
            config.set_starting_speed(4),
            Err(ConfigError::SpeedOutOfRange {
                speed: 4,
                min: 1,
                max: 3
            })
        );

        let mut config = GameConfig {
            min_level_interval_ms: 100,
            ..Default::default()
        };
        assert_eq!(
            config.set_starting_speed(3),
            Err(ConfigError::IntervalFloorAboveBase { min: 100, base: 90 })
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{"grid_width": 30}"#).unwrap();
        assert_eq!(config.grid_width, 30);
        assert_eq!(config.grid_height, 20);
        assert_eq!(config.seed, None);
    }
}
