//! Rule variants selected when a session starts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named ruleset a session is played under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Classic,
    Maze,
    TimeTrial,
    Battle,
}

/// Which subsystems a mode turns on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRules {
    pub obstacles: bool,
    pub opponent: bool,
    pub countdown: bool,
    pub power_ups: bool,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [
        GameMode::Classic,
        GameMode::Maze,
        GameMode::TimeTrial,
        GameMode::Battle,
    ];

    pub fn rules(&self) -> ModeRules {
        match self {
            GameMode::Classic => ModeRules {
                obstacles: false,
                opponent: false,
                countdown: false,
                power_ups: true,
            },
            GameMode::Maze => ModeRules {
                obstacles: true,
                opponent: false,
                countdown: false,
                power_ups: true,
            },
            GameMode::TimeTrial => ModeRules {
                obstacles: false,
                opponent: false,
                countdown: true,
                power_ups: true,
            },
            GameMode::Battle => ModeRules {
                obstacles: false,
                opponent: true,
                countdown: false,
                power_ups: false,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Maze => "maze",
            GameMode::TimeTrial => "time",
            GameMode::Battle => "battle",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameMode::Classic => "Classic",
            GameMode::Maze => "Maze",
            GameMode::TimeTrial => "Time Trial",
            GameMode::Battle => "Battle",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(GameMode::Classic),
            "maze" => Ok(GameMode::Maze),
            "time" | "time_trial" | "timetrial" => Ok(GameMode::TimeTrial),
            "battle" => Ok(GameMode::Battle),
            other => Err(format!("unknown game mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_maze_has_obstacles() {
        for mode in GameMode::ALL {
            assert_eq!(mode.rules().obstacles, mode == GameMode::Maze);
        }
    }

    #[test]
    fn test_battle_disables_power_ups() {
        let rules = GameMode::Battle.rules();
        assert!(rules.opponent);
        assert!(!rules.power_ups);
        assert!(!rules.countdown);
    }

    #[test]
    fn test_only_time_trial_counts_down() {
        for mode in GameMode::ALL {
            assert_eq!(mode.rules().countdown, mode == GameMode::TimeTrial);
        }
    }

    #[test]
    fn test_parse_round_trip() {
        for mode in GameMode::ALL {
            assert_eq!(mode.as_str().parse::<GameMode>(), Ok(mode));
        }
        assert!("snakes".parse::<GameMode>().is_err());
    }
}
