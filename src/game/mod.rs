//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! The front end owns a [`GameSession`] and hands it to [`GameEngine::tick`] on every
//! timer beat; nothing in here blocks or touches the terminal.

pub mod action;
pub mod config;
pub mod engine;
pub mod grid;
pub mod mode;
pub mod opponent;
pub mod schedule;
pub mod spawn;
pub mod state;

// Re-export commonly used types
pub use action::{Action, Direction};
pub use config::{ConfigError, GameConfig};
pub use engine::{GameEngine, GameEvent, TickOutcome, TickResult};
pub use grid::{Grid, Position};
pub use mode::{GameMode, ModeRules};
pub use state::{
    ActiveEffectView, CollisionType, Food, FoodKind, GameOverReason, GameSession, Phase, PowerUp,
    PowerUpKind, Snake, Snapshot,
};
