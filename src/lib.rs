//! Snake Arcade - a terminal snake game with four rule variants
//!
//! This library provides:
//! - Core game logic (game module): engine, session state, spawners, opponent AI
//! - Terminal rendering and input (render and input modules)
//! - High score and settings storage (persistence module)
//! - An offline world leaderboard (leaderboard module)
//! - The interactive front end (modes module)

pub mod game;
pub mod input;
pub mod leaderboard;
pub mod metrics;
pub mod modes;
pub mod persistence;
pub mod render;
