//! Dungeon balance simulator for Monte Carlo analysis.
//!
//! Plays thousands of whole runs through [`GameSession`] with a fixed policy to
//! see how often a map clears, where runs die, and how fast wanderers level.
//!
//! [`GameSession`]: crate::core::session::GameSession

mod config;
mod report;
mod runner;

pub use config::SimConfig;
pub use report::{RunStats, SimReport};
pub use runner::run_simulation;
