//! Wander - dungeon crawler core library
//!
//! Turn-based ATB combat and the looped-board dungeon run, exposed for a UI
//! shell, the balance simulator and tests.

pub mod character;
pub mod combat;
pub mod core;
pub mod dungeon;
pub mod items;
pub mod simulator;
pub mod utils;
