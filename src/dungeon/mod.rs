//! Dungeon run: looped board, spawn/move/action state machine, events and maps.

#![allow(unused_imports)]

pub mod board;
pub mod events;
pub mod logic;
pub mod maps;
pub mod types;

pub use maps::{get_map, MapConfig};
pub use types::*;
