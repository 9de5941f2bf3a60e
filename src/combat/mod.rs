//! ATB combat: monsters, encounter state and the engine operations.

#![allow(unused_imports)]

pub mod logic;
pub mod monster;
pub mod types;

pub use logic::*;
pub use types::*;
