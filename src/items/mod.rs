//! Item system: weapons, the satchel and loot tables.

pub mod inventory;
pub mod loot;
pub mod types;

pub use inventory::{CarryTier, Inventory, Satchel};
pub use types::*;
