//! Inventory seam consumed by combat and movement.
//!
//! The engine only needs three things from an inventory: the equipped weapon,
//! a way to wear it down, and the carry-weight tier. [`Satchel`] is the
//! in-crate implementation used by the session, the simulator and tests.

use super::types::{Item, ItemKind, Weapon};
use serde::{Deserialize, Serialize};

/// Carry-weight bucket: caps the movement die and scales the ATB tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarryTier {
    pub tier: u8,
    pub move_dice_cap: u32,
    pub atb_tick_multiplier: f64,
}

impl CarryTier {
    pub const LIGHT: CarryTier = CarryTier {
        tier: 0,
        move_dice_cap: 6,
        atb_tick_multiplier: 0.85,
    };
    pub const NORMAL: CarryTier = CarryTier {
        tier: 1,
        move_dice_cap: 6,
        atb_tick_multiplier: 1.0,
    };
    pub const HEAVY: CarryTier = CarryTier {
        tier: 2,
        move_dice_cap: 4,
        atb_tick_multiplier: 1.2,
    };
    pub const OVERLOADED: CarryTier = CarryTier {
        tier: 3,
        move_dice_cap: 2,
        atb_tick_multiplier: 1.5,
    };
    pub const CRUSHED: CarryTier = CarryTier {
        tier: 4,
        move_dice_cap: 1,
        atb_tick_multiplier: 2.0,
    };

    /// Tier for a load against a capacity derived from STR.
    pub fn for_load(weight: u32, strength: u32) -> Self {
        let capacity = carry_capacity(strength) as f64;
        let ratio = weight as f64 / capacity;
        if ratio < 0.3 {
            Self::LIGHT
        } else if ratio < 0.7 {
            Self::NORMAL
        } else if ratio < 1.0 {
            Self::HEAVY
        } else if ratio < 1.3 {
            Self::OVERLOADED
        } else {
            Self::CRUSHED
        }
    }
}

pub fn carry_capacity(strength: u32) -> u32 {
    20 + 2 * strength
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeaponWear {
    pub broken: bool,
}

pub trait Inventory {
    fn equipped_weapon(&self) -> Option<&Weapon>;

    /// Uses up one point of durability; a weapon at zero is swapped for fists.
    fn degrade_weapon_durability(&mut self) -> WeaponWear;

    fn carry_tier(&self, strength: u32) -> CarryTier;

    /// Stores an item. Returns false, leaving the inventory untouched, when full.
    fn add_item(&mut self, item: Item) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Satchel {
    pub weapon: Option<Weapon>,
    pub items: Vec<Item>,
    pub slots: usize,
}

impl Default for Satchel {
    fn default() -> Self {
        Self::new(12)
    }
}

impl Satchel {
    pub fn new(slots: usize) -> Self {
        Self {
            weapon: None,
            items: Vec::new(),
            slots,
        }
    }

    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapon = Some(weapon);
        self
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.slots
    }

    pub fn total_weight(&self) -> u32 {
        self.items.iter().map(|i| i.weight).sum()
    }

    /// Removes and returns the first consumable, if any.
    pub fn take_consumable(&mut self) -> Option<Item> {
        let pos = self
            .items
            .iter()
            .position(|i| matches!(i.kind, ItemKind::Consumable { .. }))?;
        Some(self.items.remove(pos))
    }
}

impl Inventory for Satchel {
    fn equipped_weapon(&self) -> Option<&Weapon> {
        self.weapon.as_ref()
    }

    fn degrade_weapon_durability(&mut self) -> WeaponWear {
        let Some(weapon) = self.weapon.as_mut() else {
            return WeaponWear::default();
        };
        let Some(durability) = weapon.durability.as_mut() else {
            return WeaponWear::default();
        };
        *durability = durability.saturating_sub(1);
        if *durability == 0 {
            tracing::debug!(weapon = %weapon.id, "weapon broke");
            self.weapon = Some(Weapon::fists());
            return WeaponWear { broken: true };
        }
        WeaponWear::default()
    }

    fn carry_tier(&self, strength: u32) -> CarryTier {
        CarryTier::for_load(self.total_weight(), strength)
    }

    fn add_item(&mut self, item: Item) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push(item);
        true
    }
}
