//! Sanity tiers.
//!
//! Sanity 0-100 maps onto seven contiguous bands. Each band is a fixed bundle of
//! modifiers read by combat and movement. The table is monotonic: every player
//! modifier gets worse and every monster modifier gets better as sanity drops.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SanityTier {
    Lucid,
    Steady,
    Uneasy,
    Anxious,
    Disturbed,
    Hysteric,
    Madness,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanityModifiers {
    pub accuracy: i32,
    pub evasion: i32,
    pub preemptive: i32,
    pub flee: i32,
    pub discovery: i32,
    /// Multiplier on the per-move sanity cost
    pub decay_rate: f64,
    pub monster_accuracy: i32,
    pub monster_damage_pct: i32,
    pub monster_crit: i32,
    pub ambush: i32,
}

/// (lower bound, tier, modifiers), ordered from highest band to lowest.
const TIERS: [(u32, SanityTier, SanityModifiers); 7] = [
    (91, SanityTier::Lucid, mods(5, 5, 10, 10, 10, 0.8, -5, -10, 0, 0)),
    (76, SanityTier::Steady, mods(3, 3, 5, 5, 5, 0.9, -3, -5, 0, 2)),
    (61, SanityTier::Uneasy, mods(0, 0, 0, 0, 0, 1.0, 0, 0, 2, 5)),
    (41, SanityTier::Anxious, mods(-3, -2, -5, -5, 0, 1.1, 3, 5, 4, 8)),
    (21, SanityTier::Disturbed, mods(-5, -5, -10, -10, -5, 1.2, 5, 10, 6, 12)),
    (11, SanityTier::Hysteric, mods(-10, -8, -15, -15, -5, 1.35, 8, 20, 8, 16)),
    (0, SanityTier::Madness, mods(-15, -10, -20, -20, -10, 1.5, 10, 30, 10, 20)),
];

#[allow(clippy::too_many_arguments)]
const fn mods(
    accuracy: i32,
    evasion: i32,
    preemptive: i32,
    flee: i32,
    discovery: i32,
    decay_rate: f64,
    monster_accuracy: i32,
    monster_damage_pct: i32,
    monster_crit: i32,
    ambush: i32,
) -> SanityModifiers {
    SanityModifiers {
        accuracy,
        evasion,
        preemptive,
        flee,
        discovery,
        decay_rate,
        monster_accuracy,
        monster_damage_pct,
        monster_crit,
        ambush,
    }
}

impl SanityTier {
    pub fn from_sanity(sanity: u32) -> Self {
        TIERS
            .iter()
            .find(|(floor, _, _)| sanity >= *floor)
            .map(|(_, tier, _)| *tier)
            .unwrap_or(SanityTier::Madness)
    }

    pub fn modifiers(&self) -> SanityModifiers {
        TIERS
            .iter()
            .find(|(_, tier, _)| tier == self)
            .map(|(_, _, m)| *m)
            .unwrap_or(TIERS[TIERS.len() - 1].2)
    }

    pub fn key(&self) -> &'static str {
        match self {
            SanityTier::Lucid => "sanity.lucid",
            SanityTier::Steady => "sanity.steady",
            SanityTier::Uneasy => "sanity.uneasy",
            SanityTier::Anxious => "sanity.anxious",
            SanityTier::Disturbed => "sanity.disturbed",
            SanityTier::Hysteric => "sanity.hysteric",
            SanityTier::Madness => "sanity.madness",
        }
    }
}

/// Modifier bundle for a raw sanity value.
pub fn sanity_modifiers(sanity: u32) -> SanityModifiers {
    SanityTier::from_sanity(sanity).modifiers()
}
