//! Timed status effects on the wanderer, ticked once per move.
//!
//! Two tick mechanisms coexist. Every effect applies its own per-turn HP and
//! sanity deltas, and a handful of legacy kinds (poison, burn, torch) carry
//! fixed behavior keyed by kind: poison and burn deal the constant tick damage,
//! and torch suppresses the per-move sanity cost.

use super::attributes::{StatType, Stats};
use crate::core::constants::{
    BURN_DURATION, BURN_TICK_DAMAGE, NUM_STATS, POISON_DURATION, POISON_TICK_DAMAGE,
    TORCH_DURATION,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    Poison,
    Burn,
    Torch,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Duration {
    Turns(u32),
    Infinite,
}

/// Additive then multiplicative stat adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModifiers {
    pub additive: [i32; NUM_STATS],
    pub multiplier: [f64; NUM_STATS],
}

impl Default for StatModifiers {
    fn default() -> Self {
        Self {
            additive: [0; NUM_STATS],
            multiplier: [1.0; NUM_STATS],
        }
    }
}

impl StatModifiers {
    pub fn add(mut self, stat: StatType, amount: i32) -> Self {
        self.additive[stat.index()] += amount;
        self
    }

    pub fn scale(mut self, stat: StatType, factor: f64) -> Self {
        self.multiplier[stat.index()] *= factor;
        self
    }

    pub fn apply_to(&self, stats: &Stats) -> Stats {
        let mut out = *stats;
        for stat in StatType::all() {
            let i = stat.index();
            let base = stats.get(stat) as i64 + self.additive[i] as i64;
            let scaled = (base.max(0) as f64 * self.multiplier[i]).round();
            out.set(stat, scaled.max(0.0) as u32);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub id: String,
    pub kind: StatusKind,
    pub icon: String,
    /// Translation key for the label
    pub label: String,
    pub duration: Duration,
    #[serde(default)]
    pub hp_per_turn: i32,
    #[serde(default)]
    pub sanity_per_turn: i32,
    #[serde(default)]
    pub stat_mods: StatModifiers,
}

impl StatusEffect {
    pub fn generic(id: &str, icon: &str, duration: Duration) -> Self {
        Self {
            id: id.to_string(),
            kind: StatusKind::Generic,
            icon: icon.to_string(),
            label: format!("status.{}", id),
            duration,
            hp_per_turn: 0,
            sanity_per_turn: 0,
            stat_mods: StatModifiers::default(),
        }
    }

    pub fn poison() -> Self {
        Self {
            kind: StatusKind::Poison,
            ..Self::generic("poison", "☠", Duration::Turns(POISON_DURATION))
        }
    }

    pub fn burn() -> Self {
        Self {
            kind: StatusKind::Burn,
            ..Self::generic("burn", "🔥", Duration::Turns(BURN_DURATION))
        }
    }

    pub fn torch() -> Self {
        Self {
            kind: StatusKind::Torch,
            ..Self::generic("torch", "🕯", Duration::Turns(TORCH_DURATION))
        }
    }

    pub fn with_hp_per_turn(mut self, delta: i32) -> Self {
        self.hp_per_turn = delta;
        self
    }

    pub fn with_sanity_per_turn(mut self, delta: i32) -> Self {
        self.sanity_per_turn = delta;
        self
    }

    pub fn with_stat_mods(mut self, mods: StatModifiers) -> Self {
        self.stat_mods = mods;
        self
    }

    /// Total HP change this effect applies on one tick, legacy damage included.
    pub fn hp_tick(&self) -> i32 {
        let legacy = match self.kind {
            StatusKind::Poison => -(POISON_TICK_DAMAGE as i32),
            StatusKind::Burn => -(BURN_TICK_DAMAGE as i32),
            StatusKind::Torch | StatusKind::Generic => 0,
        };
        self.hp_per_turn + legacy
    }
}

/// Net result of ticking every active effect once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusTick {
    pub hp_delta: i32,
    pub sanity_delta: i32,
    pub expired: Vec<StatusEffect>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectSet {
    effects: Vec<StatusEffect>,
}

impl StatusEffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an effect, replacing any active effect with the same id.
    pub fn apply(&mut self, effect: StatusEffect) {
        match self.effects.iter_mut().find(|e| e.id == effect.id) {
            Some(existing) => *existing = effect,
            None => self.effects.push(effect),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<StatusEffect> {
        let pos = self.effects.iter().position(|e| e.id == id)?;
        Some(self.effects.remove(pos))
    }

    pub fn has(&self, id: &str) -> bool {
        self.effects.iter().any(|e| e.id == id)
    }

    pub fn has_kind(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn get(&self, id: &str) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Applies every effect's modifiers to `base` in application order.
    pub fn modified_stats(&self, base: &Stats) -> Stats {
        self.effects
            .iter()
            .fold(*base, |stats, e| e.stat_mods.apply_to(&stats))
    }

    /// Sums per-turn deltas, decrements durations and drops effects that hit zero.
    pub fn tick(&mut self) -> StatusTick {
        let mut result = StatusTick::default();
        for effect in &mut self.effects {
            result.hp_delta += effect.hp_tick();
            result.sanity_delta += effect.sanity_per_turn;
            if let Duration::Turns(turns) = &mut effect.duration {
                *turns = turns.saturating_sub(1);
            }
        }
        let (expired, kept): (Vec<_>, Vec<_>) = self
            .effects
            .drain(..)
            .partition(|e| e.duration == Duration::Turns(0));
        self.effects = kept;
        result.expired = expired;
        result
    }
}
