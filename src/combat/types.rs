use serde::{Deserialize, Serialize};

use super::monster::{BodyPart, Monster};
use crate::character::attributes::Stats;
use crate::core::constants::*;
use crate::core::log::{push_bounded, LogLine};
use crate::dungeon::types::Theme;
use std::collections::VecDeque;

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

// The epsilon keeps float noise like 8.500000001 from bumping a whole step.
pub(crate) fn ceil_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale - 1e-9).ceil() / scale
}

pub(crate) fn floor_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale + 1e-9).floor() / scale
}

/// ATB countdown. Whoever reaches zero first acts next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtbGauge {
    pub max_tick: f64,
    pub current_tick: f64,
}

impl AtbGauge {
    /// `100 / max(1, spd)` rounded to two decimals, starting full.
    pub fn for_speed(spd: u32) -> Self {
        let max_tick = round_to(ATB_TICK_BUDGET / spd.max(1) as f64, 2);
        Self {
            max_tick,
            current_tick: max_tick,
        }
    }

    /// Scales the gauge by a carry multiplier. Light loads round up, heavy
    /// loads round down, and a multiplier of exactly 1 leaves it alone.
    pub fn with_carry_multiplier(self, multiplier: f64) -> Self {
        let scaled = self.max_tick * multiplier;
        let max_tick = if multiplier < 1.0 {
            ceil_to(scaled, 2)
        } else if multiplier > 1.0 {
            floor_to(scaled, 2)
        } else {
            return self;
        };
        Self {
            max_tick,
            current_tick: max_tick,
        }
    }

    pub fn reset(&mut self) {
        self.current_tick = self.max_tick;
    }

    pub fn is_ready(&self) -> bool {
        self.current_tick <= ATB_READY_EPSILON
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerCombatant {
    pub hp: u32,
    pub max_hp: u32,
    /// Stats after status modifiers, as of combat start. Entangle lowers AGI here.
    pub stats: Stats,
    pub def: u32,
    /// Average weapon damage, or STR + 5 unarmed. Display only.
    pub base_attack: f64,
    pub gauge: AtbGauge,
}

impl PlayerCombatant {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterCombatant {
    pub monster: Monster,
    #[serde(default)]
    pub is_summon: bool,
    pub gauge: AtbGauge,
}

impl MonsterCombatant {
    pub fn new(monster: Monster, is_summon: bool) -> Self {
        let gauge = AtbGauge::for_speed(monster.spd);
        Self {
            monster,
            is_summon,
            gauge,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.monster.is_alive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatPhase {
    Init,
    Player,
    Monster,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Turn {
    Player,
    Monster,
}

/// An ATB participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    Player,
    Monster(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatResult {
    Victory,
    Defeat,
    Fled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatLogEntry {
    pub line: LogLine,
    pub is_crit: bool,
    pub is_player_action: bool,
}

/// One encounter. Plain data so it can be snapshotted between any two calls.
///
/// IMPORTANT: When adding new fields, use `#[serde(default)]` so older
/// snapshots still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    pub player: PlayerCombatant,
    pub monsters: Vec<MonsterCombatant>,
    pub active_target: usize,
    /// Monster the player last swung at, hit or miss
    #[serde(default)]
    pub last_attacked: Option<usize>,
    /// Set by the scheduler when a specific monster is up
    #[serde(default)]
    pub acting_monster: Option<usize>,
    /// Scheduler's forward pointer, used to resume without replaying ticks
    #[serde(default)]
    pub next_turn: Option<Turn>,
    /// Player actions taken; gates turn-based monster abilities
    pub turn: u32,
    pub phase: CombatPhase,
    #[serde(default)]
    pub result: Option<CombatResult>,
    pub theme: Theme,
    /// Tile the monster came from, so a surviving monster can be put back on flee
    #[serde(default)]
    pub origin_tile: Option<usize>,
    #[serde(default)]
    pub log: VecDeque<CombatLogEntry>,
}

impl CombatState {
    pub fn active_target(&self) -> Option<&MonsterCombatant> {
        self.monsters.get(self.active_target)
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    pub fn living_monster_indices(&self) -> Vec<usize> {
        self.monsters
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_alive())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn all_monsters_dead(&self) -> bool {
        self.monsters.iter().all(|m| !m.is_alive())
    }

    pub fn living_summons(&self) -> usize {
        self.monsters
            .iter()
            .filter(|m| m.is_summon && m.is_alive())
            .count()
    }

    /// SPD of the fastest living monster, 0 if none are left.
    pub fn fastest_monster_spd(&self) -> u32 {
        self.monsters
            .iter()
            .filter(|m| m.is_alive())
            .map(|m| m.monster.spd)
            .max()
            .unwrap_or(0)
    }

    pub fn gauge_mut(&mut self, actor: Actor) -> Option<&mut AtbGauge> {
        match actor {
            Actor::Player => Some(&mut self.player.gauge),
            Actor::Monster(i) => self.monsters.get_mut(i).map(|m| &mut m.gauge),
        }
    }

    pub fn add_log_entry(&mut self, line: LogLine, is_crit: bool, is_player_action: bool) {
        push_bounded(
            &mut self.log,
            CombatLogEntry {
                line,
                is_crit,
                is_player_action,
            },
            COMBAT_LOG_CAPACITY,
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackOutcome {
    pub hit: bool,
    pub damage: u32,
    pub critical: bool,
    pub weapon_broke: bool,
    pub target_index: Option<usize>,
    pub part: Option<BodyPart>,
    pub killed: bool,
    /// Thorn damage the player took back
    pub thorns: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonsterAttackOutcome {
    pub damage: u32,
    pub evaded: bool,
    pub monster_index: Option<usize>,
    /// Sanity-driven critical hit
    pub critical: bool,
    /// The monster spent its turn on a self-buff
    pub skipped: bool,
    pub summoned: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DamageRange {
    pub min: u32,
    pub max: u32,
}
