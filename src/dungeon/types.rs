//! Dungeon run data structures.
//!
//! `DungeonRunState` is the single source of truth for an active run and is
//! fully serializable so a reload can resume at any phase.

use crate::character::status::{StatusEffectSet, StatusKind};
use crate::combat::monster::Monster;
use crate::core::constants::{EXP_TABLE, RUN_LOG_CAPACITY};
use crate::core::log::{push_bounded, LogLine};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Theme {
    Forest,
    Mine,
    Swamp,
    Crypt,
}

impl Theme {
    pub fn all() -> [Theme; 4] {
        [Theme::Forest, Theme::Mine, Theme::Swamp, Theme::Crypt]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Theme::Forest => "forest",
            Theme::Mine => "mine",
            Theme::Swamp => "swamp",
            Theme::Crypt => "crypt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Start,
    Corner,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Shroud,
    Fog,
    Visible,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChestData {
    /// Loot table id
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TileObject {
    Monster(Monster),
    Chest(ChestData),
    /// Event placed by the spawn phase; the concrete event is rolled on landing
    Event,
}

impl TileObject {
    pub fn key(&self) -> &'static str {
        match self {
            TileObject::Monster(_) => "monster",
            TileObject::Chest(_) => "chest",
            TileObject::Event => "event",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub index: usize,
    pub kind: TileKind,
    pub object: Option<TileObject>,
    pub visited: bool,
    pub visibility: Visibility,
}

impl Tile {
    pub fn new(index: usize, kind: TileKind) -> Self {
        Self {
            index,
            kind,
            object: None,
            visited: false,
            visibility: Visibility::Shroud,
        }
    }

    /// Empty tile type with nothing on it; the only valid spawn target.
    pub fn is_open(&self) -> bool {
        self.kind == TileKind::Empty && self.object.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Spawn,
    Move,
    /// Resolving a tile; combat and events hold the run here until they finish
    Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Cleared,
    Dead,
    Abandoned,
}

/// Dice rolled at the start of a spawn phase, kept so a reload mid-spawn can
/// finish placing what was rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpawnRoll {
    pub monsters: u32,
    pub treasures: u32,
    pub events: u32,
}

/// Interactive event waiting for the player's choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub event_id: String,
    /// Translation keys of the offered choices, in display order
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonRunState {
    pub map_id: String,
    pub theme: Theme,
    pub tiles: Vec<Tile>,
    pub position: usize,
    pub wave: u32,
    pub turn: u32,
    pub phase: RunPhase,
    pub current_hp: u32,
    pub max_hp: u32,
    pub sanity: u32,
    pub max_sanity: u32,
    #[serde(default)]
    pub status_effects: StatusEffectSet,
    pub exp: u32,
    pub level: u32,
    pub exp_to_next: u32,
    pub free_stat_points: u32,
    #[serde(default)]
    pub encountered_events: Vec<String>,
    #[serde(default)]
    pub pending_spawn: Option<SpawnRoll>,
    #[serde(default)]
    pub active_event: Option<ActiveEvent>,
    #[serde(default)]
    pub outcome: Option<RunOutcome>,
    #[serde(default)]
    pub log: VecDeque<LogLine>,
}

impl DungeonRunState {
    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn tile_mut(&mut self, index: usize) -> Option<&mut Tile> {
        self.tiles.get_mut(index)
    }

    pub fn current_tile(&self) -> Option<&Tile> {
        self.tile(self.position)
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn has_torch(&self) -> bool {
        self.status_effects.has_kind(StatusKind::Torch)
    }

    pub fn push_log(&mut self, line: LogLine) {
        push_bounded(&mut self.log, line, RUN_LOG_CAPACITY);
    }

    pub fn monster_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|t| matches!(t.object, Some(TileObject::Monster(_))))
            .count()
    }

    /// EXP threshold for leaving `level`, clamped to the table's last entry.
    pub fn exp_threshold(level: u32) -> u32 {
        let index = (level.saturating_sub(1) as usize).min(EXP_TABLE.len() - 1);
        EXP_TABLE[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_is_open() {
        let mut tile = Tile::new(3, TileKind::Empty);
        assert!(tile.is_open());
        tile.object = Some(TileObject::Event);
        assert!(!tile.is_open());
        assert!(!Tile::new(0, TileKind::Start).is_open());
        assert!(!Tile::new(5, TileKind::Corner).is_open());
    }

    #[test]
    fn test_exp_threshold_clamps_to_last_entry() {
        assert_eq!(DungeonRunState::exp_threshold(1), EXP_TABLE[0]);
        assert_eq!(DungeonRunState::exp_threshold(3), EXP_TABLE[2]);
        assert_eq!(
            DungeonRunState::exp_threshold(500),
            EXP_TABLE[EXP_TABLE.len() - 1]
        );
    }
}
