//! Looped tile board construction.

use super::maps::MapConfig;
use super::types::{DungeonRunState, RunPhase, Tile, TileKind};
use crate::character::status::StatusEffectSet;
use crate::character::wanderer::Wanderer;
use std::collections::VecDeque;

/// Builds a square ring of `4 * (side - 1)` tiles. Index 0 is the start tile and
/// the other three corners sit at each `side - 1` step.
pub fn build_board(side: usize) -> Vec<Tile> {
    let edge = side.max(2) - 1;
    let count = 4 * edge;
    (0..count)
        .map(|index| {
            let kind = if index == 0 {
                TileKind::Start
            } else if index % edge == 0 {
                TileKind::Corner
            } else {
                TileKind::Empty
            };
            Tile::new(index, kind)
        })
        .collect()
}

impl DungeonRunState {
    /// Fresh run on `map`, starting in the spawn phase on tile 0.
    pub fn new(map: &MapConfig, wanderer: &Wanderer) -> Self {
        let max_hp = wanderer.max_hp();
        let max_sanity = wanderer.max_sanity();
        Self {
            map_id: map.id.clone(),
            theme: map.theme,
            tiles: build_board(map.side),
            position: 0,
            wave: 1,
            turn: 0,
            phase: RunPhase::Spawn,
            current_hp: max_hp,
            max_hp,
            sanity: max_sanity,
            max_sanity,
            status_effects: StatusEffectSet::new(),
            exp: wanderer.exp,
            level: wanderer.level.max(1),
            exp_to_next: DungeonRunState::exp_threshold(wanderer.level.max(1)),
            free_stat_points: 0,
            encountered_events: Vec::new(),
            pending_spawn: None,
            active_event: None,
            outcome: None,
            log: VecDeque::new(),
        }
    }
}
