//! Dungeon run state machine: spawn, movement, tile resolution, waves and growth.

use super::maps::MapConfig;
use super::types::{
    ChestData, DungeonRunState, RunOutcome, RunPhase, SpawnRoll, TileKind, TileObject, Visibility,
};
use crate::character::attributes::StatType;
use crate::character::sanity::sanity_modifiers;
use crate::character::status::{StatusEffect, StatusKind};
use crate::character::traits::{has_trait, Trait, TraitKind};
use crate::character::wanderer::Wanderer;
use crate::combat::monster::{find_template, Monster};
use crate::core::constants::*;
use crate::core::log::LogLine;
use crate::items::inventory::CarryTier;
use rand::seq::SliceRandom;
use rand::Rng;

/// What a tile did when the wanderer stopped on it.
#[derive(Debug, Clone, PartialEq)]
pub enum TileInteraction {
    Nothing,
    /// Start tile reached after the first turn
    WaveBoundary,
    Encounter(Monster),
    Chest(ChestData),
    Event { boosted: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepResult {
    pub path: Vec<usize>,
    pub stopped_at_start: bool,
    pub steps_discarded: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub roll: u32,
    pub sanity_lost: u32,
    pub path: Vec<usize>,
    pub stopped_at_start: bool,
    pub final_position: usize,
    /// Status ticking killed the wanderer before they moved
    pub died: bool,
}

/// Removes sanity after trait multipliers. Every sanity loss goes through here.
///
/// Coward adds 30% and a phobia of the current theme adds 50%; the bonuses sum
/// into one factor and the result rounds up. Returns the amount actually lost.
pub fn reduce_sanity(run: &mut DungeonRunState, traits: &[Trait], amount: u32) -> u32 {
    if amount == 0 {
        return 0;
    }
    let mut pct = 100;
    if has_trait(traits, TraitKind::Coward, run.theme) {
        pct += COWARD_SANITY_PCT;
    }
    if has_trait(traits, TraitKind::Phobia, run.theme) {
        pct += PHOBIA_SANITY_PCT;
    }
    let lost = (amount * pct).div_ceil(100);
    run.sanity = run.sanity.saturating_sub(lost);
    lost
}

pub fn restore_sanity(run: &mut DungeonRunState, amount: u32) {
    run.sanity = (run.sanity + amount).min(run.max_sanity);
}

pub fn heal(run: &mut DungeonRunState, amount: u32) {
    run.current_hp = (run.current_hp + amount).min(run.max_hp);
}

/// Applies damage outside combat; marks the run dead at zero HP.
pub fn damage(run: &mut DungeonRunState, amount: u32) -> bool {
    run.current_hp = run.current_hp.saturating_sub(amount);
    if run.current_hp == 0 && run.outcome.is_none() {
        run.outcome = Some(RunOutcome::Dead);
        run.push_log(LogLine::new("run.died"));
    }
    run.current_hp == 0
}

/// Adds or refreshes a status effect on the wanderer.
pub fn apply_status_effect(run: &mut DungeonRunState, effect: StatusEffect, base_view_range: usize) {
    let is_torch = effect.kind == StatusKind::Torch;
    run.push_log(LogLine::new("status.applied").with("id", &effect.id));
    run.status_effects.apply(effect);
    if is_torch {
        update_visibility(run, base_view_range);
    }
}

/// Ticks every status effect once and applies the net deltas.
pub fn tick_status_effects(
    run: &mut DungeonRunState,
    traits: &[Trait],
    base_view_range: usize,
) -> crate::character::status::StatusTick {
    let tick = run.status_effects.tick();
    if tick.hp_delta < 0 {
        damage(run, tick.hp_delta.unsigned_abs());
    } else if tick.hp_delta > 0 {
        heal(run, tick.hp_delta as u32);
    }
    if tick.sanity_delta < 0 {
        reduce_sanity(run, traits, tick.sanity_delta.unsigned_abs());
    } else if tick.sanity_delta > 0 {
        restore_sanity(run, tick.sanity_delta as u32);
    }
    let mut torch_expired = false;
    for effect in &tick.expired {
        torch_expired |= effect.kind == StatusKind::Torch;
        run.push_log(LogLine::new("status.expired").with("id", &effect.id));
    }
    if torch_expired {
        update_visibility(run, base_view_range);
    }
    tick
}

/// Fogs the old window and reveals `±range` tiles around the wanderer, wrapping.
pub fn update_visibility(run: &mut DungeonRunState, base_view_range: usize) {
    let len = run.tiles.len();
    if len == 0 {
        return;
    }
    let range = base_view_range + if run.has_torch() { TORCH_VIEW_BONUS } else { 0 };
    for tile in run.tiles.iter_mut() {
        if tile.visibility == Visibility::Visible {
            tile.visibility = Visibility::Fog;
        }
    }
    let range = range as i64;
    for offset in -range..=range {
        let index = (run.position as i64 + offset).rem_euclid(len as i64) as usize;
        let tile = &mut run.tiles[index];
        tile.visibility = Visibility::Visible;
        tile.visited = true;
    }
}

pub fn roll_spawn_dice(map: &MapConfig, rng: &mut impl Rng) -> SpawnRoll {
    let mut roll = |(lo, hi): (u32, u32)| rng.gen_range(lo.min(hi)..=hi.max(lo));
    SpawnRoll {
        monsters: roll(map.monster_dice),
        treasures: roll(map.treasure_dice),
        events: roll(map.event_dice),
    }
}

/// Picks up to `count` open tiles, excluding the wanderer's own tile.
///
/// Shuffled per call; stops early without error when the board runs out.
pub fn spawn_placements(run: &DungeonRunState, count: u32, rng: &mut impl Rng) -> Vec<usize> {
    let mut open: Vec<usize> = run
        .tiles
        .iter()
        .filter(|t| t.is_open() && t.index != run.position)
        .map(|t| t.index)
        .collect();
    open.shuffle(rng);
    open.truncate(count as usize);
    open
}

/// Places an object on an open tile. Returns false if the tile is taken.
pub fn commit_spawn(run: &mut DungeonRunState, index: usize, object: TileObject) -> bool {
    match run.tile_mut(index) {
        Some(tile) if tile.is_open() => {
            tracing::debug!(tile = index, object = object.key(), "spawned");
            tile.object = Some(object);
            true
        }
        _ => false,
    }
}

/// Walks `steps` tiles around the loop. Reaching tile 0 with steps left stops
/// the walk there and discards the rest.
pub fn advance_position(run: &mut DungeonRunState, steps: u32) -> StepResult {
    let len = run.tiles.len();
    let mut result = StepResult::default();
    if len == 0 {
        return result;
    }
    for step in 1..=steps {
        run.position = (run.position + 1) % len;
        result.path.push(run.position);
        if run.position == 0 && step < steps {
            result.stopped_at_start = true;
            result.steps_discarded = steps - step;
            break;
        }
    }
    result
}

/// Rolls the movement die, pays the move's costs and walks the wanderer.
///
/// No-op outside the move phase. Leaves the run in the action phase on the
/// landing tile, ready for [`resolve_tile`].
pub fn execute_move_phase(
    run: &mut DungeonRunState,
    traits: &[Trait],
    carry: CarryTier,
    base_view_range: usize,
    rng: &mut impl Rng,
) -> MoveOutcome {
    if run.phase != RunPhase::Move || run.is_over() {
        tracing::debug!(phase = ?run.phase, "move requested outside move phase");
        return MoveOutcome {
            final_position: run.position,
            ..MoveOutcome::default()
        };
    }

    let roll = rng.gen_range(1..=carry.move_dice_cap.max(1));
    run.turn += 1;

    let sanity_lost = if run.has_torch() {
        0
    } else {
        let decay = sanity_modifiers(run.sanity).decay_rate;
        let cost = (SANITY_COST_PER_MOVE as f64 * decay).ceil() as u32;
        reduce_sanity(run, traits, cost)
    };

    tick_status_effects(run, traits, base_view_range);
    if run.is_over() {
        return MoveOutcome {
            roll,
            sanity_lost,
            final_position: run.position,
            died: true,
            ..MoveOutcome::default()
        };
    }

    let steps = advance_position(run, roll);
    update_visibility(run, base_view_range);
    run.phase = RunPhase::Action;
    run.push_log(
        LogLine::new("move.rolled")
            .with("roll", roll)
            .with("tile", run.position),
    );
    tracing::debug!(roll, tile = run.position, turn = run.turn, "moved");

    MoveOutcome {
        roll,
        sanity_lost,
        path: steps.path,
        stopped_at_start: steps.stopped_at_start,
        final_position: run.position,
        died: false,
    }
}

/// Resolves the tile under the wanderer, clearing any object on it.
///
/// Empty results put the run straight back into the move phase; everything else
/// leaves it in the action phase for the caller to finish.
pub fn resolve_tile(run: &mut DungeonRunState) -> TileInteraction {
    if run.phase != RunPhase::Action || run.is_over() {
        return TileInteraction::Nothing;
    }
    let turn = run.turn;
    let interaction = match run.tile_mut(run.position) {
        Some(tile) => match tile.kind {
            TileKind::Start if turn > 0 => TileInteraction::WaveBoundary,
            TileKind::Start => TileInteraction::Nothing,
            TileKind::Corner => TileInteraction::Event { boosted: true },
            TileKind::Empty => match tile.object.take() {
                Some(TileObject::Monster(monster)) => TileInteraction::Encounter(monster),
                Some(TileObject::Chest(chest)) => TileInteraction::Chest(chest),
                Some(TileObject::Event) => TileInteraction::Event { boosted: false },
                None => TileInteraction::Nothing,
            },
        },
        None => TileInteraction::Nothing,
    };
    if interaction == TileInteraction::Nothing {
        run.phase = RunPhase::Move;
    }
    interaction
}

/// Moves to the next wave, or clears the run once past the map's last wave.
///
/// Chests and events are swept off the board; monsters stay and are re-leveled
/// in place for the new wave. Returns true if the run was cleared.
pub fn advance_wave(run: &mut DungeonRunState, map: &MapConfig) -> bool {
    run.wave += 1;
    if run.wave > map.max_wave {
        run.outcome = Some(RunOutcome::Cleared);
        run.push_log(LogLine::new("run.cleared").with("waves", map.max_wave));
        tracing::debug!(map = %map.id, "dungeon cleared");
        return true;
    }
    let level = map.wave_level(run.wave);
    for tile in run.tiles.iter_mut() {
        match tile.object.as_mut() {
            Some(TileObject::Chest(_)) | Some(TileObject::Event) => tile.object = None,
            Some(TileObject::Monster(monster)) => {
                if let Some(template) = find_template(&monster.template_id) {
                    *monster = Monster::from_template(&template, level);
                }
            }
            None => {}
        }
    }
    run.phase = RunPhase::Spawn;
    run.push_log(LogLine::new("run.wave").with("wave", run.wave));
    tracing::debug!(wave = run.wave, level, "wave advanced");
    false
}

/// Adds EXP, leveling up as many times as it covers. Returns levels gained.
pub fn grant_exp(run: &mut DungeonRunState, amount: u32) -> u32 {
    run.exp += amount;
    let mut gained = 0;
    while run.exp_to_next > 0 && run.exp >= run.exp_to_next {
        run.exp -= run.exp_to_next;
        run.level += 1;
        run.free_stat_points += STAT_POINTS_PER_LEVEL;
        run.exp_to_next = DungeonRunState::exp_threshold(run.level);
        gained += 1;
    }
    if gained > 0 {
        run.push_log(LogLine::new("run.level_up").with("level", run.level));
    }
    gained
}

/// Spends one free point on `stat`. VIT also raises max and current HP at once.
pub fn allocate_stat(run: &mut DungeonRunState, wanderer: &mut Wanderer, stat: StatType) -> bool {
    if run.free_stat_points == 0 {
        return false;
    }
    run.free_stat_points -= 1;
    wanderer.stats.increment(stat);
    if stat == StatType::Vitality {
        run.max_hp += VIT_ALLOCATION_HP;
        run.current_hp += VIT_ALLOCATION_HP;
    }
    true
}
