//! One active run: the wanderer, the dungeon, the current encounter and the
//! host's observer, owned together.
//!
//! Every public method leaves the session in a state [`GameSession::snapshot`]
//! can persist. Methods called in the wrong phase do nothing and return a
//! neutral value.

use super::constants::{LUCKY_CHEST_BONUS_CHANCE, SNAPSHOT_VERSION};
use super::log::LogLine;
use super::snapshot::SessionSnapshot;
use crate::character::attributes::StatType;
use crate::character::sanity::sanity_modifiers;
use crate::character::traits::{has_trait, TraitKind};
use crate::character::wanderer::Wanderer;
use crate::combat::logic::{self as combat_logic, CombatContext};
use crate::combat::monster::{spawn_from_pool, BodyPart, Monster};
use crate::combat::types::{
    Actor, AttackOutcome, CombatResult, CombatState, DamageRange, MonsterAttackOutcome,
    MonsterCombatant, Turn,
};
use crate::dungeon::events::{self, EventContext, EventResolution, EventStart};
use crate::dungeon::logic::{self as run_logic, MoveOutcome, TileInteraction};
use crate::dungeon::maps::{get_map, MapConfig};
use crate::dungeon::types::{
    ActiveEvent, ChestData, DungeonRunState, RunOutcome, RunPhase, SpawnRoll, TileObject,
};
use crate::items::inventory::{Inventory, Satchel};
use crate::items::loot::{roll_chest_loot, roll_monster_loot};
use crate::items::types::{Item, ItemKind};
use crate::utils::persistence::SaveError;
use rand::Rng;

/// Presentation hooks. All default to no-ops.
pub trait SessionObserver {
    /// A monster joined or left the encounter
    fn on_monster_set_changed(&mut self) {}
    /// HP, sanity or status effects changed
    fn on_hud_dirty(&mut self) {}
    /// Tile objects or visibility changed
    fn on_board_redraw(&mut self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// What landing on a tile led to.
#[derive(Debug, Clone, PartialEq)]
pub enum TileReport {
    Nothing,
    WaveAdvanced { wave: u32 },
    DungeonCleared,
    CombatStarted,
    ChestOpened { items: Vec<Item>, declined: Vec<Item> },
    EventAwaitingChoice(ActiveEvent),
    EventResolved {
        resolution: EventResolution,
        declined: Vec<Item>,
    },
}

/// Rewards handed out when an encounter ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatReport {
    pub result: Option<CombatResult>,
    pub exp: u32,
    pub levels_gained: u32,
    pub loot: Vec<Item>,
    pub declined: Vec<Item>,
}

/// Monster actions taken after a player action, plus the wrap-up if it ended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnReport {
    pub monster_actions: Vec<MonsterAttackOutcome>,
    pub finished: Option<CombatReport>,
}

// Upper bound on scheduler steps between two player turns.
const MAX_SCHEDULER_STEPS: usize = 1_000;

pub struct GameSession {
    wanderer: Wanderer,
    map: MapConfig,
    run: DungeonRunState,
    combat: Option<CombatState>,
    inventory: Satchel,
    observer: Box<dyn SessionObserver>,
}

impl GameSession {
    /// Enters `map` with a fresh run.
    pub fn new(
        wanderer: Wanderer,
        map: MapConfig,
        inventory: Satchel,
        observer: Box<dyn SessionObserver>,
    ) -> Self {
        let mut run = DungeonRunState::new(&map, &wanderer);
        run_logic::update_visibility(&mut run, map.view_range);
        tracing::debug!(map = %map.id, wanderer = %wanderer.id, "run started");
        Self {
            wanderer,
            map,
            run,
            combat: None,
            inventory,
            observer,
        }
    }

    /// Enters the map with id `map_id`, if it exists.
    pub fn start(
        wanderer: Wanderer,
        map_id: &str,
        inventory: Satchel,
        observer: Box<dyn SessionObserver>,
    ) -> Option<Self> {
        get_map(map_id).map(|map| Self::new(wanderer, map, inventory, observer))
    }

    /// Rebuilds a session from a snapshot, re-attaching the host's observer.
    pub fn resume(
        snapshot: SessionSnapshot,
        observer: Box<dyn SessionObserver>,
    ) -> Result<Self, SaveError> {
        let map = get_map(&snapshot.run.map_id).ok_or_else(|| {
            SaveError::Corrupt(format!("unknown map {}", snapshot.run.map_id))
        })?;
        if snapshot.run.tiles.len() != map.tile_count() {
            return Err(SaveError::Corrupt(format!(
                "board has {} tiles, map {} expects {}",
                snapshot.run.tiles.len(),
                map.id,
                map.tile_count()
            )));
        }
        tracing::debug!(map = %map.id, phase = ?snapshot.run.phase, "run resumed");
        Ok(Self {
            wanderer: snapshot.wanderer,
            map,
            run: snapshot.run,
            combat: snapshot.combat,
            inventory: snapshot.satchel,
            observer,
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            wanderer: self.wanderer.clone(),
            run: self.run.clone(),
            combat: self.combat.clone(),
            satchel: self.inventory.clone(),
        }
    }

    pub fn dungeon_state(&self) -> &DungeonRunState {
        &self.run
    }

    pub fn combat_state(&self) -> Option<&CombatState> {
        self.combat.as_ref()
    }

    pub fn active_target(&self) -> Option<&MonsterCombatant> {
        self.combat.as_ref().and_then(|c| c.active_target())
    }

    pub fn wanderer(&self) -> &Wanderer {
        &self.wanderer
    }

    pub fn inventory(&self) -> &Satchel {
        &self.inventory
    }

    pub fn map(&self) -> &MapConfig {
        &self.map
    }

    pub fn is_over(&self) -> bool {
        self.run.is_over()
    }

    /// True when the run is waiting on the player's attack or flee.
    pub fn awaiting_player_turn(&self) -> bool {
        self.combat
            .as_ref()
            .is_some_and(|c| !c.is_over() && c.next_turn == Some(Turn::Player))
    }

    fn wave_level(&self) -> u32 {
        self.map.wave_level(self.run.wave)
    }

    /// Copies run progress back onto the wanderer once the run is over.
    fn sync_wanderer(&mut self) {
        if self.run.is_over() {
            self.wanderer.level = self.run.level;
            self.wanderer.exp = self.run.exp;
        }
    }

    /// Stores items. Returns `(kept, declined)`.
    fn stash(&mut self, items: Vec<Item>) -> (Vec<Item>, Vec<Item>) {
        let mut kept = Vec::new();
        let mut declined = Vec::new();
        for item in items {
            let key = item.name_key();
            if self.inventory.add_item(item.clone()) {
                self.run.push_log(LogLine::new("loot.gained").with("item", key));
                kept.push(item);
            } else {
                self.run.push_log(LogLine::new("loot.declined").with("item", key));
                declined.push(item);
            }
        }
        (kept, declined)
    }

    // --- Spawn phase ---

    /// Places this wave's monsters, chests and events.
    ///
    /// The dice roll is stored on the run and counted down as objects land, so a
    /// session resumed mid-spawn finishes the same roll. Returns what was placed.
    pub fn run_spawn_phase(&mut self, rng: &mut impl Rng) -> SpawnRoll {
        if self.run.phase != RunPhase::Spawn || self.run.is_over() {
            return SpawnRoll::default();
        }
        let mut pending = match self.run.pending_spawn {
            Some(roll) => roll,
            None => {
                let roll = run_logic::roll_spawn_dice(&self.map, rng);
                self.run.pending_spawn = Some(roll);
                self.run.push_log(
                    LogLine::new("spawn.rolled")
                        .with("monsters", roll.monsters)
                        .with("treasures", roll.treasures)
                        .with("events", roll.events),
                );
                roll
            }
        };
        let mut placed = SpawnRoll::default();
        let level = self.wave_level();

        for tile in run_logic::spawn_placements(&self.run, pending.monsters, rng) {
            let Some(monster) = spawn_from_pool(&self.map.monster_pool, level, rng) else {
                continue;
            };
            if run_logic::commit_spawn(&mut self.run, tile, TileObject::Monster(monster)) {
                placed.monsters += 1;
                pending.monsters -= 1;
                self.run.pending_spawn = Some(pending);
                self.observer.on_board_redraw();
            }
        }
        for tile in run_logic::spawn_placements(&self.run, pending.treasures, rng) {
            let chest = TileObject::Chest(ChestData {
                table: self.map.chest_table.clone(),
            });
            if run_logic::commit_spawn(&mut self.run, tile, chest) {
                placed.treasures += 1;
                pending.treasures -= 1;
                self.run.pending_spawn = Some(pending);
                self.observer.on_board_redraw();
            }
        }
        for tile in run_logic::spawn_placements(&self.run, pending.events, rng) {
            if run_logic::commit_spawn(&mut self.run, tile, TileObject::Event) {
                placed.events += 1;
                pending.events -= 1;
                self.run.pending_spawn = Some(pending);
                self.observer.on_board_redraw();
            }
        }

        self.run.pending_spawn = None;
        self.run.phase = RunPhase::Move;
        tracing::debug!(
            wave = self.run.wave,
            monsters = placed.monsters,
            treasures = placed.treasures,
            events = placed.events,
            "spawn phase done"
        );
        placed
    }

    // --- Move and action phases ---

    /// Rolls and moves. Leaves the run in the action phase on the landing tile.
    pub fn move_phase(&mut self, rng: &mut impl Rng) -> MoveOutcome {
        let carry = self.inventory.carry_tier(self.wanderer.stats.str());
        let outcome = run_logic::execute_move_phase(
            &mut self.run,
            &self.wanderer.traits,
            carry,
            self.map.view_range,
            rng,
        );
        if outcome.roll > 0 {
            self.observer.on_hud_dirty();
            self.observer.on_board_redraw();
        }
        if outcome.died {
            self.sync_wanderer();
        }
        outcome
    }

    /// Resolves the tile the wanderer stopped on.
    pub fn resolve_tile(&mut self, rng: &mut impl Rng) -> TileReport {
        if self.combat.is_some() || self.run.active_event.is_some() {
            return TileReport::Nothing;
        }
        let report = match run_logic::resolve_tile(&mut self.run) {
            TileInteraction::Nothing => TileReport::Nothing,
            TileInteraction::WaveBoundary => {
                if run_logic::advance_wave(&mut self.run, &self.map) {
                    self.sync_wanderer();
                    TileReport::DungeonCleared
                } else {
                    TileReport::WaveAdvanced {
                        wave: self.run.wave,
                    }
                }
            }
            TileInteraction::Encounter(monster) => {
                let origin = self.run.position;
                self.start_combat(monster, Some(origin), rng);
                TileReport::CombatStarted
            }
            TileInteraction::Chest(chest) => self.open_chest(&chest, rng),
            TileInteraction::Event { boosted } => self.start_event(boosted, rng),
        };
        self.observer.on_board_redraw();
        report
    }

    /// Spawn if needed, move, then resolve. Convenience for auto-play.
    pub fn move_and_resolve(&mut self, rng: &mut impl Rng) -> (MoveOutcome, TileReport) {
        if self.run.phase == RunPhase::Spawn {
            self.run_spawn_phase(rng);
        }
        let outcome = self.move_phase(rng);
        if outcome.roll == 0 || outcome.died {
            return (outcome, TileReport::Nothing);
        }
        let report = self.resolve_tile(rng);
        (outcome, report)
    }

    fn open_chest(&mut self, chest: &ChestData, rng: &mut impl Rng) -> TileReport {
        let mut items: Vec<Item> = roll_chest_loot(&chest.table, rng).into_iter().collect();
        let discovery = sanity_modifiers(self.run.sanity).discovery as f64 / 100.0;
        let bonus_chance = if has_trait(&self.wanderer.traits, TraitKind::Lucky, self.run.theme) {
            LUCKY_CHEST_BONUS_CHANCE + discovery
        } else {
            discovery
        };
        if bonus_chance > 0.0 && rng.gen::<f64>() < bonus_chance {
            items.extend(roll_chest_loot(&chest.table, rng));
        }
        let (items, declined) = self.stash(items);
        self.run.phase = RunPhase::Move;
        TileReport::ChestOpened { items, declined }
    }

    fn event_context(&self) -> (u32, usize) {
        (self.wave_level(), self.map.view_range)
    }

    fn start_event(&mut self, boosted: bool, rng: &mut impl Rng) -> TileReport {
        let Some(def) = events::roll_event(&mut self.run, boosted, rng) else {
            self.run.phase = RunPhase::Move;
            return TileReport::Nothing;
        };
        let (wave_level, base_view_range) = self.event_context();
        let ctx = EventContext {
            traits: &self.wanderer.traits,
            wave_level,
            base_view_range,
        };
        match events::begin_event(&mut self.run, &def, &ctx, rng) {
            EventStart::AwaitingChoice(active) => TileReport::EventAwaitingChoice(active),
            EventStart::Resolved(resolution) => self.finish_event(resolution, rng),
        }
    }

    /// Answers the pending choice event.
    pub fn choose_event_option(&mut self, choice: usize, rng: &mut impl Rng) -> Option<TileReport> {
        let (wave_level, base_view_range) = self.event_context();
        let ctx = EventContext {
            traits: &self.wanderer.traits,
            wave_level,
            base_view_range,
        };
        let resolution = events::choose_event_option(&mut self.run, choice, &ctx, rng)?;
        Some(self.finish_event(resolution, rng))
    }

    fn finish_event(&mut self, mut resolution: EventResolution, rng: &mut impl Rng) -> TileReport {
        self.observer.on_hud_dirty();
        let (kept, declined) = self.stash(std::mem::take(&mut resolution.loot));
        resolution.loot = kept;
        if self.run.is_over() {
            self.sync_wanderer();
        } else if let Some(monster) = resolution.encounter.clone() {
            self.start_combat(monster, None, rng);
        } else {
            self.run.phase = RunPhase::Move;
        }
        TileReport::EventResolved {
            resolution,
            declined,
        }
    }

    // --- Combat ---

    /// Opens an encounter with `monster` and runs the scheduler to the
    /// player's first turn.
    ///
    /// Sanity can tilt the opening: a preemptive roll fills the player's gauge,
    /// an ambush roll fills the monster's.
    pub fn start_combat(
        &mut self,
        monster: Monster,
        origin_tile: Option<usize>,
        rng: &mut impl Rng,
    ) -> TurnReport {
        if self.combat.is_some() || self.run.is_over() {
            return TurnReport::default();
        }
        let mut combat =
            combat_logic::init_combat(&self.wanderer, &self.run, &self.inventory, monster, origin_tile);
        combat_logic::determine_initiative(&mut combat, &self.wanderer.traits);

        let mods = sanity_modifiers(self.run.sanity);
        if mods.preemptive > 0 && rng.gen_range(0.0..100.0) < mods.preemptive as f64 {
            combat.player.gauge.current_tick = 0.0;
            combat.add_log_entry(LogLine::new("combat.preemptive"), false, true);
        } else if mods.ambush > 0 && rng.gen_range(0.0..100.0) < mods.ambush as f64 {
            combat.monsters[0].gauge.current_tick = 0.0;
            combat.add_log_entry(LogLine::new("combat.ambush"), false, false);
        }

        if let Some(first) = combat.monsters.first() {
            self.run
                .push_log(LogLine::new("combat.encounter").with("monster", first.monster.name_key()));
        }
        self.combat = Some(combat);
        self.observer.on_monster_set_changed();
        self.run_scheduler(rng)
    }

    /// Advances the ATB clock, letting monsters act, until it is the player's
    /// turn or the encounter ends.
    fn run_scheduler(&mut self, rng: &mut impl Rng) -> TurnReport {
        let mut report = TurnReport::default();
        let Some(combat) = self.combat.as_mut() else {
            return report;
        };
        for _ in 0..MAX_SCHEDULER_STEPS {
            if combat.is_over() {
                break;
            }
            if combat.next_turn.is_none() {
                combat_logic::advance_tick(combat);
            }
            match combat.next_turn {
                Some(Turn::Monster) => {
                    let actor = combat.acting_monster.unwrap_or(combat.active_target);
                    let mut ctx = CombatContext {
                        run: &mut self.run,
                        traits: &self.wanderer.traits,
                        inventory: &mut self.inventory,
                        observer: self.observer.as_mut(),
                    };
                    let outcome = combat_logic::monster_attack(combat, &mut ctx, rng);
                    combat_logic::reset_tick(combat, Actor::Monster(actor));
                    if !combat.is_over() {
                        combat.next_turn = None;
                    }
                    report.monster_actions.push(outcome);
                }
                // Player is up, or nobody is left to act
                _ => break,
            }
        }
        if self.combat.as_ref().is_some_and(|c| c.is_over()) {
            report.finished = self.finish_combat(rng);
        }
        report
    }

    /// Attacks `part` of the active target, then lets monsters act until the
    /// player is up again. Returns None outside the player's turn.
    pub fn player_attack(
        &mut self,
        part: BodyPart,
        rng: &mut impl Rng,
    ) -> Option<(AttackOutcome, TurnReport)> {
        if !self.awaiting_player_turn() {
            tracing::debug!("attack requested outside the player's turn");
            return None;
        }
        let combat = self.combat.as_mut()?;
        let mut ctx = CombatContext {
            run: &mut self.run,
            traits: &self.wanderer.traits,
            inventory: &mut self.inventory,
            observer: self.observer.as_mut(),
        };
        let outcome = combat_logic::player_attack(combat, &mut ctx, part, rng);
        combat_logic::reset_tick(combat, Actor::Player);
        if !combat.is_over() {
            combat.next_turn = None;
        }
        let report = self.run_scheduler(rng);
        Some((outcome, report))
    }

    /// Tries to flee. Returns None outside the player's turn.
    pub fn attempt_flee(&mut self, rng: &mut impl Rng) -> Option<(bool, TurnReport)> {
        if !self.awaiting_player_turn() {
            return None;
        }
        let combat = self.combat.as_mut()?;
        let mut ctx = CombatContext {
            run: &mut self.run,
            traits: &self.wanderer.traits,
            inventory: &mut self.inventory,
            observer: self.observer.as_mut(),
        };
        let fled = combat_logic::attempt_flee(combat, &mut ctx, rng);
        combat_logic::reset_tick(combat, Actor::Player);
        if !combat.is_over() {
            combat.next_turn = None;
        }
        let report = self.run_scheduler(rng);
        Some((fled, report))
    }

    pub fn hit_chance(&self, part: BodyPart) -> i32 {
        match &self.combat {
            Some(combat) => {
                combat_logic::hit_chance(combat, part, &self.wanderer.traits, self.run.sanity)
            }
            None => 0,
        }
    }

    pub fn predicted_damage(&self, part: BodyPart) -> DamageRange {
        match &self.combat {
            Some(combat) => {
                combat_logic::predicted_damage(combat, part, self.inventory.equipped_weapon())
            }
            None => DamageRange::default(),
        }
    }

    /// Closes a finished encounter and hands out rewards.
    ///
    /// Victory grants EXP and monster drops and returns to the move phase.
    /// Fleeing puts the surviving monster back on its tile. Defeat ends the run.
    pub fn finish_combat(&mut self, rng: &mut impl Rng) -> Option<CombatReport> {
        let result = self.combat.as_ref()?.result?;
        let combat = self.combat.take()?;
        let mut report = CombatReport {
            result: Some(result),
            ..CombatReport::default()
        };
        self.run.current_hp = combat.player.hp;

        match result {
            CombatResult::Victory => {
                report.exp = combat.monsters.iter().map(|m| m.monster.exp).sum();
                report.levels_gained = run_logic::grant_exp(&mut self.run, report.exp);
                let drops: Vec<Item> = combat
                    .monsters
                    .iter()
                    .filter_map(|m| roll_monster_loot(&m.monster.template_id, rng))
                    .collect();
                (report.loot, report.declined) = self.stash(drops);
                self.run.push_log(LogLine::new("combat.victory").with("exp", report.exp));
                self.run.phase = RunPhase::Move;
            }
            CombatResult::Fled => {
                let survivor = combat
                    .monsters
                    .iter()
                    .find(|m| !m.is_summon && m.is_alive())
                    .map(|m| m.monster.clone());
                if let (Some(tile), Some(monster)) = (combat.origin_tile, survivor) {
                    if let Some(t) = self.run.tile_mut(tile) {
                        if t.object.is_none() {
                            t.object = Some(TileObject::Monster(monster));
                        }
                    }
                }
                self.run.push_log(LogLine::new("combat.fled"));
                self.run.phase = RunPhase::Move;
            }
            CombatResult::Defeat => {
                self.run.outcome = Some(RunOutcome::Dead);
                self.run.push_log(LogLine::new("run.died"));
                self.sync_wanderer();
            }
        }
        tracing::debug!(?result, exp = report.exp, "combat finished");
        self.observer.on_monster_set_changed();
        self.observer.on_hud_dirty();
        Some(report)
    }

    // --- Growth and upkeep ---

    pub fn grant_exp(&mut self, amount: u32) -> u32 {
        let gained = run_logic::grant_exp(&mut self.run, amount);
        self.observer.on_hud_dirty();
        gained
    }

    pub fn allocate_stat(&mut self, stat: StatType) -> bool {
        let spent = run_logic::allocate_stat(&mut self.run, &mut self.wanderer, stat);
        if spent {
            self.observer.on_hud_dirty();
        }
        spent
    }

    /// Drinks the first potion in the satchel outside combat.
    pub fn use_consumable(&mut self) -> bool {
        if self.combat.is_some() || self.run.is_over() {
            return false;
        }
        let Some(item) = self.inventory.take_consumable() else {
            return false;
        };
        if let ItemKind::Consumable { heal } = item.kind {
            run_logic::heal(&mut self.run, heal);
        }
        self.run.push_log(LogLine::new("item.used").with("item", item.name_key()));
        self.observer.on_hud_dirty();
        true
    }

    /// Gives up on the run.
    pub fn abandon(&mut self) {
        if self.run.is_over() {
            return;
        }
        self.combat = None;
        self.run.outcome = Some(RunOutcome::Abandoned);
        self.run.push_log(LogLine::new("run.abandoned"));
        self.sync_wanderer();
    }
}
