//! Integration test: GameSession orchestration
//!
//! Walks a session through every run phase: spawning, moving onto chests,
//! events and the start tile, fleeing, abandoning, and resuming from a
//! snapshot with a fresh observer.

use rand::rngs::mock::StepRng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::cell::RefCell;
use std::rc::Rc;
use wander::character::attributes::Stats;
use wander::character::wanderer::Wanderer;
use wander::combat::monster::{BodyPart, Monster, MonsterAbility, MonsterTemplate, PartTable};
use wander::combat::types::CombatResult;
use wander::core::session::{GameSession, NoopObserver, SessionObserver, TileReport};
use wander::core::snapshot::SessionSnapshot;
use wander::dungeon::types::{
    ChestData, RunOutcome, RunPhase, SpawnRoll, TileKind, TileObject,
};
use wander::items::inventory::Satchel;
use wander::utils::persistence::SaveError;

#[derive(Debug, Default)]
struct Counts {
    monster_set: u32,
    hud: u32,
    board: u32,
}

struct Recorder(Rc<RefCell<Counts>>);

impl SessionObserver for Recorder {
    fn on_monster_set_changed(&mut self) {
        self.0.borrow_mut().monster_set += 1;
    }
    fn on_hud_dirty(&mut self) {
        self.0.borrow_mut().hud += 1;
    }
    fn on_board_redraw(&mut self) {
        self.0.borrow_mut().board += 1;
    }
}

fn wanderer() -> Wanderer {
    Wanderer::new("Ash", Stats::from_values(5, 5, 5, 10, 5, 5))
}

fn session(satchel: Satchel) -> GameSession {
    GameSession::start(wanderer(), "whispering_woods", satchel, Box::new(NoopObserver))
        .expect("known map")
}

fn dummy(hp: u32) -> Monster {
    let template = MonsterTemplate {
        id: "training_dummy".to_string(),
        level: 1,
        hp,
        atk: 4,
        def: 0,
        eva: 0,
        spd: 5,
        exp: 7,
        parts: PartTable::default(),
        ability: MonsterAbility::None,
        loot: Vec::new(),
    };
    Monster::from_template(&template, 1)
}

/// Rebuilds `session` with its run edited by `edit`.
fn edited(session: &GameSession, edit: impl FnOnce(&mut SessionSnapshot)) -> GameSession {
    let mut snapshot = session.snapshot();
    edit(&mut snapshot);
    GameSession::resume(snapshot, Box::new(NoopObserver)).expect("valid snapshot")
}

// =============================================================================
// Spawn phase
// =============================================================================

#[test]
fn test_spawn_phase_places_objects_on_open_tiles_only() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let counts = Rc::new(RefCell::new(Counts::default()));
    let mut session = GameSession::start(
        wanderer(),
        "whispering_woods",
        Satchel::default(),
        Box::new(Recorder(counts.clone())),
    )
    .expect("known map");

    let placed = session.run_spawn_phase(&mut rng);
    let run = session.dungeon_state();
    assert_eq!(run.phase, RunPhase::Move);
    assert!(run.pending_spawn.is_none());
    assert!((1..=3).contains(&placed.monsters));

    let mut on_board = SpawnRoll::default();
    for tile in &run.tiles {
        match &tile.object {
            Some(TileObject::Monster(_)) => on_board.monsters += 1,
            Some(TileObject::Chest(_)) => on_board.treasures += 1,
            Some(TileObject::Event) => on_board.events += 1,
            None => continue,
        }
        assert_eq!(tile.kind, TileKind::Empty);
        assert_ne!(tile.index, run.position);
    }
    assert_eq!(on_board, placed);
    let placed_total = placed.monsters + placed.treasures + placed.events;
    assert_eq!(counts.borrow().board, placed_total);

    // A second call outside the spawn phase does nothing
    assert_eq!(session.run_spawn_phase(&mut rng), SpawnRoll::default());
}

#[test]
fn test_resume_mid_spawn_finishes_the_stored_roll() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let pending = SpawnRoll {
        monsters: 2,
        treasures: 1,
        events: 0,
    };
    let mut session = edited(&session(Satchel::default()), |s| {
        s.run.pending_spawn = Some(pending);
    });
    let placed = session.run_spawn_phase(&mut rng);
    assert_eq!(placed, pending);
}

// =============================================================================
// Tile resolution
// =============================================================================

#[test]
fn test_chest_into_full_satchel_is_declined() {
    // StepRng(0, 0): the die rolls 1 and the discovery bonus always fires
    let mut rng = StepRng::new(0, 0);
    let mut session = edited(&session(Satchel::new(1)), |s| {
        s.run.phase = RunPhase::Move;
        s.run.tiles[1].object = Some(TileObject::Chest(ChestData {
            table: "common".to_string(),
        }));
    });

    let outcome = session.move_phase(&mut rng);
    assert_eq!(outcome.roll, 1);
    assert_eq!(outcome.final_position, 1);

    match session.resolve_tile(&mut rng) {
        TileReport::ChestOpened { items, declined } => {
            assert_eq!(items.len(), 1);
            assert_eq!(declined.len(), 1);
        }
        other => panic!("expected a chest, got {:?}", other),
    }
    assert_eq!(session.inventory().items.len(), 1);
    assert_eq!(session.dungeon_state().phase, RunPhase::Move);
    assert!(session.dungeon_state().tiles[1].object.is_none());
}

#[test]
fn test_event_tile_resolves_or_waits_for_a_choice() {
    let mut rng = StepRng::new(0, 0);
    let mut session = edited(&session(Satchel::default()), |s| {
        s.run.phase = RunPhase::Move;
        s.run.tiles[1].object = Some(TileObject::Event);
    });
    session.move_phase(&mut rng);

    match session.resolve_tile(&mut rng) {
        TileReport::EventAwaitingChoice(active) => {
            assert!(!active.choices.is_empty());
            assert!(session.choose_event_option(99, &mut rng).is_none());
            assert!(session.dungeon_state().active_event.is_some());

            let report = session.choose_event_option(0, &mut rng).expect("valid choice");
            assert!(matches!(report, TileReport::EventResolved { .. }));
            assert!(session.dungeon_state().active_event.is_none());
        }
        TileReport::EventResolved { resolution, .. } => {
            assert!(!resolution.event_id.is_empty());
        }
        other => panic!("expected an event, got {:?}", other),
    }
    assert_eq!(session.dungeon_state().encountered_events.len(), 1);
}

#[test]
fn test_landing_on_start_advances_the_wave() {
    let mut rng = StepRng::new(0, 0);
    let mut session = edited(&session(Satchel::default()), |s| {
        s.run.phase = RunPhase::Move;
        s.run.position = 19;
    });
    let outcome = session.move_phase(&mut rng);
    assert_eq!(outcome.final_position, 0);

    assert_eq!(
        session.resolve_tile(&mut rng),
        TileReport::WaveAdvanced { wave: 2 }
    );
    assert_eq!(session.dungeon_state().phase, RunPhase::Spawn);
}

#[test]
fn test_lap_after_the_last_wave_clears_the_dungeon() {
    let mut rng = StepRng::new(0, 0);
    let mut session = edited(&session(Satchel::default()), |s| {
        s.run.phase = RunPhase::Move;
        s.run.position = 19;
        s.run.wave = 3;
        s.run.level = 4;
    });
    session.move_phase(&mut rng);

    assert_eq!(session.resolve_tile(&mut rng), TileReport::DungeonCleared);
    assert!(session.is_over());
    assert_eq!(session.dungeon_state().outcome, Some(RunOutcome::Cleared));
    assert_eq!(session.wanderer().level, 4);

    // Nothing moves once the run is over
    assert_eq!(session.move_phase(&mut rng).roll, 0);
}

// =============================================================================
// Combat hand-off
// =============================================================================

#[test]
fn test_flee_puts_the_monster_back_on_its_tile() {
    let mut rng = StepRng::new(0, 0);
    let counts = Rc::new(RefCell::new(Counts::default()));
    let mut session = GameSession::start(
        wanderer(),
        "whispering_woods",
        Satchel::default(),
        Box::new(Recorder(counts.clone())),
    )
    .expect("known map");

    session.start_combat(dummy(50), Some(3), &mut rng);
    assert!(session.awaiting_player_turn());
    assert_eq!(counts.borrow().monster_set, 1);

    let (fled, report) = session.attempt_flee(&mut rng).expect("player turn");
    assert!(fled);
    let finished = report.finished.expect("combat over");
    assert_eq!(finished.result, Some(CombatResult::Fled));
    assert_eq!(finished.exp, 0);

    assert!(session.combat_state().is_none());
    assert!(matches!(
        session.dungeon_state().tiles[3].object,
        Some(TileObject::Monster(_))
    ));
    assert_eq!(session.dungeon_state().phase, RunPhase::Move);
    assert_eq!(counts.borrow().monster_set, 2);
    assert!(counts.borrow().hud >= 1);
}

#[test]
fn test_mid_combat_snapshot_resumes_on_the_players_turn() {
    let mut rng = StepRng::new(0, 0);
    let mut session = session(Satchel::default());
    session.start_combat(dummy(50), None, &mut rng);
    session
        .player_attack(BodyPart::Body, &mut rng)
        .expect("player turn");

    let snapshot = session.snapshot();
    let json = snapshot.to_json().expect("serializable");
    let restored = SessionSnapshot::from_json(&json).expect("parses");
    assert_eq!(restored, snapshot);

    let mut resumed = GameSession::resume(restored, Box::new(NoopObserver)).expect("resumes");
    assert_eq!(resumed.snapshot(), snapshot);
    assert!(resumed.awaiting_player_turn());
    let target_hp = resumed.active_target().map(|t| t.monster.hp);
    let (outcome, _) = resumed
        .player_attack(BodyPart::Body, &mut rng)
        .expect("player turn");
    assert!(outcome.hit);
    assert!(resumed.active_target().map(|t| t.monster.hp) < target_hp);
}

#[test]
fn test_resume_rejects_unknown_map() {
    let mut snapshot = session(Satchel::default()).snapshot();
    snapshot.run.map_id = "atlantis".to_string();
    assert!(matches!(
        GameSession::resume(snapshot, Box::new(NoopObserver)),
        Err(SaveError::Corrupt(_))
    ));
}

// =============================================================================
// Upkeep
// =============================================================================

#[test]
fn test_exp_and_stat_allocation() {
    let mut session = session(Satchel::default());
    assert!(!session.allocate_stat(wander::character::attributes::StatType::Strength));

    assert_eq!(session.grant_exp(10), 1);
    assert_eq!(session.dungeon_state().level, 2);
    let points = session.dungeon_state().free_stat_points;
    assert!(points > 0);

    let max_hp = session.dungeon_state().max_hp;
    assert!(session.allocate_stat(wander::character::attributes::StatType::Vitality));
    assert_eq!(session.dungeon_state().max_hp, max_hp + 5);
    assert_eq!(session.dungeon_state().free_stat_points, points - 1);
    assert_eq!(session.wanderer().stats.vit(), 6);
}

#[test]
fn test_abandon_ends_the_run_once() {
    let mut rng = StepRng::new(0, 0);
    let mut session = session(Satchel::default());
    session.start_combat(dummy(50), None, &mut rng);
    session.abandon();
    assert!(session.is_over());
    assert!(session.combat_state().is_none());
    assert_eq!(session.dungeon_state().outcome, Some(RunOutcome::Abandoned));

    let log_len = session.dungeon_state().log.len();
    session.abandon();
    assert_eq!(session.dungeon_state().log.len(), log_len);
}
