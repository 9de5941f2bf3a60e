//! Integration test: ATB combat engine
//!
//! Drives encounters through the public session and engine entry points:
//! scheduler properties, hit-chance clamping, head crits, weapon breakage and
//! the bounded SPD 10 vs SPD 5 victory scenario.

use proptest::prelude::*;
use rand::rngs::mock::StepRng;
use wander::character::attributes::Stats;
use wander::character::wanderer::Wanderer;
use wander::combat::logic::{advance_tick, hit_chance, init_combat, reset_tick};
use wander::combat::monster::{BodyPart, Monster, MonsterAbility, MonsterTemplate, PartTable};
use wander::combat::types::{Actor, CombatResult, CombatState, Turn};
use wander::core::session::{GameSession, NoopObserver};
use wander::dungeon::maps::get_map;
use wander::dungeon::types::{DungeonRunState, RunPhase};
use wander::items::inventory::{Inventory, Satchel};
use wander::items::types::Weapon;

fn template(spd: u32, hp: u32, def: u32, eva: u32) -> MonsterTemplate {
    MonsterTemplate {
        id: "training_dummy".to_string(),
        level: 1,
        hp,
        atk: 4,
        def,
        eva,
        spd,
        exp: 7,
        parts: PartTable::default(),
        ability: MonsterAbility::None,
        loot: Vec::new(),
    }
}

fn dummy(spd: u32, hp: u32, def: u32, eva: u32) -> Monster {
    Monster::from_template(&template(spd, hp, def, eva), 1)
}

fn wanderer_with_spd(spd: u32) -> Wanderer {
    Wanderer::new("Ash", Stats::from_values(5, 5, 5, spd, 5, 5))
}

fn session_with(wanderer: Wanderer, satchel: Satchel) -> GameSession {
    GameSession::start(wanderer, "whispering_woods", satchel, Box::new(NoopObserver))
        .expect("known map")
}

fn encounter(player_spd: u32, monster: Monster) -> CombatState {
    let wanderer = wanderer_with_spd(player_spd);
    let map = get_map("whispering_woods").expect("known map");
    let run = DungeonRunState::new(&map, &wanderer);
    let satchel = Satchel::default();
    init_combat(&wanderer, &run, &satchel, monster, None)
}

fn gauge_of(combat: &CombatState, actor: Actor) -> f64 {
    match actor {
        Actor::Player => combat.player.gauge.current_tick,
        Actor::Monster(i) => combat.monsters[i].gauge.current_tick,
    }
}

fn next_actor(combat: &CombatState) -> Option<Actor> {
    match combat.next_turn {
        Some(Turn::Player) => Some(Actor::Player),
        Some(Turn::Monster) => combat.acting_monster.map(Actor::Monster),
        None => None,
    }
}

// =============================================================================
// Scenario: fast unarmed wanderer against a slow, soft monster
// =============================================================================

#[test]
fn test_fast_unarmed_wanderer_wins_within_fifty_actions() {
    // StepRng(0, 0) rolls the bottom of every range: every swing hits
    let mut rng = StepRng::new(0, 0);
    let mut session = session_with(wanderer_with_spd(10), Satchel::default());

    let opening = session.start_combat(dummy(5, 20, 0, 0), None, &mut rng);
    assert!(opening.finished.is_none());
    assert!(session.awaiting_player_turn());

    let mut result = None;
    for _ in 0..50 {
        let (outcome, report) = session
            .player_attack(BodyPart::Body, &mut rng)
            .expect("player turn");
        assert!(outcome.hit);
        if let Some(finished) = report.finished {
            result = finished.result;
            assert_eq!(finished.exp, 7);
            break;
        }
        assert!(session.awaiting_player_turn());
    }

    assert_eq!(result, Some(CombatResult::Victory));
    assert!(session.combat_state().is_none());
    assert_eq!(session.dungeon_state().phase, RunPhase::Move);
    assert_eq!(session.dungeon_state().exp, 7);
}

#[test]
fn test_head_hits_are_always_critical() {
    let mut rng = StepRng::new(0, 0);
    let mut session = session_with(wanderer_with_spd(10), Satchel::default());
    session.start_combat(dummy(5, 500, 0, 0), None, &mut rng);

    for _ in 0..5 {
        let (outcome, _) = session
            .player_attack(BodyPart::Head, &mut rng)
            .expect("player turn");
        assert!(outcome.hit);
        assert!(outcome.critical);
    }
    let (outcome, _) = session
        .player_attack(BodyPart::Legs, &mut rng)
        .expect("player turn");
    assert!(!outcome.critical);
}

#[test]
fn test_last_durability_point_breaks_weapon_into_fists() {
    let mut rng = StepRng::new(0, 0);
    let satchel = Satchel::default().with_weapon(Weapon::new("twig", 1, 2, 1));
    let mut session = session_with(wanderer_with_spd(10), satchel);
    session.start_combat(dummy(5, 500, 0, 0), None, &mut rng);

    let (outcome, _) = session
        .player_attack(BodyPart::Body, &mut rng)
        .expect("player turn");
    assert!(outcome.hit);
    assert!(outcome.weapon_broke);

    let weapon = session.inventory().equipped_weapon().expect("fists");
    assert!(weapon.is_unarmed());
    assert_eq!(weapon.durability, None);
}

#[test]
fn test_actions_outside_player_turn_are_rejected() {
    let mut rng = StepRng::new(0, 0);
    let mut session = session_with(wanderer_with_spd(10), Satchel::default());
    assert!(session.player_attack(BodyPart::Body, &mut rng).is_none());
    assert!(session.attempt_flee(&mut rng).is_none());
    assert_eq!(session.hit_chance(BodyPart::Body), 0);
    assert_eq!(session.predicted_damage(BodyPart::Body).max, 0);
}

// =============================================================================
// Scheduler properties
// =============================================================================

#[test]
fn test_faster_actor_acts_more_often() {
    let mut combat = encounter(10, dummy(3, 1000, 0, 0));
    let mut player_turns = 0;
    let mut monster_turns = 0;
    for _ in 0..200 {
        advance_tick(&mut combat);
        let actor = next_actor(&combat).expect("someone is ready");
        match actor {
            Actor::Player => player_turns += 1,
            Actor::Monster(_) => monster_turns += 1,
        }
        reset_tick(&mut combat, actor);
        combat.next_turn = None;
    }
    assert!(player_turns > monster_turns * 2, "{player_turns} vs {monster_turns}");
}

proptest! {
    #[test]
    fn prop_elapsed_equals_smallest_gauge(player_spd in 1u32..60, monster_spd in 1u32..60) {
        let mut combat = encounter(player_spd, dummy(monster_spd, 100, 0, 0));
        let smallest = combat
            .player
            .gauge
            .current_tick
            .min(combat.monsters[0].gauge.current_tick);
        let elapsed = advance_tick(&mut combat);
        prop_assert!((elapsed - smallest).abs() < 1e-6);
        prop_assert!(combat.next_turn.is_some());
    }

    #[test]
    fn prop_scheduler_always_picks_a_lowest_gauge(
        player_spd in 1u32..40,
        spds in proptest::collection::vec(1u32..40, 1..4),
    ) {
        let mut combat = encounter(player_spd, dummy(spds[0], 100, 0, 0));
        for spd in &spds[1..] {
            combat
                .monsters
                .push(wander::combat::types::MonsterCombatant::new(dummy(*spd, 100, 0, 0), true));
        }
        for _ in 0..60 {
            let mut actors = vec![Actor::Player];
            actors.extend((0..combat.monsters.len()).map(Actor::Monster));
            let before: Vec<f64> = actors.iter().map(|a| gauge_of(&combat, *a)).collect();
            let lowest = before.iter().copied().fold(f64::INFINITY, f64::min);

            advance_tick(&mut combat);
            let actor = next_actor(&combat).expect("someone is ready");
            let slot = actors.iter().position(|a| *a == actor).expect("known actor");
            prop_assert!(before[slot] - lowest < 1e-3);
            prop_assert!(gauge_of(&combat, actor) < 1e-3);

            reset_tick(&mut combat, actor);
            combat.next_turn = None;
        }
    }

    #[test]
    fn prop_hit_chance_is_clamped(
        dex in 0u32..300,
        eva in 0u32..300,
        sanity in 0u32..=100,
    ) {
        let wanderer = Wanderer::new("Bryn", Stats::from_values(5, 5, 5, 5, dex, 5));
        let map = get_map("hollow_crypt").expect("known map");
        let run = DungeonRunState::new(&map, &wanderer);
        let satchel = Satchel::default();
        let combat = init_combat(&wanderer, &run, &satchel, dummy(5, 50, 0, eva), None);
        for part in BodyPart::all() {
            let chance = hit_chance(&combat, part, &wanderer.traits, sanity);
            prop_assert!((5..=95).contains(&chance), "{} for {:?}", chance, part);
        }
    }
}
