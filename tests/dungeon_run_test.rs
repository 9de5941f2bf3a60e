//! Integration test: dungeon run rules
//!
//! Board movement, sanity loss through traits, status refresh rules, loot
//! remainders, and a whole seeded run whose snapshot survives JSON at every
//! step.

use rand::rngs::mock::StepRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wander::character::attributes::Stats;
use wander::character::status::{Duration, StatusEffect, StatusEffectSet};
use wander::character::traits::{Trait, TraitKind};
use wander::character::wanderer::{recruit, Wanderer};
use wander::combat::monster::BodyPart;
use wander::core::session::{GameSession, NoopObserver};
use wander::core::snapshot::SessionSnapshot;
use wander::core::weighted::{weighted_pick, weighted_pick_from_total, Weighted};
use wander::dungeon::logic::{advance_position, reduce_sanity};
use wander::dungeon::maps::get_map;
use wander::dungeon::types::{DungeonRunState, Theme};
use wander::items::inventory::Satchel;
use wander::items::types::Weapon;

fn fresh_run(map_id: &str) -> DungeonRunState {
    let map = get_map(map_id).expect("known map");
    let wanderer = Wanderer::new("Ash", Stats::new(5));
    DungeonRunState::new(&map, &wanderer)
}

// =============================================================================
// Movement
// =============================================================================

#[test]
fn test_reaching_start_mid_roll_stops_there() {
    let mut run = fresh_run("whispering_woods");
    run.position = 17;
    let result = advance_position(&mut run, 6);
    assert_eq!(result.path, vec![18, 19, 0]);
    assert!(result.stopped_at_start);
    assert_eq!(result.steps_discarded, 3);
    assert_eq!(run.position, 0);
}

#[test]
fn test_walk_without_crossing_start_keeps_all_steps() {
    let mut run = fresh_run("hollow_crypt");
    run.position = 3;
    let result = advance_position(&mut run, 5);
    assert_eq!(run.position, 8);
    assert_eq!(result.path.len(), 5);
    assert!(!result.stopped_at_start);
    assert_eq!(result.steps_discarded, 0);
}

// =============================================================================
// Sanity and status
// =============================================================================

#[test]
fn test_phobia_and_coward_scale_sanity_loss() {
    let mut run = fresh_run("whispering_woods");
    assert_eq!(run.theme, Theme::Forest);

    let phobic = [Trait::themed(TraitKind::Phobia, Theme::Forest)];
    assert_eq!(reduce_sanity(&mut run, &phobic, 10), 15);

    let both = [
        Trait::new(TraitKind::Coward),
        Trait::themed(TraitKind::Phobia, Theme::Forest),
    ];
    assert_eq!(reduce_sanity(&mut run, &both, 10), 18);
    assert_eq!(run.sanity, 100 - 15 - 18);

    // Wrong theme: the phobia sleeps
    let crypt_phobia = [Trait::themed(TraitKind::Phobia, Theme::Crypt)];
    assert_eq!(reduce_sanity(&mut run, &crypt_phobia, 10), 10);
}

#[test]
fn test_reapplying_status_replaces_duration() {
    let mut set = StatusEffectSet::new();
    set.apply(StatusEffect::generic("blessing", "✨", Duration::Turns(3)));
    set.tick();
    set.apply(StatusEffect::generic("blessing", "✨", Duration::Turns(5)));
    assert_eq!(set.len(), 1);
    assert_eq!(
        set.get("blessing").map(|e| e.duration),
        Some(Duration::Turns(5))
    );
}

// =============================================================================
// Weighted tables
// =============================================================================

#[test]
fn test_unclaimed_weight_yields_no_drop() {
    let table = vec![Weighted::new("bat_wing", 20.0), Weighted::new("ectoplasm", 10.0)];
    // Draw near the top of the 100 total
    let mut high = StepRng::new(u64::MAX, 0);
    assert_eq!(weighted_pick_from_total(&table, 100.0, &mut high), None);
    let mut low = StepRng::new(0, 0);
    assert_eq!(
        weighted_pick_from_total(&table, 100.0, &mut low),
        Some(&"bat_wing")
    );

    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let misses = (0..1000)
        .filter(|_| weighted_pick_from_total(&table, 100.0, &mut rng).is_none())
        .count();
    assert!((600..800).contains(&misses), "misses {}", misses);
}

#[test]
fn test_chest_style_pick_always_returns_something() {
    let table = vec![Weighted::new(1, 1.0), Weighted::new(2, 3.0)];
    let mut high = StepRng::new(u64::MAX, 0);
    assert_eq!(weighted_pick(&table, &mut high), Some(&2));
    let empty: Vec<Weighted<u8>> = Vec::new();
    assert_eq!(weighted_pick(&empty, &mut high), None);
}

// =============================================================================
// Whole run
// =============================================================================

#[test]
fn test_seeded_run_terminates_and_snapshots_every_step() {
    for seed in [1u64, 2, 3] {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let wanderer = recruit("Runner", &mut rng);
        let satchel = Satchel::default().with_weapon(Weapon::new("war_axe", 5, 9, 15));
        let mut session = GameSession::start(wanderer, "sunken_mine", satchel, Box::new(NoopObserver))
            .expect("known map");

        let mut steps = 0;
        while !session.is_over() && steps < 3000 {
            steps += 1;
            if let Some(active) = session.dungeon_state().active_event.clone() {
                let pick = rng.gen_range(0..active.choices.len());
                session.choose_event_option(pick, &mut rng);
            } else if session.awaiting_player_turn() {
                session.player_attack(BodyPart::Body, &mut rng);
            } else {
                session.move_and_resolve(&mut rng);
            }

            let snapshot = session.snapshot();
            let json = snapshot.to_json().expect("serializable");
            let restored = SessionSnapshot::from_json(&json).expect("parses");
            assert_eq!(restored, snapshot, "seed {} step {}", seed, steps);
        }
        assert!(session.is_over(), "seed {} did not finish in {} steps", seed, steps);
        assert!(session.combat_state().is_none());
        assert_eq!(session.wanderer().level, session.dungeon_state().level);
    }
}
