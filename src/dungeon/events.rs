//! Dungeon events: catalog, rolling and outcome resolution.
//!
//! Immediate events resolve the moment they are rolled. Choice events park an
//! [`ActiveEvent`] on the run until the player picks an option, so a reload can
//! pick up where it left off.

use super::logic::{apply_status_effect, damage, grant_exp, heal, reduce_sanity, restore_sanity};
use super::types::{ActiveEvent, DungeonRunState, Theme};
use crate::character::status::{Duration, StatusEffect};
use crate::character::traits::Trait;
use crate::combat::monster::{find_template, Monster};
use crate::core::log::LogLine;
use crate::core::weighted::{weighted_pick, Weighted};
use crate::items::loot::roll_chest_loot;
use crate::items::types::Item;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventOutcome {
    Heal(u32),
    Damage(u32),
    LoseSanity(u32),
    RestoreSanity(u32),
    GainExp(u32),
    ApplyStatus(StatusEffect),
    /// Hands a monster straight to the combat engine
    ForceEncounter { template: String },
    FindLoot { table: String },
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBranch {
    pub key: String,
    pub outcomes: Vec<EventOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventChoice {
    pub key: String,
    pub branches: Vec<Weighted<EventBranch>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    Immediate(Vec<Weighted<EventBranch>>),
    Choice(Vec<EventChoice>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub id: String,
    /// None for the generic pool
    pub theme: Option<Theme>,
    pub weight: f64,
    pub kind: EventKind,
}

/// What resolving a branch left for the caller to act on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventResolution {
    pub event_id: String,
    pub branch_key: String,
    pub encounter: Option<Monster>,
    pub loot: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventStart {
    Resolved(EventResolution),
    AwaitingChoice(ActiveEvent),
}

fn branch(key: &str, weight: f64, outcomes: Vec<EventOutcome>) -> Weighted<EventBranch> {
    Weighted::new(
        EventBranch {
            key: key.to_string(),
            outcomes,
        },
        weight,
    )
}

fn choice(key: &str, branches: Vec<Weighted<EventBranch>>) -> EventChoice {
    EventChoice {
        key: key.to_string(),
        branches,
    }
}

fn event(id: &str, theme: Option<Theme>, weight: f64, kind: EventKind) -> EventDef {
    EventDef {
        id: id.to_string(),
        theme,
        weight,
        kind,
    }
}

fn encounter(template: &str) -> EventOutcome {
    EventOutcome::ForceEncounter {
        template: template.to_string(),
    }
}

fn loot(table: &str) -> EventOutcome {
    EventOutcome::FindLoot {
        table: table.to_string(),
    }
}

fn walk_away() -> EventChoice {
    choice(
        "event.choice.leave",
        vec![branch("event.leave", 1.0, vec![EventOutcome::Nothing])],
    )
}

pub fn all_events() -> Vec<EventDef> {
    use EventKind::{Choice, Immediate};
    use EventOutcome::*;
    vec![
        event(
            "abandoned_camp",
            None,
            10.0,
            Immediate(vec![
                branch("event.abandoned_camp.rest", 60.0, vec![Heal(10)]),
                branch("event.abandoned_camp.ambush", 40.0, vec![encounter("rat")]),
            ]),
        ),
        event(
            "strange_whispers",
            None,
            8.0,
            Immediate(vec![
                branch("event.strange_whispers.heard", 70.0, vec![LoseSanity(8)]),
                branch("event.strange_whispers.silence", 30.0, vec![Nothing]),
            ]),
        ),
        event(
            "old_shrine",
            None,
            8.0,
            Choice(vec![
                choice(
                    "event.old_shrine.pray",
                    vec![
                        branch("event.old_shrine.blessed", 60.0, vec![RestoreSanity(15)]),
                        branch("event.old_shrine.cursed", 40.0, vec![LoseSanity(10)]),
                    ],
                ),
                walk_away(),
            ]),
        ),
        event(
            "torch_cache",
            None,
            6.0,
            Immediate(vec![branch(
                "event.torch_cache.found",
                1.0,
                vec![ApplyStatus(StatusEffect::torch())],
            )]),
        ),
        event(
            "hidden_cache",
            None,
            8.0,
            Immediate(vec![
                branch("event.hidden_cache.loot", 70.0, vec![loot("common")]),
                branch("event.hidden_cache.trap", 30.0, vec![Damage(6)]),
            ]),
        ),
        event(
            "wounded_traveler",
            None,
            6.0,
            Choice(vec![
                choice(
                    "event.wounded_traveler.help",
                    vec![
                        branch("event.wounded_traveler.grateful", 70.0, vec![GainExp(8)]),
                        branch("event.wounded_traveler.trick", 30.0, vec![encounter("goblin")]),
                    ],
                ),
                choice(
                    "event.wounded_traveler.ignore",
                    vec![branch("event.wounded_traveler.guilt", 1.0, vec![LoseSanity(4)])],
                ),
            ]),
        ),
        event(
            "fairy_ring",
            Some(Theme::Forest),
            10.0,
            Choice(vec![
                choice(
                    "event.fairy_ring.enter",
                    vec![
                        branch("event.fairy_ring.dance", 60.0, vec![RestoreSanity(20)]),
                        branch("event.fairy_ring.lost", 40.0, vec![LoseSanity(15)]),
                    ],
                ),
                walk_away(),
            ]),
        ),
        event(
            "wolf_howl",
            Some(Theme::Forest),
            8.0,
            Immediate(vec![
                branch("event.wolf_howl.fear", 50.0, vec![LoseSanity(6)]),
                branch("event.wolf_howl.pack", 50.0, vec![encounter("wolf")]),
            ]),
        ),
        event(
            "cave_in",
            Some(Theme::Mine),
            10.0,
            Immediate(vec![
                branch("event.cave_in.hit", 60.0, vec![Damage(10)]),
                branch("event.cave_in.exposed", 40.0, vec![loot("rich")]),
            ]),
        ),
        event(
            "glittering_vein",
            Some(Theme::Mine),
            8.0,
            Choice(vec![
                choice(
                    "event.glittering_vein.dig",
                    vec![
                        branch("event.glittering_vein.ore", 50.0, vec![loot("rich")]),
                        branch("event.glittering_vein.guardian", 50.0, vec![encounter("golem")]),
                    ],
                ),
                walk_away(),
            ]),
        ),
        event(
            "toxic_bog",
            Some(Theme::Swamp),
            10.0,
            Immediate(vec![
                branch(
                    "event.toxic_bog.fumes",
                    70.0,
                    vec![ApplyStatus(StatusEffect::poison())],
                ),
                branch("event.toxic_bog.clear", 30.0, vec![Nothing]),
            ]),
        ),
        event(
            "will_o_wisp",
            Some(Theme::Swamp),
            8.0,
            Choice(vec![
                choice(
                    "event.will_o_wisp.follow",
                    vec![
                        branch("event.will_o_wisp.insight", 50.0, vec![GainExp(12)]),
                        branch("event.will_o_wisp.mire", 50.0, vec![LoseSanity(12)]),
                    ],
                ),
                walk_away(),
            ]),
        ),
        event(
            "restless_dead",
            Some(Theme::Crypt),
            10.0,
            Immediate(vec![
                branch("event.restless_dead.wail", 60.0, vec![LoseSanity(10)]),
                branch("event.restless_dead.rise", 40.0, vec![encounter("wraith")]),
            ]),
        ),
        event(
            "blessed_altar",
            Some(Theme::Crypt),
            8.0,
            Choice(vec![
                choice(
                    "event.blessed_altar.kneel",
                    vec![
                        branch(
                            "event.blessed_altar.calm",
                            60.0,
                            vec![ApplyStatus(
                                StatusEffect::generic("blessing", "✚", Duration::Turns(4))
                                    .with_sanity_per_turn(3),
                            )],
                        ),
                        branch("event.blessed_altar.defiled", 40.0, vec![LoseSanity(8), Damage(4)]),
                    ],
                ),
                walk_away(),
            ]),
        ),
    ]
}

pub fn find_event(id: &str) -> Option<EventDef> {
    let found = all_events().into_iter().find(|e| e.id == id);
    if found.is_none() {
        tracing::warn!(event = id, "unknown event id");
    }
    found
}

/// Picks an event for the run's theme, skipping ones already seen this run.
///
/// Boosted rolls (corner tiles) draw from the themed pool when it has anything
/// left. Once every eligible event has been seen the dedup list is ignored.
pub fn roll_event(run: &mut DungeonRunState, boosted: bool, rng: &mut impl Rng) -> Option<EventDef> {
    let eligible: Vec<EventDef> = all_events()
        .into_iter()
        .filter(|e| e.theme.map_or(true, |t| t == run.theme))
        .collect();
    let fresh: Vec<&EventDef> = eligible
        .iter()
        .filter(|e| !run.encountered_events.contains(&e.id))
        .collect();
    let mut pool: Vec<&EventDef> = if fresh.is_empty() {
        eligible.iter().collect()
    } else {
        fresh
    };
    if boosted && pool.iter().any(|e| e.theme.is_some()) {
        pool.retain(|e| e.theme.is_some());
    }

    let weighted: Vec<Weighted<&EventDef>> =
        pool.iter().map(|e| Weighted::new(*e, e.weight)).collect();
    let picked = weighted_pick(&weighted, rng).map(|e| (*e).clone())?;
    if !run.encountered_events.contains(&picked.id) {
        run.encountered_events.push(picked.id.clone());
    }
    tracing::debug!(event = %picked.id, boosted, "event rolled");
    Some(picked)
}

/// Context needed to apply event outcomes to a run.
pub struct EventContext<'a> {
    pub traits: &'a [Trait],
    pub wave_level: u32,
    pub base_view_range: usize,
}

/// Starts `def`: immediate events resolve now, choice events wait on the run.
pub fn begin_event(
    run: &mut DungeonRunState,
    def: &EventDef,
    ctx: &EventContext,
    rng: &mut impl Rng,
) -> EventStart {
    run.push_log(LogLine::new("event.begin").with("id", &def.id));
    match &def.kind {
        EventKind::Immediate(branches) => {
            EventStart::Resolved(resolve_branches(run, &def.id, branches, ctx, rng))
        }
        EventKind::Choice(choices) => {
            let active = ActiveEvent {
                event_id: def.id.clone(),
                choices: choices.iter().map(|c| c.key.clone()).collect(),
            };
            run.active_event = Some(active.clone());
            EventStart::AwaitingChoice(active)
        }
    }
}

/// Resolves the pending choice event with the option at `choice_index`.
///
/// Returns None when no event is pending or the index is out of range; the
/// pending event stays put in that case.
pub fn choose_event_option(
    run: &mut DungeonRunState,
    choice_index: usize,
    ctx: &EventContext,
    rng: &mut impl Rng,
) -> Option<EventResolution> {
    let Some(active) = run.active_event.as_ref() else {
        tracing::debug!("event choice with no active event");
        return None;
    };
    let def = match find_event(&active.event_id) {
        Some(def) => def,
        None => {
            run.active_event = None;
            return None;
        }
    };
    let EventKind::Choice(choices) = &def.kind else {
        run.active_event = None;
        return None;
    };
    let picked = choices.get(choice_index)?;
    run.active_event = None;
    run.push_log(LogLine::new("event.chose").with("choice", &picked.key));
    Some(resolve_branches(run, &def.id, &picked.branches, ctx, rng))
}

fn resolve_branches(
    run: &mut DungeonRunState,
    event_id: &str,
    branches: &[Weighted<EventBranch>],
    ctx: &EventContext,
    rng: &mut impl Rng,
) -> EventResolution {
    let mut resolution = EventResolution {
        event_id: event_id.to_string(),
        ..EventResolution::default()
    };
    let Some(branch) = weighted_pick(branches, rng) else {
        return resolution;
    };
    resolution.branch_key = branch.key.clone();
    run.push_log(LogLine::new(&branch.key));
    for outcome in &branch.outcomes {
        apply_outcome(run, outcome, ctx, &mut resolution, rng);
    }
    resolution
}

fn apply_outcome(
    run: &mut DungeonRunState,
    outcome: &EventOutcome,
    ctx: &EventContext,
    resolution: &mut EventResolution,
    rng: &mut impl Rng,
) {
    match outcome {
        EventOutcome::Heal(amount) => heal(run, *amount),
        EventOutcome::Damage(amount) => {
            damage(run, *amount);
        }
        EventOutcome::LoseSanity(amount) => {
            let lost = reduce_sanity(run, ctx.traits, *amount);
            run.push_log(LogLine::new("event.sanity_lost").with("amount", lost));
        }
        EventOutcome::RestoreSanity(amount) => restore_sanity(run, *amount),
        EventOutcome::GainExp(amount) => {
            grant_exp(run, *amount);
        }
        EventOutcome::ApplyStatus(effect) => {
            apply_status_effect(run, effect.clone(), ctx.base_view_range)
        }
        EventOutcome::ForceEncounter { template } => {
            resolution.encounter =
                find_template(template).map(|t| Monster::from_template(&t, ctx.wave_level));
        }
        EventOutcome::FindLoot { table } => {
            resolution.loot.extend(roll_chest_loot(table, rng));
        }
        EventOutcome::Nothing => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::attributes::Stats;
    use crate::character::wanderer::Wanderer;
    use crate::dungeon::maps::get_map;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn run_in(map_id: &str) -> DungeonRunState {
        let map = get_map(map_id).unwrap();
        DungeonRunState::new(&map, &Wanderer::new("Eve", Stats::default()))
    }

    fn ctx() -> EventContext<'static> {
        EventContext {
            traits: &[],
            wave_level: 1,
            base_view_range: 2,
        }
    }

    #[test]
    fn test_catalog_references_resolve() {
        for def in all_events() {
            let branches: Vec<&Weighted<EventBranch>> = match &def.kind {
                EventKind::Immediate(b) => b.iter().collect(),
                EventKind::Choice(c) => c.iter().flat_map(|c| c.branches.iter()).collect(),
            };
            assert!(!branches.is_empty(), "{}", def.id);
            for b in branches {
                for outcome in &b.item.outcomes {
                    if let EventOutcome::ForceEncounter { template } = outcome {
                        assert!(find_template(template).is_some(), "{}", template);
                    }
                }
            }
        }
    }

    #[test]
    fn test_roll_respects_theme() {
        let mut run = run_in("sunken_mine");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..40 {
            let def = roll_event(&mut run, false, &mut rng).unwrap();
            assert!(def.theme.is_none() || def.theme == Some(Theme::Mine));
        }
    }

    #[test]
    fn test_boosted_roll_prefers_themed_pool() {
        let mut run = run_in("rotting_fen");
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let def = roll_event(&mut run, true, &mut rng).unwrap();
        assert_eq!(def.theme, Some(Theme::Swamp));
    }

    #[test]
    fn test_dedup_until_pool_exhausted() {
        let mut run = run_in("whispering_woods");
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let eligible = all_events()
            .into_iter()
            .filter(|e| e.theme.map_or(true, |t| t == Theme::Forest))
            .count();
        let mut seen = Vec::new();
        for _ in 0..eligible {
            let def = roll_event(&mut run, false, &mut rng).unwrap();
            assert!(!seen.contains(&def.id), "repeat {}", def.id);
            seen.push(def.id);
        }
        assert_eq!(run.encountered_events.len(), eligible);
        // Exhausted pool still yields an event
        assert!(roll_event(&mut run, false, &mut rng).is_some());
        assert_eq!(run.encountered_events.len(), eligible);
    }

    #[test]
    fn test_choice_event_waits_then_resolves() {
        let mut run = run_in("whispering_woods");
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let def = find_event("old_shrine").unwrap();
        let start = begin_event(&mut run, &def, &ctx(), &mut rng);
        match start {
            EventStart::AwaitingChoice(active) => assert_eq!(active.choices.len(), 2),
            other => panic!("expected choice, got {:?}", other),
        }
        assert!(run.active_event.is_some());

        assert!(choose_event_option(&mut run, 9, &ctx(), &mut rng).is_none());
        assert!(run.active_event.is_some());

        let resolution = choose_event_option(&mut run, 1, &ctx(), &mut rng).unwrap();
        assert_eq!(resolution.branch_key, "event.leave");
        assert!(run.active_event.is_none());
    }

    #[test]
    fn test_choice_without_active_event() {
        let mut run = run_in("whispering_woods");
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert!(choose_event_option(&mut run, 0, &ctx(), &mut rng).is_none());
    }

    #[test]
    fn test_immediate_status_event() {
        let mut run = run_in("whispering_woods");
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let def = find_event("torch_cache").unwrap();
        let start = begin_event(&mut run, &def, &ctx(), &mut rng);
        assert!(matches!(start, EventStart::Resolved(_)));
        assert!(run.has_torch());
    }

    #[test]
    fn test_event_sanity_loss_goes_through_traits() {
        let mut run = run_in("whispering_woods");
        let traits = vec![Trait::new(crate::character::traits::TraitKind::Coward)];
        let ctx = EventContext {
            traits: &traits,
            wave_level: 1,
            base_view_range: 2,
        };
        let mut resolution = EventResolution::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        apply_outcome(&mut run, &EventOutcome::LoseSanity(10), &ctx, &mut resolution, &mut rng);
        assert_eq!(run.sanity, 87);
    }

    #[test]
    fn test_force_encounter_levels_monster() {
        let mut run = run_in("whispering_woods");
        let ctx = EventContext {
            traits: &[],
            wave_level: 4,
            base_view_range: 2,
        };
        let mut resolution = EventResolution::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        apply_outcome(&mut run, &encounter("rat"), &ctx, &mut resolution, &mut rng);
        let monster = resolution.encounter.unwrap();
        assert_eq!(monster.template_id, "rat");
        assert_eq!(monster.level, 4);
    }
}
