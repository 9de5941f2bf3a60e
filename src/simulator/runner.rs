//! Main simulation runner.
//!
//! Every run goes through [`GameSession`], the same entry point a UI shell
//! uses, so the numbers match real play. A fixed policy makes the decisions.

use super::config::SimConfig;
use super::report::{RunStats, SimReport};
use crate::character::attributes::StatType;
use crate::character::wanderer::recruit;
use crate::combat::monster::BodyPart;
use crate::combat::types::CombatResult;
use crate::core::log::{KeyEcho, Translator};
use crate::core::session::{CombatReport, GameSession, NoopObserver, TileReport, TurnReport};
use crate::items::inventory::Satchel;
use crate::items::types::Weapon;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Run the full simulation and return a report.
pub fn run_simulation(config: &SimConfig) -> SimReport {
    let mut all_runs = Vec::with_capacity(config.num_runs as usize);

    for run_idx in 0..config.num_runs {
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(run_idx as u64)),
            None => ChaCha8Rng::from_entropy(),
        };

        let Some(stats) = simulate_single_run(config, &mut rng) else {
            tracing::warn!(map = %config.map_id, "cannot simulate unknown map");
            break;
        };
        if config.verbosity >= 2 {
            tracing::info!(
                run = run_idx + 1,
                outcome = ?stats.outcome,
                wave = stats.final_wave,
                level = stats.final_level,
                victories = stats.victories,
                "run finished"
            );
        }
        all_runs.push(stats);
    }

    SimReport::from_runs(&config.map_id, all_runs)
}

#[derive(Default)]
struct Tally {
    actions: u64,
    victories: u32,
    flees: u32,
    items_found: u32,
    items_declined: u32,
    events_seen: u32,
}

impl Tally {
    fn record_combat(&mut self, report: &CombatReport) {
        match report.result {
            Some(CombatResult::Victory) => self.victories += 1,
            Some(CombatResult::Fled) => self.flees += 1,
            _ => {}
        }
        self.items_found += report.loot.len() as u32;
        self.items_declined += report.declined.len() as u32;
    }

    fn record_turn(&mut self, report: &TurnReport) {
        if let Some(finished) = &report.finished {
            self.record_combat(finished);
        }
    }

    fn record_tile(&mut self, report: &TileReport) {
        match report {
            TileReport::ChestOpened { items, declined } => {
                self.items_found += items.len() as u32;
                self.items_declined += declined.len() as u32;
            }
            TileReport::EventAwaitingChoice(_) => self.events_seen += 1,
            TileReport::EventResolved {
                resolution,
                declined,
            } => {
                self.items_found += resolution.loot.len() as u32;
                self.items_declined += declined.len() as u32;
            }
            _ => {}
        }
    }
}

/// Picks the part with the best expected damage per swing.
fn best_part(session: &GameSession) -> BodyPart {
    let enabled = session
        .active_target()
        .map(|t| t.monster.parts.enabled_parts())
        .unwrap_or_default();
    let mut best = (BodyPart::Body, f64::MIN);
    for part in enabled {
        let range = session.predicted_damage(part);
        let expected =
            session.hit_chance(part) as f64 / 100.0 * (range.min + range.max) as f64 / 2.0;
        if expected > best.1 {
            best = (part, expected);
        }
    }
    best.0
}

/// The run log rendered without a message catalog.
fn render_run_log(session: &GameSession) -> Vec<String> {
    session
        .dungeon_state()
        .log
        .iter()
        .map(|line| KeyEcho.render(line))
        .collect()
}

fn hp_below(session: &GameSession, pct: u32) -> bool {
    let run = session.dungeon_state();
    run.current_hp * 100 < run.max_hp * pct
}

/// Plays one run to its end or the action cap. None if the map is unknown.
fn simulate_single_run(config: &SimConfig, rng: &mut ChaCha8Rng) -> Option<RunStats> {
    let wanderer = recruit("SimWanderer", rng);
    let satchel = Satchel::default().with_weapon(Weapon::new("rusty_sword", 3, 6, 12));
    let mut session =
        GameSession::start(wanderer, &config.map_id, satchel, Box::new(NoopObserver))?;
    let mut tally = Tally::default();

    while !session.is_over() && tally.actions < config.max_actions_per_run {
        tally.actions += 1;

        if let Some(active) = session.dungeon_state().active_event.clone() {
            let choice = rng.gen_range(0..active.choices.len().max(1));
            match session.choose_event_option(choice, rng) {
                Some(report) => tally.record_tile(&report),
                None => session.abandon(),
            }
            continue;
        }

        if session.awaiting_player_turn() {
            let report = if config.flee_below_hp_pct > 0
                && hp_below(&session, config.flee_below_hp_pct)
            {
                session.attempt_flee(rng).map(|(_, report)| report)
            } else {
                let part = best_part(&session);
                session.player_attack(part, rng).map(|(_, report)| report)
            };
            match report {
                Some(report) => tally.record_turn(&report),
                None => session.abandon(),
            }
            continue;
        }

        if session.combat_state().is_some() {
            // Encounter stuck without a player turn; nothing the policy can do
            session.abandon();
            break;
        }

        while session.dungeon_state().free_stat_points > 0 {
            let stat = if hp_below(&session, 60) {
                StatType::Vitality
            } else {
                StatType::Dexterity
            };
            if !session.allocate_stat(stat) {
                break;
            }
        }
        if hp_below(&session, config.heal_below_hp_pct) {
            session.use_consumable();
        }

        let (_, report) = session.move_and_resolve(rng);
        tally.record_tile(&report);
        // Choice events are counted when offered, immediate ones here
        if let TileReport::EventResolved { .. } = report {
            tally.events_seen += 1;
        }
    }

    let timed_out = !session.is_over();
    if timed_out {
        session.abandon();
    }
    if config.verbosity >= 3 {
        for line in render_run_log(&session) {
            tracing::info!(target: "wander::simulator::log", "{}", line);
        }
    }
    let run = session.dungeon_state();
    Some(RunStats {
        outcome: if timed_out { None } else { run.outcome },
        timed_out,
        final_wave: run.wave,
        final_level: run.level,
        turns: run.turn,
        actions: tally.actions,
        victories: tally.victories,
        flees: tally.flees,
        items_found: tally.items_found,
        items_declined: tally.items_declined,
        events_seen: tally.events_seen,
    })
}
