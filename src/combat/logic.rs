//! ATB combat engine.
//!
//! Every function takes the encounter explicitly and fails soft: with no living
//! target or a finished encounter they return neutral defaults instead of
//! erroring, so the shell can call them at any time.

use super::monster::{find_template, BodyPart, Monster, MonsterAbility};
use super::types::*;
use crate::character::attributes::StatType;
use crate::character::sanity::{sanity_modifiers, SanityTier};
use crate::character::status::StatusEffect;
use crate::character::traits::{has_trait, Trait, TraitKind};
use crate::character::wanderer::Wanderer;
use crate::core::constants::*;
use crate::core::log::LogLine;
use crate::core::session::SessionObserver;
use crate::dungeon::types::DungeonRunState;
use crate::items::inventory::Inventory;
use crate::items::types::Weapon;
use rand::Rng;

/// Everything outside the encounter that an action reads or writes.
pub struct CombatContext<'a> {
    pub run: &'a mut DungeonRunState,
    pub traits: &'a [Trait],
    pub inventory: &'a mut dyn Inventory,
    pub observer: &'a mut dyn SessionObserver,
}

fn usable_weapon(weapon: Option<&Weapon>) -> Option<&Weapon> {
    weapon.filter(|w| !w.is_unarmed())
}

/// Damage roll bounds: the weapon's range, or STR+1..=STR+3 bare-handed.
fn weapon_range(weapon: Option<&Weapon>, strength: u32) -> (u32, u32) {
    match usable_weapon(weapon) {
        Some(w) => (w.dmg_min, w.dmg_max),
        None => (
            strength + UNARMED_DMG_MIN_BONUS,
            strength + UNARMED_DMG_MAX_BONUS,
        ),
    }
}

/// Starts an encounter against `monster`.
pub fn init_combat(
    wanderer: &Wanderer,
    run: &DungeonRunState,
    inventory: &dyn Inventory,
    monster: Monster,
    origin_tile: Option<usize>,
) -> CombatState {
    let stats = run.status_effects.modified_stats(&wanderer.stats);
    let base_attack = match usable_weapon(inventory.equipped_weapon()) {
        Some(w) => w.average_damage(),
        None => (stats.str() + UNARMED_ATK_BONUS) as f64,
    };
    let carry = inventory.carry_tier(stats.str());
    let gauge = AtbGauge::for_speed(stats.spd()).with_carry_multiplier(carry.atb_tick_multiplier);

    tracing::debug!(
        monster = %monster.template_id,
        level = monster.level,
        player_tick = gauge.max_tick,
        "combat started"
    );

    CombatState {
        player: PlayerCombatant {
            hp: run.current_hp,
            max_hp: run.max_hp,
            stats,
            def: stats.vit() / 2,
            base_attack,
            gauge,
        },
        monsters: vec![MonsterCombatant::new(monster, false)],
        active_target: 0,
        acting_monster: None,
        next_turn: None,
        turn: 0,
        phase: CombatPhase::Init,
        result: None,
        theme: run.theme,
        origin_tile,
        last_attacked: None,
        log: Default::default(),
    }
}

/// Runs the ATB clock down to the next ready actor and records it in `next_turn`.
///
/// Ready ties go to the highest SPD; the player sorts like any other actor.
/// Returns the elapsed tick amount, or 0 when the encounter is over.
pub fn advance_tick(combat: &mut CombatState) -> f64 {
    if combat.is_over() {
        return 0.0;
    }
    let mut actors: Vec<(Actor, u32)> = Vec::new();
    if combat.player.is_alive() {
        actors.push((Actor::Player, combat.player.stats.spd()));
    }
    for (i, m) in combat.monsters.iter().enumerate() {
        if m.is_alive() {
            actors.push((Actor::Monster(i), m.monster.spd));
        }
    }

    let elapsed = actors
        .iter()
        .filter_map(|(actor, _)| combat.gauge_mut(*actor).map(|g| g.current_tick))
        .fold(f64::INFINITY, f64::min);
    if !elapsed.is_finite() {
        return 0.0;
    }

    let mut ready = Vec::new();
    for (actor, spd) in &actors {
        if let Some(gauge) = combat.gauge_mut(*actor) {
            gauge.current_tick = round_to((gauge.current_tick - elapsed).max(0.0), 4);
            if gauge.is_ready() {
                ready.push((*actor, *spd));
            }
        }
    }
    ready.sort_by(|a, b| b.1.cmp(&a.1));

    match ready.first() {
        Some((Actor::Player, _)) => {
            combat.next_turn = Some(Turn::Player);
            combat.acting_monster = None;
        }
        Some((Actor::Monster(i), _)) => {
            combat.next_turn = Some(Turn::Monster);
            combat.acting_monster = Some(*i);
        }
        None => {}
    }
    elapsed
}

/// Refills an actor's gauge after it acts.
pub fn reset_tick(combat: &mut CombatState, actor: Actor) {
    if let Some(gauge) = combat.gauge_mut(actor) {
        gauge.reset();
    }
}

/// Logs who is nominally faster. Swift also shaves 30% off the player's gauge.
///
/// Turn order itself is still decided by [`advance_tick`]. Returns true when
/// the player is the faster side.
pub fn determine_initiative(combat: &mut CombatState, traits: &[Trait]) -> bool {
    let swift = has_trait(traits, TraitKind::Swift, combat.theme);
    let mut player_spd = combat.player.stats.spd();
    if swift {
        player_spd += INITIATIVE_TRAIT_SPD;
        let gauge = &mut combat.player.gauge;
        gauge.current_tick =
            round_to((gauge.current_tick - gauge.max_tick * INITIATIVE_HEAD_START).max(0.0), 4);
    }
    let monster_spd = combat.fastest_monster_spd();
    let player_first = player_spd >= monster_spd;
    let key = if player_first {
        "combat.initiative.player"
    } else {
        "combat.initiative.monster"
    };
    combat.add_log_entry(
        LogLine::new(key)
            .with("player_spd", player_spd)
            .with("monster_spd", monster_spd),
        false,
        player_first,
    );
    player_first
}

/// Chance in percent to hit `part` of the active target, clamped to [5, 95].
///
/// Returns 0 when there is no target.
pub fn hit_chance(combat: &CombatState, part: BodyPart, traits: &[Trait], sanity: u32) -> i32 {
    let Some(target) = combat.active_target() else {
        return 0;
    };
    let mut chance = match target.monster.parts.entry(part).hit {
        Some(fixed) => fixed,
        None => {
            BASE_HIT_CHANCE + part.hit_bonus() + HIT_PER_DEX * combat.player.stats.dex() as i32
                - target.monster.eva as i32
        }
    };
    if has_trait(traits, TraitKind::EagleEye, combat.theme) {
        chance += EAGLE_EYE_HIT_BONUS;
    }
    if has_trait(traits, TraitKind::Expert, combat.theme) {
        chance += EXPERT_HIT_BONUS;
    }
    chance += sanity_modifiers(sanity).accuracy;
    chance.clamp(HIT_CHANCE_MIN, HIT_CHANCE_MAX)
}

/// Damage preview for the UI. Never touches state.
pub fn predicted_damage(combat: &CombatState, part: BodyPart, weapon: Option<&Weapon>) -> DamageRange {
    let Some(target) = combat.active_target() else {
        return DamageRange::default();
    };
    let (lo, hi) = weapon_range(weapon, combat.player.stats.str());
    let resist = target.monster.is_physical_resistant();
    let at = |raw: u32| {
        let scaled = ((raw as i64 - target.monster.def as i64) as f64 * part.damage_multiplier())
            .round()
            .max(1.0);
        if resist {
            (scaled / 2.0).round().max(1.0) as u32
        } else {
            scaled as u32
        }
    };
    DamageRange {
        min: at(lo),
        max: at(hi),
    }
}

fn mirror_player_hp(combat: &CombatState, ctx: &mut CombatContext) {
    ctx.run.current_hp = combat.player.hp;
    ctx.observer.on_hud_dirty();
}

fn end_combat(combat: &mut CombatState, result: CombatResult) {
    combat.result = Some(result);
    combat.phase = CombatPhase::Result;
    combat.next_turn = None;
    combat.acting_monster = None;
    tracing::debug!(?result, turn = combat.turn, "combat ended");
}

/// Attacks `part` of the active target.
///
/// In the madness tier the requested part is replaced by a random enabled one.
/// Head hits are always critical.
pub fn player_attack(
    combat: &mut CombatState,
    ctx: &mut CombatContext,
    part: BodyPart,
    rng: &mut impl Rng,
) -> AttackOutcome {
    if combat.is_over() {
        return AttackOutcome::default();
    }
    let index = combat.active_target;
    let Some(target) = combat.monsters.get(index).filter(|m| m.is_alive()) else {
        tracing::debug!(index, "attack with no living target");
        return AttackOutcome::default();
    };

    let mut part = part;
    if SanityTier::from_sanity(ctx.run.sanity) == SanityTier::Madness {
        let parts = target.monster.parts.enabled_parts();
        if !parts.is_empty() {
            part = parts[rng.gen_range(0..parts.len())];
        }
    }

    combat.turn += 1;
    combat.last_attacked = Some(index);
    combat.phase = CombatPhase::Player;
    combat.next_turn = Some(Turn::Monster);

    let mut outcome = AttackOutcome {
        target_index: Some(index),
        part: Some(part),
        ..AttackOutcome::default()
    };

    let chance = hit_chance(combat, part, ctx.traits, ctx.run.sanity);
    outcome.hit = rng.gen_range(0.0..100.0) < chance as f64;
    if !outcome.hit {
        combat.add_log_entry(
            LogLine::new("combat.player_miss").with("part", part.key()),
            false,
            true,
        );
        return outcome;
    }

    let (lo, hi) = weapon_range(ctx.inventory.equipped_weapon(), combat.player.stats.str());
    let roll = rng.gen_range(lo..=hi);

    let target = &mut combat.monsters[index].monster;
    let base = roll.saturating_sub(target.def).max(1);
    let mut damage = ((base as f64 * part.damage_multiplier()).round() as u32).max(1);
    if target.is_physical_resistant() {
        damage = ((damage as f64 / 2.0).round() as u32).max(1);
    }
    outcome.damage = damage;
    outcome.critical = part == BodyPart::Head;
    target.take_damage(damage);
    let level = target.level;
    let alive = target.is_alive();
    let ability = target.ability.clone();

    if let MonsterAbility::Poison { .. } = ability {
        outcome.thorns = POISON_THORNS_BASE + level / 2;
    }
    if let (MonsterAbility::SplitHeal { heal }, true) = (&ability, alive) {
        combat.monsters[index].monster.heal(*heal);
    }

    combat.add_log_entry(
        LogLine::new(if outcome.critical {
            "combat.player_crit"
        } else {
            "combat.player_hit"
        })
        .with("damage", damage)
        .with("part", part.key()),
        outcome.critical,
        true,
    );
    tracing::debug!(damage, part = part.key(), target = index, "player hit");

    let wear = ctx.inventory.degrade_weapon_durability();
    if wear.broken {
        outcome.weapon_broke = true;
        combat.add_log_entry(LogLine::new("combat.weapon_broke"), false, true);
    }

    if outcome.thorns > 0 {
        combat.player.hp = combat.player.hp.saturating_sub(outcome.thorns);
        combat.add_log_entry(
            LogLine::new("combat.thorns").with("damage", outcome.thorns),
            false,
            false,
        );
        mirror_player_hp(combat, ctx);
    }

    if !alive {
        outcome.killed = true;
        let name = combat.monsters[index].monster.name_key();
        combat.add_log_entry(LogLine::new("combat.monster_died").with("monster", name), false, true);
        if combat.all_monsters_dead() {
            end_combat(combat, CombatResult::Victory);
        } else if let Some(next) = combat.living_monster_indices().first() {
            combat.active_target = *next;
        }
        ctx.observer.on_monster_set_changed();
    }

    if !combat.player.is_alive() && !combat.is_over() {
        end_combat(combat, CombatResult::Defeat);
    }
    outcome
}

/// Adds a summoned monster unless `cap` living summons already exist.
///
/// The newcomer starts with a full gauge, so it waits its turn like everyone else.
pub fn summon_monster(combat: &mut CombatState, template: &str, level: u32, cap: usize) -> bool {
    if combat.living_summons() >= cap {
        combat.add_log_entry(LogLine::new("combat.summon_declined"), false, false);
        return false;
    }
    let Some(t) = find_template(template) else {
        return false;
    };
    let monster = Monster::from_template(&t, level);
    combat.add_log_entry(
        LogLine::new("combat.summon").with("monster", monster.name_key()),
        false,
        false,
    );
    combat.monsters.push(MonsterCombatant::new(monster, true));
    true
}

/// One monster acts: the scheduler's pick, else the active target.
///
/// Abilities are checked in a fixed order: first-turn crit, area attack, magic,
/// summon, self-buff, entangle. A self-buff turn skips the attack entirely.
pub fn monster_attack(
    combat: &mut CombatState,
    ctx: &mut CombatContext,
    rng: &mut impl Rng,
) -> MonsterAttackOutcome {
    if combat.is_over() {
        return MonsterAttackOutcome::default();
    }
    let index = combat.acting_monster.unwrap_or(combat.active_target);
    let Some(actor) = combat.monsters.get(index).filter(|m| m.is_alive()) else {
        tracing::debug!(index, "monster attack with no living actor");
        return MonsterAttackOutcome::default();
    };
    let monster = actor.monster.clone();
    combat.phase = CombatPhase::Monster;

    let mut outcome = MonsterAttackOutcome {
        monster_index: Some(index),
        ..MonsterAttackOutcome::default()
    };
    let mods = sanity_modifiers(ctx.run.sanity);
    let player_def = combat.player.def as i64;
    let turn = combat.turn;

    let raw = (monster.atk as i64 - player_def) as f64 * (1.0 + mods.monster_damage_pct as f64 / 100.0);
    let mut damage = raw.round().max(1.0);

    if let MonsterAbility::FirstTurnCrit { multiplier } = monster.ability {
        if turn <= 1 {
            damage *= multiplier;
        }
    }
    if let MonsterAbility::AreaOfEffect {
        every_n_turns,
        multiplier,
    } = monster.ability
    {
        if every_n_turns > 0 && turn % every_n_turns == 0 {
            damage *= multiplier;
        }
    }
    if let MonsterAbility::MagicAttack = monster.ability {
        damage = (monster.atk as i64 - player_def / 2).max(1) as f64;
    }
    if let MonsterAbility::Summon {
        template,
        chance,
        cap,
    } = &monster.ability
    {
        if rng.gen::<f64>() < *chance && summon_monster(combat, template, monster.level, *cap) {
            outcome.summoned = true;
            ctx.observer.on_monster_set_changed();
        }
    }
    if let MonsterAbility::BuffSelf {
        every_n_turns,
        atk_gain,
    } = monster.ability
    {
        if every_n_turns > 0 && turn % every_n_turns == 0 {
            combat.monsters[index].monster.atk += atk_gain;
            combat.add_log_entry(
                LogLine::new("combat.monster_buff")
                    .with("monster", monster.name_key())
                    .with("atk", atk_gain),
                false,
                false,
            );
            outcome.skipped = true;
            return outcome;
        }
    }
    if let MonsterAbility::Entangle { chance, agi_loss } = monster.ability {
        if rng.gen::<f64>() < chance {
            let agi = combat.player.stats.agi().saturating_sub(agi_loss);
            combat.player.stats.set(StatType::Agility, agi);
            combat.add_log_entry(LogLine::new("combat.entangled"), false, false);
        }
    }

    let mut evasion = EVASION_PER_AGI * combat.player.stats.agi() as i32 + mods.evasion
        - mods.monster_accuracy;
    if has_trait(ctx.traits, TraitKind::Expert, combat.theme) {
        evasion += EXPERT_EVASION_BONUS;
    }
    if rng.gen_range(0.0..100.0) < evasion as f64 {
        outcome.evaded = true;
        combat.add_log_entry(
            LogLine::new("combat.evaded").with("monster", monster.name_key()),
            false,
            true,
        );
        return outcome;
    }

    if rng.gen_range(0.0..100.0) < mods.monster_crit as f64 {
        outcome.critical = true;
        damage *= MONSTER_CRIT_MULTIPLIER;
    }
    let damage = damage.round() as u32;
    outcome.damage = damage;
    combat.player.hp = combat.player.hp.saturating_sub(damage);
    combat.add_log_entry(
        LogLine::new(if outcome.critical {
            "combat.monster_crit"
        } else {
            "combat.monster_hit"
        })
        .with("monster", monster.name_key())
        .with("damage", damage),
        outcome.critical,
        false,
    );
    tracing::debug!(damage, monster = %monster.template_id, "monster hit");

    let inflicted = match monster.ability {
        MonsterAbility::Burn => Some(StatusEffect::burn()),
        MonsterAbility::Poison { apply_chance } if rng.gen::<f64>() < apply_chance => {
            Some(StatusEffect::poison())
        }
        _ => None,
    };
    if let Some(effect) = inflicted {
        combat.add_log_entry(LogLine::new("status.applied").with("id", &effect.id), false, false);
        ctx.run.status_effects.apply(effect);
    }
    mirror_player_hp(combat, ctx);

    if !combat.player.is_alive() {
        end_combat(combat, CombatResult::Defeat);
    }
    outcome
}

/// Tries to run. A failed attempt hands the turn to the monsters.
pub fn attempt_flee(combat: &mut CombatState, ctx: &mut CombatContext, rng: &mut impl Rng) -> bool {
    if combat.is_over() {
        return false;
    }
    let mods = sanity_modifiers(ctx.run.sanity);
    let spd_gap = combat.player.stats.spd() as i32 - combat.fastest_monster_spd() as i32;
    let mut chance = FLEE_BASE_CHANCE + FLEE_PER_SPD * spd_gap + mods.flee;
    if has_trait(ctx.traits, TraitKind::Clumsy, combat.theme) {
        chance -= FLEE_CLUMSY_PENALTY;
    }
    let chance = chance.clamp(FLEE_CHANCE_MIN, FLEE_CHANCE_MAX);

    if rng.gen_range(0.0..100.0) < chance as f64 {
        combat.add_log_entry(LogLine::new("combat.fled"), false, true);
        end_combat(combat, CombatResult::Fled);
        true
    } else {
        combat.add_log_entry(LogLine::new("combat.flee_failed"), false, true);
        combat.next_turn = Some(Turn::Monster);
        false
    }
}
