//! Monster templates, abilities and level-scaled instances.

use crate::core::constants::*;
use crate::core::weighted::Weighted;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    Head,
    Body,
    Legs,
}

impl BodyPart {
    pub fn all() -> [BodyPart; 3] {
        [BodyPart::Head, BodyPart::Body, BodyPart::Legs]
    }

    /// Flat hit modifier added to the base hit chance.
    pub fn hit_bonus(&self) -> i32 {
        match self {
            BodyPart::Head => -20,
            BodyPart::Body => 10,
            BodyPart::Legs => 0,
        }
    }

    pub fn damage_multiplier(&self) -> f64 {
        match self {
            BodyPart::Head => 1.5,
            BodyPart::Body => 1.0,
            BodyPart::Legs => 0.8,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            BodyPart::Head => "part.head",
            BodyPart::Body => "part.body",
            BodyPart::Legs => "part.legs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartEntry {
    pub enabled: bool,
    /// Replaces the computed base hit chance when set
    #[serde(default)]
    pub hit: Option<i32>,
}

impl PartEntry {
    pub const OPEN: PartEntry = PartEntry {
        enabled: true,
        hit: None,
    };
    pub const DISABLED: PartEntry = PartEntry {
        enabled: false,
        hit: None,
    };

    pub const fn fixed(hit: i32) -> Self {
        Self {
            enabled: true,
            hit: Some(hit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartTable {
    pub head: PartEntry,
    pub body: PartEntry,
    pub legs: PartEntry,
}

impl Default for PartTable {
    fn default() -> Self {
        Self {
            head: PartEntry::OPEN,
            body: PartEntry::OPEN,
            legs: PartEntry::OPEN,
        }
    }
}

impl PartTable {
    pub fn entry(&self, part: BodyPart) -> PartEntry {
        match part {
            BodyPart::Head => self.head,
            BodyPart::Body => self.body,
            BodyPart::Legs => self.legs,
        }
    }

    pub fn enabled_parts(&self) -> Vec<BodyPart> {
        BodyPart::all()
            .into_iter()
            .filter(|p| self.entry(*p).enabled)
            .collect()
    }
}

/// Special behavior of a monster, checked by the attack routine in a fixed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MonsterAbility {
    None,
    /// Double damage while the combat turn counter is at most 1
    FirstTurnCrit { multiplier: f64 },
    AreaOfEffect { every_n_turns: u32, multiplier: f64 },
    /// Damage becomes ATK - DEF/2, ignoring sanity and earlier modifiers
    MagicAttack,
    Summon {
        template: String,
        chance: f64,
        cap: usize,
    },
    /// Spends the turn raising its own ATK instead of attacking
    BuffSelf { every_n_turns: u32, atk_gain: u32 },
    Entangle { chance: f64, agi_loss: u32 },
    /// Thorns on every hit taken, chance to poison on hit
    Poison { apply_chance: f64 },
    Burn,
    /// Halves incoming physical damage
    PhysicalResist,
    /// Heals after surviving a hit
    SplitHeal { heal: u32 },
}

impl MonsterAbility {
    pub fn key(&self) -> &'static str {
        match self {
            MonsterAbility::None => "ability.none",
            MonsterAbility::FirstTurnCrit { .. } => "ability.first_turn_crit",
            MonsterAbility::AreaOfEffect { .. } => "ability.aoe",
            MonsterAbility::MagicAttack => "ability.magic",
            MonsterAbility::Summon { .. } => "ability.summon",
            MonsterAbility::BuffSelf { .. } => "ability.buff_self",
            MonsterAbility::Entangle { .. } => "ability.entangle",
            MonsterAbility::Poison { .. } => "ability.poison",
            MonsterAbility::Burn => "ability.burn",
            MonsterAbility::PhysicalResist => "ability.physical_resist",
            MonsterAbility::SplitHeal { .. } => "ability.split_heal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub id: String,
    pub level: u32,
    pub hp: u32,
    pub atk: u32,
    pub def: u32,
    pub eva: u32,
    pub spd: u32,
    pub exp: u32,
    pub parts: PartTable,
    pub ability: MonsterAbility,
    /// Rolled against a total of 100; unclaimed weight is no drop
    pub loot: Vec<Weighted<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub template_id: String,
    pub level: u32,
    pub max_hp: u32,
    pub hp: u32,
    pub atk: u32,
    pub def: u32,
    pub eva: u32,
    pub spd: u32,
    pub exp: u32,
    pub parts: PartTable,
    pub ability: MonsterAbility,
}

impl Monster {
    /// Builds an instance of `template` for a wave of level `wave_level`.
    ///
    /// Stats only scale upward: a template above the wave level keeps its base.
    pub fn from_template(template: &MonsterTemplate, wave_level: u32) -> Self {
        let delta = wave_level.saturating_sub(template.level);
        let d = delta as f64;
        let max_hp = (template.hp as f64 * (1.0 + MONSTER_HP_PER_LEVEL * d)).round() as u32;
        Self {
            template_id: template.id.clone(),
            level: template.level.max(wave_level),
            max_hp,
            hp: max_hp,
            atk: (template.atk as f64 * (1.0 + MONSTER_ATK_PER_LEVEL * d)).round() as u32,
            def: template.def + (MONSTER_DEF_PER_LEVEL * d).round() as u32,
            eva: (template.eva + MONSTER_EVA_PER_LEVEL * delta).min(MONSTER_EVA_CAP),
            spd: template.spd,
            exp: template.exp + MONSTER_EXP_PER_LEVEL * delta,
            parts: template.parts,
            ability: template.ability.clone(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.hp = self.hp.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    pub fn name_key(&self) -> String {
        format!("monster.{}", self.template_id)
    }

    pub fn is_physical_resistant(&self) -> bool {
        matches!(self.ability, MonsterAbility::PhysicalResist)
    }
}

fn loot(entries: &[(&str, f64)]) -> Vec<Weighted<String>> {
    entries
        .iter()
        .map(|(id, w)| Weighted::new(id.to_string(), *w))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn template(
    id: &str,
    level: u32,
    hp: u32,
    atk: u32,
    def: u32,
    eva: u32,
    spd: u32,
    exp: u32,
    ability: MonsterAbility,
) -> MonsterTemplate {
    MonsterTemplate {
        id: id.to_string(),
        level,
        hp,
        atk,
        def,
        eva,
        spd,
        exp,
        parts: PartTable::default(),
        ability,
        loot: Vec::new(),
    }
}

/// Static monster catalog.
pub fn all_templates() -> Vec<MonsterTemplate> {
    vec![
        MonsterTemplate {
            loot: loot(&[("slime_jelly", 40.0)]),
            ..template("slime", 1, 18, 5, 0, 5, 4, 4, MonsterAbility::SplitHeal {
                heal: SPLIT_HEAL_AMOUNT,
            })
        },
        MonsterTemplate {
            loot: loot(&[("goblin_ear", 35.0), ("rusty_sword", 5.0)]),
            ..template("goblin", 2, 24, 7, 1, 10, 7, 6, MonsterAbility::BuffSelf {
                every_n_turns: 3,
                atk_gain: 2,
            })
        },
        MonsterTemplate {
            loot: loot(&[("wolf_pelt", 45.0)]),
            ..template("wolf", 2, 22, 8, 0, 15, 10, 6, MonsterAbility::FirstTurnCrit {
                multiplier: 2.0,
            })
        },
        MonsterTemplate {
            parts: PartTable {
                legs: PartEntry::fixed(70),
                ..PartTable::default()
            },
            loot: loot(&[("venom_sac", 30.0)]),
            ..template("spider", 3, 26, 7, 1, 10, 8, 8, MonsterAbility::Poison {
                apply_chance: POISON_APPLY_CHANCE,
            })
        },
        MonsterTemplate {
            loot: loot(&[("ember_core", 30.0)]),
            ..template("fire_imp", 3, 20, 9, 0, 20, 9, 8, MonsterAbility::Burn)
        },
        MonsterTemplate {
            parts: PartTable {
                head: PartEntry::fixed(25),
                ..PartTable::default()
            },
            loot: loot(&[("ancient_bark", 35.0)]),
            ..template("treant", 4, 40, 8, 3, 0, 3, 10, MonsterAbility::Entangle {
                chance: ENTANGLE_CHANCE,
                agi_loss: 1,
            })
        },
        MonsterTemplate {
            parts: PartTable {
                legs: PartEntry::DISABLED,
                ..PartTable::default()
            },
            loot: loot(&[("iron_ore", 50.0), ("war_axe", 5.0)]),
            ..template("golem", 5, 45, 10, 4, 0, 2, 14, MonsterAbility::PhysicalResist)
        },
        MonsterTemplate {
            loot: loot(&[("bat_wing", 25.0)]),
            ..template("vampire", 5, 34, 10, 2, 15, 8, 16, MonsterAbility::Summon {
                template: "bat".to_string(),
                chance: SUMMON_CHANCE,
                cap: SUMMON_CAP,
            })
        },
        MonsterTemplate {
            parts: PartTable {
                head: PartEntry::fixed(40),
                body: PartEntry::fixed(65),
                legs: PartEntry::DISABLED,
            },
            loot: loot(&[("bat_wing", 20.0)]),
            ..template("bat", 1, 8, 4, 0, 25, 12, 2, MonsterAbility::None)
        },
        MonsterTemplate {
            loot: loot(&[("ogre_tusk", 40.0), ("war_axe", 10.0)]),
            ..template("ogre", 6, 60, 12, 3, 0, 4, 20, MonsterAbility::AreaOfEffect {
                every_n_turns: 2,
                multiplier: 1.5,
            })
        },
        MonsterTemplate {
            parts: PartTable {
                legs: PartEntry::DISABLED,
                ..PartTable::default()
            },
            loot: loot(&[("ectoplasm", 35.0)]),
            ..template("wraith", 6, 30, 11, 0, 30, 9, 18, MonsterAbility::MagicAttack)
        },
        MonsterTemplate {
            loot: loot(&[("rat_tail", 50.0)]),
            ..template("rat", 1, 12, 4, 0, 10, 6, 3, MonsterAbility::None)
        },
    ]
}

/// Looks up a template by id, logging the raw id on a miss.
pub fn find_template(id: &str) -> Option<MonsterTemplate> {
    let found = all_templates().into_iter().find(|t| t.id == id);
    if found.is_none() {
        tracing::warn!(template = id, "unknown monster template");
    }
    found
}

/// Spawns a random monster from `pool` at `wave_level`. Unknown ids are skipped.
pub fn spawn_from_pool(pool: &[String], wave_level: u32, rng: &mut impl Rng) -> Option<Monster> {
    if pool.is_empty() {
        return None;
    }
    let id = &pool[rng.gen_range(0..pool.len())];
    find_template(id).map(|t| Monster::from_template(&t, wave_level))
}
