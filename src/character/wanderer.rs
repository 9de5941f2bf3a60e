//! The player character.

use super::attributes::Stats;
use super::traits::{Polarity, Trait, TraitKind};
use crate::core::constants::{
    BASE_HP, BASE_MAX_SANITY, FRAIL_HP_PENALTY, HP_PER_VIT, RECRUIT_STAT_MAX, RECRUIT_STAT_MIN,
};
use crate::dungeon::types::Theme;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wanderer {
    pub id: String,
    pub name: String,
    pub stats: Stats,
    pub traits: Vec<Trait>,
    pub level: u32,
    pub exp: u32,
}

impl Wanderer {
    pub fn new(name: &str, stats: Stats) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            stats,
            traits: Vec::new(),
            level: 1,
            exp: 0,
        }
    }

    pub fn with_trait(mut self, t: Trait) -> Self {
        if !self.traits.iter().any(|existing| existing.id == t.id) {
            self.traits.push(t);
        }
        self
    }

    pub fn has(&self, kind: TraitKind) -> bool {
        self.traits.iter().any(|t| t.kind == kind)
    }

    pub fn max_hp(&self) -> u32 {
        let hp = BASE_HP + HP_PER_VIT * self.stats.vit();
        if self.has(TraitKind::Frail) {
            hp.saturating_sub(FRAIL_HP_PENALTY).max(1)
        } else {
            hp
        }
    }

    pub fn max_sanity(&self) -> u32 {
        BASE_MAX_SANITY
    }

    pub fn defense(&self) -> u32 {
        self.stats.vit() / 2
    }

    pub fn traits_of(&self, polarity: Polarity) -> impl Iterator<Item = &Trait> {
        self.traits.iter().filter(move |t| t.polarity() == polarity)
    }
}

fn roll_traits(pool: &[TraitKind], rng: &mut impl Rng) -> Vec<Trait> {
    let count = rng.gen_range(1..=2);
    pool.choose_multiple(rng, count)
        .map(|kind| {
            if kind.is_themed() {
                let themes = Theme::all();
                Trait::themed(*kind, themes[rng.gen_range(0..themes.len())])
            } else {
                Trait::new(*kind)
            }
        })
        .collect()
}

/// Recruits a fresh wanderer: rolled stats plus 1-2 positive and 1-2 negative traits.
pub fn recruit(name: &str, rng: &mut impl Rng) -> Wanderer {
    let mut roll = || rng.gen_range(RECRUIT_STAT_MIN..=RECRUIT_STAT_MAX);
    let stats = Stats::from_values(roll(), roll(), roll(), roll(), roll(), roll());
    let mut wanderer = Wanderer::new(name, stats);
    let mut traits = roll_traits(&TraitKind::positives(), rng);
    traits.extend(roll_traits(&TraitKind::negatives(), rng));
    for t in traits {
        wanderer = wanderer.with_trait(t);
    }
    wanderer
}
