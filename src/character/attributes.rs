use crate::core::constants::NUM_STATS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StatType {
    Vitality,
    Strength,
    Agility,
    Speed,
    Dexterity,
    Luck,
}

impl StatType {
    pub fn all() -> [StatType; NUM_STATS] {
        [
            StatType::Vitality,
            StatType::Strength,
            StatType::Agility,
            StatType::Speed,
            StatType::Dexterity,
            StatType::Luck,
        ]
    }

    pub fn abbrev(&self) -> &str {
        match self {
            StatType::Vitality => "VIT",
            StatType::Strength => "STR",
            StatType::Agility => "AGI",
            StatType::Speed => "SPD",
            StatType::Dexterity => "DEX",
            StatType::Luck => "LUK",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            StatType::Vitality => 0,
            StatType::Strength => 1,
            StatType::Agility => 2,
            StatType::Speed => 3,
            StatType::Dexterity => 4,
            StatType::Luck => 5,
        }
    }
}

/// Base stat block of a wanderer: VIT, STR, AGI, SPD, DEX, LUK.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stats {
    values: [u32; NUM_STATS],
}

impl Default for Stats {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Stats {
    pub fn new(value: u32) -> Self {
        Self {
            values: [value; NUM_STATS],
        }
    }

    pub fn from_values(vit: u32, str: u32, agi: u32, spd: u32, dex: u32, luk: u32) -> Self {
        Self {
            values: [vit, str, agi, spd, dex, luk],
        }
    }

    pub fn get(&self, stat: StatType) -> u32 {
        self.values[stat.index()]
    }

    pub fn set(&mut self, stat: StatType, value: u32) {
        self.values[stat.index()] = value;
    }

    pub fn increment(&mut self, stat: StatType) {
        self.values[stat.index()] = self.values[stat.index()].saturating_add(1);
    }

    pub fn vit(&self) -> u32 {
        self.get(StatType::Vitality)
    }

    pub fn str(&self) -> u32 {
        self.get(StatType::Strength)
    }

    pub fn agi(&self) -> u32 {
        self.get(StatType::Agility)
    }

    pub fn spd(&self) -> u32 {
        self.get(StatType::Speed)
    }

    pub fn dex(&self) -> u32 {
        self.get(StatType::Dexterity)
    }

    pub fn luk(&self) -> u32 {
        self.get(StatType::Luck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values_order() {
        let stats = Stats::from_values(1, 2, 3, 4, 5, 6);
        assert_eq!(stats.vit(), 1);
        assert_eq!(stats.str(), 2);
        assert_eq!(stats.agi(), 3);
        assert_eq!(stats.spd(), 4);
        assert_eq!(stats.dex(), 5);
        assert_eq!(stats.luk(), 6);
    }

    #[test]
    fn test_get_set_increment() {
        let mut stats = Stats::new(5);
        stats.set(StatType::Speed, 9);
        assert_eq!(stats.get(StatType::Speed), 9);
        stats.increment(StatType::Speed);
        assert_eq!(stats.spd(), 10);
    }

    #[test]
    fn test_increment_saturates() {
        let mut stats = Stats::new(u32::MAX);
        stats.increment(StatType::Luck);
        assert_eq!(stats.luk(), u32::MAX);
    }

    #[test]
    fn test_all_indices_unique() {
        let mut seen = [false; NUM_STATS];
        for stat in StatType::all() {
            assert!(!seen[stat.index()]);
            seen[stat.index()] = true;
        }
    }
}
