//! Static map configuration.

use super::types::Theme;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub id: String,
    pub theme: Theme,
    /// Tiles per board edge, corners included
    pub side: usize,
    pub max_wave: u32,
    /// Monster level on wave 1; each wave adds one
    pub base_level: u32,
    pub monster_dice: (u32, u32),
    pub treasure_dice: (u32, u32),
    pub event_dice: (u32, u32),
    pub monster_pool: Vec<String>,
    pub chest_table: String,
    pub view_range: usize,
}

impl MapConfig {
    pub fn tile_count(&self) -> usize {
        4 * (self.side.max(2) - 1)
    }

    pub fn wave_level(&self, wave: u32) -> u32 {
        self.base_level + wave.saturating_sub(1)
    }
}

fn pool(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

pub fn all_maps() -> Vec<MapConfig> {
    vec![
        MapConfig {
            id: "whispering_woods".to_string(),
            theme: Theme::Forest,
            side: 6,
            max_wave: 3,
            base_level: 1,
            monster_dice: (1, 3),
            treasure_dice: (1, 2),
            event_dice: (0, 2),
            monster_pool: pool(&["rat", "slime", "wolf", "goblin", "treant"]),
            chest_table: "common".to_string(),
            view_range: 2,
        },
        MapConfig {
            id: "sunken_mine".to_string(),
            theme: Theme::Mine,
            side: 7,
            max_wave: 4,
            base_level: 3,
            monster_dice: (2, 4),
            treasure_dice: (1, 2),
            event_dice: (1, 2),
            monster_pool: pool(&["rat", "goblin", "golem", "fire_imp", "spider"]),
            chest_table: "common".to_string(),
            view_range: 1,
        },
        MapConfig {
            id: "rotting_fen".to_string(),
            theme: Theme::Swamp,
            side: 7,
            max_wave: 4,
            base_level: 4,
            monster_dice: (2, 4),
            treasure_dice: (1, 3),
            event_dice: (1, 3),
            monster_pool: pool(&["slime", "spider", "treant", "ogre"]),
            chest_table: "rich".to_string(),
            view_range: 2,
        },
        MapConfig {
            id: "hollow_crypt".to_string(),
            theme: Theme::Crypt,
            side: 8,
            max_wave: 5,
            base_level: 5,
            monster_dice: (2, 5),
            treasure_dice: (1, 3),
            event_dice: (1, 3),
            monster_pool: pool(&["bat", "wraith", "vampire", "golem"]),
            chest_table: "rich".to_string(),
            view_range: 1,
        },
    ]
}

pub fn get_map(id: &str) -> Option<MapConfig> {
    let found = all_maps().into_iter().find(|m| m.id == id);
    if found.is_none() {
        tracing::warn!(map = id, "unknown map id");
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::monster::find_template;

    #[test]
    fn test_tile_count_is_square_ring() {
        let map = get_map("whispering_woods").unwrap();
        assert_eq!(map.tile_count(), 20);
    }

    #[test]
    fn test_wave_level_progression() {
        let map = get_map("sunken_mine").unwrap();
        assert_eq!(map.wave_level(1), 3);
        assert_eq!(map.wave_level(3), 5);
    }

    #[test]
    fn test_pools_reference_real_monsters() {
        for map in all_maps() {
            for id in &map.monster_pool {
                assert!(find_template(id).is_some(), "{} in {}", id, map.id);
            }
            assert!(map.monster_dice.0 <= map.monster_dice.1);
            assert!(map.treasure_dice.0 <= map.treasure_dice.1);
            assert!(map.event_dice.0 <= map.event_dice.1);
        }
    }

    #[test]
    fn test_unknown_map() {
        assert!(get_map("atlantis").is_none());
    }
}
