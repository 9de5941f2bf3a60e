//! Item catalog and loot rolls for chests and monster drops.

use super::types::{Item, ItemKind, Weapon};
use crate::combat::monster::find_template;
use crate::core::constants::MONSTER_LOOT_TOTAL;
use crate::core::weighted::{weighted_pick, weighted_pick_from_total, Weighted};
use rand::Rng;

fn material(id: &str, weight: u32) -> Item {
    Item {
        id: id.to_string(),
        weight,
        kind: ItemKind::Material,
    }
}

fn potion(id: &str, heal: u32) -> Item {
    Item {
        id: id.to_string(),
        weight: 1,
        kind: ItemKind::Consumable { heal },
    }
}

fn weapon(id: &str, dmg_min: u32, dmg_max: u32, durability: u32, weight: u32) -> Item {
    Item {
        id: id.to_string(),
        weight,
        kind: ItemKind::Weapon(Weapon::new(id, dmg_min, dmg_max, durability)),
    }
}

pub fn all_items() -> Vec<Item> {
    vec![
        potion("small_potion", 15),
        potion("large_potion", 35),
        material("slime_jelly", 1),
        material("goblin_ear", 1),
        material("wolf_pelt", 3),
        material("venom_sac", 1),
        material("ember_core", 2),
        material("ancient_bark", 4),
        material("iron_ore", 5),
        material("bat_wing", 1),
        material("ogre_tusk", 4),
        material("ectoplasm", 1),
        material("rat_tail", 1),
        material("gold_pouch", 2),
        weapon("rusty_sword", 3, 6, 12, 4),
        weapon("hunting_knife", 2, 5, 20, 2),
        weapon("war_axe", 5, 9, 15, 7),
    ]
}

/// Looks up an item by id, logging the raw id on a miss.
pub fn find_item(id: &str) -> Option<Item> {
    let found = all_items().into_iter().find(|i| i.id == id);
    if found.is_none() {
        tracing::warn!(item = id, "unknown item id");
    }
    found
}

/// Chest table by id. Unknown tables fall back to "common".
pub fn chest_table(id: &str) -> Vec<Weighted<String>> {
    let entries: &[(&str, f64)] = match id {
        "rich" => &[
            ("large_potion", 30.0),
            ("gold_pouch", 40.0),
            ("war_axe", 10.0),
            ("hunting_knife", 20.0),
        ],
        "common" => &[
            ("small_potion", 45.0),
            ("gold_pouch", 30.0),
            ("hunting_knife", 10.0),
            ("rusty_sword", 15.0),
        ],
        other => {
            tracing::warn!(table = other, "unknown chest table, using common");
            return chest_table("common");
        }
    };
    entries
        .iter()
        .map(|(id, w)| Weighted::new(id.to_string(), *w))
        .collect()
}

/// Rolls one chest item. Chest tables always yield something.
pub fn roll_chest_loot(table: &str, rng: &mut impl Rng) -> Option<Item> {
    let entries = chest_table(table);
    weighted_pick(&entries, rng).and_then(|id| find_item(id))
}

/// Rolls a monster drop against the implicit total of 100. Unclaimed weight is no drop.
pub fn roll_monster_loot(template_id: &str, rng: &mut impl Rng) -> Option<Item> {
    let template = find_template(template_id)?;
    weighted_pick_from_total(&template.loot, MONSTER_LOOT_TOTAL, rng).and_then(|id| find_item(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::monster::all_templates;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_every_loot_reference_exists() {
        for template in all_templates() {
            for entry in &template.loot {
                assert!(find_item(&entry.item).is_some(), "{}", entry.item);
            }
        }
        for table in ["common", "rich"] {
            for entry in chest_table(table) {
                assert!(find_item(&entry.item).is_some(), "{}", entry.item);
            }
        }
    }

    #[test]
    fn test_chest_always_yields() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            assert!(roll_chest_loot("common", &mut rng).is_some());
        }
    }

    #[test]
    fn test_unknown_chest_table_falls_back() {
        assert_eq!(chest_table("nope"), chest_table("common"));
    }

    #[test]
    fn test_monster_loot_no_drop_is_reachable() {
        // Slime claims 40 of 100
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let rolls: Vec<Option<Item>> = (0..100)
            .map(|_| roll_monster_loot("slime", &mut rng))
            .collect();
        assert!(rolls.iter().any(|r| r.is_none()));
        assert!(rolls.iter().any(|r| r.is_some()));
    }

    #[test]
    fn test_unknown_monster_drops_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(roll_monster_loot("missing", &mut rng).is_none());
    }
}
