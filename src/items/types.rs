use serde::{Deserialize, Serialize};

/// Equipped weapon. `durability: None` never breaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: String,
    pub dmg_min: u32,
    pub dmg_max: u32,
    pub durability: Option<u32>,
}

impl Weapon {
    pub const FISTS_ID: &'static str = "fists";

    pub fn new(id: &str, dmg_min: u32, dmg_max: u32, durability: u32) -> Self {
        Self {
            id: id.to_string(),
            dmg_min: dmg_min.min(dmg_max),
            dmg_max: dmg_max.max(dmg_min),
            durability: Some(durability),
        }
    }

    /// Fallback that replaces a broken weapon. Attacks with it use unarmed rules.
    pub fn fists() -> Self {
        Self {
            id: Self::FISTS_ID.to_string(),
            dmg_min: 0,
            dmg_max: 0,
            durability: None,
        }
    }

    pub fn is_unarmed(&self) -> bool {
        self.id == Self::FISTS_ID
    }

    pub fn average_damage(&self) -> f64 {
        (self.dmg_min + self.dmg_max) as f64 / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    Material,
    Consumable { heal: u32 },
    Weapon(Weapon),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub weight: u32,
    pub kind: ItemKind,
}

impl Item {
    pub fn name_key(&self) -> String {
        format!("item.{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weapon_range_normalized() {
        let w = Weapon::new("odd", 9, 4, 10);
        assert_eq!(w.dmg_min, 4);
        assert_eq!(w.dmg_max, 9);
        assert_eq!(w.average_damage(), 6.5);
    }

    #[test]
    fn test_fists_are_unarmed_and_unbreakable() {
        let fists = Weapon::fists();
        assert!(fists.is_unarmed());
        assert!(fists.durability.is_none());
        assert!(!Weapon::new("dagger", 2, 4, 5).is_unarmed());
    }
}
