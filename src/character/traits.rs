//! Wanderer traits.
//!
//! Traits are a closed set. Some carry a theme condition and only apply while
//! the current dungeon matches it.

use crate::dungeon::types::Theme;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraitKind {
    /// +5 flat hit chance
    EagleEye,
    /// +3 SPD for initiative and a 30% ATB head start
    Swift,
    /// +10 hit and +5 evasion in a matching dungeon
    Expert,
    /// Chests may yield a second item
    Lucky,
    /// +30% sanity loss
    Coward,
    /// +50% sanity loss in a matching dungeon
    Phobia,
    /// -10 flee chance
    Clumsy,
    /// -5 max HP
    Frail,
}

impl TraitKind {
    pub fn polarity(&self) -> Polarity {
        match self {
            TraitKind::EagleEye | TraitKind::Swift | TraitKind::Expert | TraitKind::Lucky => {
                Polarity::Positive
            }
            TraitKind::Coward | TraitKind::Phobia | TraitKind::Clumsy | TraitKind::Frail => {
                Polarity::Negative
            }
        }
    }

    pub fn is_themed(&self) -> bool {
        matches!(self, TraitKind::Expert | TraitKind::Phobia)
    }

    pub fn key(&self) -> &'static str {
        match self {
            TraitKind::EagleEye => "trait.eagle_eye",
            TraitKind::Swift => "trait.swift",
            TraitKind::Expert => "trait.expert",
            TraitKind::Lucky => "trait.lucky",
            TraitKind::Coward => "trait.coward",
            TraitKind::Phobia => "trait.phobia",
            TraitKind::Clumsy => "trait.clumsy",
            TraitKind::Frail => "trait.frail",
        }
    }

    pub fn positives() -> [TraitKind; 4] {
        [
            TraitKind::EagleEye,
            TraitKind::Swift,
            TraitKind::Expert,
            TraitKind::Lucky,
        ]
    }

    pub fn negatives() -> [TraitKind; 4] {
        [
            TraitKind::Coward,
            TraitKind::Phobia,
            TraitKind::Clumsy,
            TraitKind::Frail,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    /// Unique per wanderer, e.g. "expert:forest"
    pub id: String,
    pub kind: TraitKind,
    #[serde(default)]
    pub condition: Option<Theme>,
}

impl Trait {
    pub fn new(kind: TraitKind) -> Self {
        Self {
            id: kind.key().trim_start_matches("trait.").to_string(),
            kind,
            condition: None,
        }
    }

    pub fn themed(kind: TraitKind, theme: Theme) -> Self {
        Self {
            id: format!("{}:{}", kind.key().trim_start_matches("trait."), theme.key()),
            kind,
            condition: Some(theme),
        }
    }

    pub fn polarity(&self) -> Polarity {
        self.kind.polarity()
    }

    /// True if this trait applies in a dungeon of the given theme.
    pub fn applies_in(&self, theme: Theme) -> bool {
        match self.condition {
            Some(required) => required == theme,
            None => true,
        }
    }
}

/// Whether any trait of `kind` applies in the given theme.
pub fn has_trait(traits: &[Trait], kind: TraitKind, theme: Theme) -> bool {
    traits.iter().any(|t| t.kind == kind && t.applies_in(theme))
}
