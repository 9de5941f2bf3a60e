//! Wanderers: attributes, traits, status effects and sanity tiers.

#![allow(unused_imports)]

pub mod attributes;
pub mod sanity;
pub mod status;
pub mod traits;
pub mod wanderer;

pub use attributes::*;
pub use sanity::{sanity_modifiers, SanityModifiers, SanityTier};
pub use status::{StatusEffect, StatusEffectSet, StatusKind};
pub use traits::{Trait, TraitKind};
pub use wanderer::{recruit, Wanderer};
