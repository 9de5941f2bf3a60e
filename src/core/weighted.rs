//! Weighted random selection shared by chest loot, monster loot and event branches.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weighted<T> {
    pub item: T,
    pub weight: f64,
}

impl<T> Weighted<T> {
    pub fn new(item: T, weight: f64) -> Self {
        Self { item, weight }
    }
}

pub fn total_weight<T>(entries: &[Weighted<T>]) -> f64 {
    entries.iter().map(|e| e.weight.max(0.0)).sum()
}

/// Picks one entry with probability proportional to its weight.
///
/// Cumulative scan against a uniform draw over the summed weight. Falls back to
/// the last entry if float rounding leaves the draw past the final boundary.
/// Returns None only for an empty table.
pub fn weighted_pick<'a, T>(entries: &'a [Weighted<T>], rng: &mut impl Rng) -> Option<&'a T> {
    let total = total_weight(entries);
    if entries.is_empty() {
        return None;
    }
    if total <= 0.0 {
        return entries.last().map(|e| &e.item);
    }
    scan(entries, rng.gen::<f64>() * total).or_else(|| entries.last().map(|e| &e.item))
}

/// Picks against a fixed total instead of the summed weight.
///
/// Weight the table does not claim is a "nothing" outcome, so a table summing
/// to 30 against a total of 100 returns None about 70% of the time. When the
/// table claims the whole total this behaves like [`weighted_pick`].
pub fn weighted_pick_from_total<'a, T>(
    entries: &'a [Weighted<T>],
    total: f64,
    rng: &mut impl Rng,
) -> Option<&'a T> {
    let claimed = total_weight(entries);
    if claimed >= total {
        return weighted_pick(entries, rng);
    }
    scan(entries, rng.gen::<f64>() * total)
}

fn scan<T>(entries: &[Weighted<T>], draw: f64) -> Option<&T> {
    let mut cumulative = 0.0;
    for entry in entries {
        cumulative += entry.weight.max(0.0);
        if draw < cumulative {
            return Some(&entry.item);
        }
    }
    None
}
