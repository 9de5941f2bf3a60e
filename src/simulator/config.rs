//! Simulation configuration.

/// Configuration for a simulation batch.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of runs to play
    pub num_runs: u32,

    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,

    /// Map every run enters
    pub map_id: String,

    /// Player decisions per run before it is abandoned as timed out
    pub max_actions_per_run: u64,

    /// Flee when HP falls below this percentage of max
    pub flee_below_hp_pct: u32,

    /// Drink a potion between moves below this percentage of max HP
    pub heal_below_hp_pct: u32,

    /// Log verbosity (0 = silent, 1 = summary, 2 = per run, 3 = run logs)
    pub verbosity: u8,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_runs: 1000,
            seed: None,
            map_id: "whispering_woods".to_string(),
            max_actions_per_run: 5_000,
            flee_below_hp_pct: 20,
            heal_below_hp_pct: 40,
            verbosity: 1,
        }
    }
}

impl SimConfig {
    /// Small batch for a quick balance read on one map
    pub fn quick(map_id: &str) -> Self {
        Self {
            num_runs: 100,
            map_id: map_id.to_string(),
            ..Default::default()
        }
    }

    /// A policy that never runs away
    pub fn no_flee(map_id: &str) -> Self {
        Self {
            map_id: map_id.to_string(),
            flee_below_hp_pct: 0,
            ..Default::default()
        }
    }
}
