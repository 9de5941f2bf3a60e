// Character stats
pub const NUM_STATS: usize = 6;
pub const BASE_HP: u32 = 50;
pub const HP_PER_VIT: u32 = 5;
pub const BASE_MAX_SANITY: u32 = 100;
pub const RECRUIT_STAT_MIN: u32 = 3;
pub const RECRUIT_STAT_MAX: u32 = 8;
pub const FRAIL_HP_PENALTY: u32 = 5;

// Leveling
pub const STAT_POINTS_PER_LEVEL: u32 = 3;
pub const VIT_ALLOCATION_HP: u32 = 5;
/// EXP required to leave level N lives at index N-1. Clamped to the last entry.
pub const EXP_TABLE: [u32; 10] = [10, 25, 45, 70, 100, 140, 190, 250, 320, 400];

// ATB scheduling
pub const ATB_TICK_BUDGET: f64 = 100.0;
pub const ATB_READY_EPSILON: f64 = 0.001;
pub const INITIATIVE_TRAIT_SPD: u32 = 3;
pub const INITIATIVE_HEAD_START: f64 = 0.3;

// Player attack
pub const UNARMED_ATK_BONUS: u32 = 5;
pub const UNARMED_DMG_MIN_BONUS: u32 = 1;
pub const UNARMED_DMG_MAX_BONUS: u32 = 3;
pub const BASE_HIT_CHANCE: i32 = 50;
pub const HIT_PER_DEX: i32 = 2;
pub const HIT_CHANCE_MIN: i32 = 5;
pub const HIT_CHANCE_MAX: i32 = 95;
pub const EAGLE_EYE_HIT_BONUS: i32 = 5;
pub const EXPERT_HIT_BONUS: i32 = 10;
pub const EXPERT_EVASION_BONUS: i32 = 5;

// Monster attack
pub const EVASION_PER_AGI: i32 = 2;
pub const MONSTER_CRIT_MULTIPLIER: f64 = 1.5;
pub const POISON_THORNS_BASE: u32 = 3;
pub const SPLIT_HEAL_AMOUNT: u32 = 5;
pub const SUMMON_CHANCE: f64 = 0.30;
pub const SUMMON_CAP: usize = 3;
pub const POISON_APPLY_CHANCE: f64 = 0.30;
pub const ENTANGLE_CHANCE: f64 = 0.25;

// Flee
pub const FLEE_BASE_CHANCE: i32 = 40;
pub const FLEE_PER_SPD: i32 = 5;
pub const FLEE_CLUMSY_PENALTY: i32 = 10;
pub const FLEE_CHANCE_MIN: i32 = 5;
pub const FLEE_CHANCE_MAX: i32 = 90;

// Monster level scaling (per level above template level)
pub const MONSTER_HP_PER_LEVEL: f64 = 0.15;
pub const MONSTER_ATK_PER_LEVEL: f64 = 0.10;
pub const MONSTER_EVA_PER_LEVEL: u32 = 1;
pub const MONSTER_EVA_CAP: u32 = 80;
pub const MONSTER_DEF_PER_LEVEL: f64 = 0.5;
pub const MONSTER_EXP_PER_LEVEL: u32 = 2;

// Status effects (legacy fixed-damage ticks)
pub const POISON_TICK_DAMAGE: u32 = 3;
pub const BURN_TICK_DAMAGE: u32 = 5;
pub const POISON_DURATION: u32 = 3;
pub const BURN_DURATION: u32 = 3;
pub const TORCH_DURATION: u32 = 10;

// Movement and sanity
pub const SANITY_COST_PER_MOVE: u32 = 2;
pub const COWARD_SANITY_PCT: u32 = 30;
pub const PHOBIA_SANITY_PCT: u32 = 50;
pub const TORCH_VIEW_BONUS: usize = 2;

// Loot
/// Monster loot tables roll against this total; unclaimed weight means no drop.
pub const MONSTER_LOOT_TOTAL: f64 = 100.0;
pub const LUCKY_CHEST_BONUS_CHANCE: f64 = 0.25;

// Combat log
pub const COMBAT_LOG_CAPACITY: usize = 50;
pub const RUN_LOG_CAPACITY: usize = 100;

// Persistence
pub const SAVE_VERSION_MAGIC: u64 = 0x5741_4E44_4552_0001;
pub const SNAPSHOT_VERSION: u32 = 1;
