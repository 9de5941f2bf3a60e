//! Simulation report generation.

use crate::dungeon::types::RunOutcome;
use serde::Serialize;
use std::collections::BTreeMap;

/// What one simulated run ended with.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub outcome: Option<RunOutcome>,
    pub timed_out: bool,
    pub final_wave: u32,
    pub final_level: u32,
    pub turns: u32,
    pub actions: u64,
    pub victories: u32,
    pub flees: u32,
    pub items_found: u32,
    pub items_declined: u32,
    pub events_seen: u32,
}

/// Aggregated results from a batch of runs.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub map_id: String,
    pub num_runs: u32,
    pub runs_cleared: u32,
    pub runs_died: u32,
    pub runs_timed_out: u32,

    pub avg_final_wave: f64,
    pub avg_final_level: f64,
    pub avg_turns: f64,
    pub avg_victories: f64,
    pub avg_flees: f64,
    pub avg_items_found: f64,

    /// Runs that ended on each wave
    pub wave_distribution: BTreeMap<u32, u32>,

    #[serde(skip)]
    pub run_stats: Vec<RunStats>,
}

fn average(runs: &[RunStats], f: impl Fn(&RunStats) -> f64) -> f64 {
    if runs.is_empty() {
        return 0.0;
    }
    runs.iter().map(f).sum::<f64>() / runs.len() as f64
}

impl SimReport {
    pub fn from_runs(map_id: &str, runs: Vec<RunStats>) -> Self {
        let count = |o: RunOutcome| runs.iter().filter(|r| r.outcome == Some(o)).count() as u32;
        let runs_cleared = count(RunOutcome::Cleared);
        let runs_died = count(RunOutcome::Dead);
        let runs_timed_out = runs.iter().filter(|r| r.timed_out).count() as u32;

        let mut wave_distribution = BTreeMap::new();
        for run in &runs {
            *wave_distribution.entry(run.final_wave).or_insert(0) += 1;
        }

        Self {
            map_id: map_id.to_string(),
            num_runs: runs.len() as u32,
            runs_cleared,
            runs_died,
            runs_timed_out,
            avg_final_wave: average(&runs, |r| r.final_wave as f64),
            avg_final_level: average(&runs, |r| r.final_level as f64),
            avg_turns: average(&runs, |r| r.turns as f64),
            avg_victories: average(&runs, |r| r.victories as f64),
            avg_flees: average(&runs, |r| r.flees as f64),
            avg_items_found: average(&runs, |r| r.items_found as f64),
            wave_distribution,
            run_stats: runs,
        }
    }

    pub fn clear_rate(&self) -> f64 {
        if self.num_runs == 0 {
            return 0.0;
        }
        self.runs_cleared as f64 / self.num_runs as f64 * 100.0
    }

    /// Generate a text report.
    pub fn to_text(&self) -> String {
        let mut report = String::new();

        report.push_str("═══════════════════════════════════════════════════════════════\n");
        report.push_str("                    SIMULATION REPORT\n");
        report.push_str(&format!("                    map: {}\n", self.map_id));
        report.push_str("═══════════════════════════════════════════════════════════════\n\n");

        report.push_str(&format!(
            "Runs: {} total, {} cleared, {} died, {} timed out\n\n",
            self.num_runs, self.runs_cleared, self.runs_died, self.runs_timed_out
        ));

        report.push_str("── PROGRESSION ──────────────────────────────────────────────────\n");
        report.push_str(&format!("  Avg Final Wave:   {:.2}\n", self.avg_final_wave));
        report.push_str(&format!("  Avg Final Level:  {:.2}\n", self.avg_final_level));
        report.push_str(&format!("  Avg Turns:        {:.1}\n", self.avg_turns));
        report.push_str(&format!("  Avg Victories:    {:.1}\n", self.avg_victories));
        report.push_str(&format!("  Avg Flees:        {:.2}\n", self.avg_flees));
        report.push_str(&format!("  Avg Items Found:  {:.1}\n\n", self.avg_items_found));

        report.push_str("── WAVE REACHED ─────────────────────────────────────────────────\n");
        for (wave, reached) in &self.wave_distribution {
            let pct = if self.num_runs > 0 {
                *reached as f64 / self.num_runs as f64 * 100.0
            } else {
                0.0
            };
            let bar = "█".repeat((pct / 5.0) as usize);
            report.push_str(&format!("  Wave {:2}: {:>5.1}% {}\n", wave, pct, bar));
        }
        report.push('\n');

        report.push_str("── BALANCE ASSESSMENT ───────────────────────────────────────────\n");
        let clear_rate = self.clear_rate();
        let rating = if clear_rate > 90.0 {
            "TOO EASY - Almost every run clears"
        } else if clear_rate > 50.0 {
            "GOOD - Clearable with some losses"
        } else if clear_rate > 15.0 {
            "HARD - Most runs die"
        } else {
            "TOO HARD - Runs rarely clear"
        };
        report.push_str(&format!("  Clear Rate: {:.1}%\n", clear_rate));
        report.push_str(&format!("  Rating:     {}\n", rating));
        if self.runs_timed_out > 0 {
            report.push_str("  ⚠️  Some runs hit the action cap - stalled policy or loop?\n");
        }
        if self.avg_final_wave < 1.5 && self.runs_died > self.num_runs / 2 {
            report.push_str("  ⚠️  Most deaths on wave 1 - opening too hard?\n");
        }

        report.push_str("\n═══════════════════════════════════════════════════════════════\n");
        report
    }

    /// Generate a JSON report for further analysis.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
