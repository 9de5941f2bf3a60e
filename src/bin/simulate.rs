//! Dungeon balance simulator CLI.
//!
//! Usage:
//!   cargo run --bin simulate -- [OPTIONS]
//!
//! Examples:
//!   cargo run --bin simulate                          # 1000 runs of whispering_woods
//!   cargo run --bin simulate -- -n 100 -m hollow_crypt
//!   cargo run --bin simulate -- --seed 42             # Reproducible batch
//!   RUST_LOG=wander=debug cargo run --bin simulate -- -n 1 -v

use std::env;
use tracing_subscriber::EnvFilter;
use wander::dungeon::maps::all_maps;
use wander::simulator::{run_simulation, SimConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wander=info")),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().collect();
    let config = parse_args(&args);

    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║              WANDER BALANCE SIMULATOR                         ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Configuration:");
    println!("  Runs:           {}", config.num_runs);
    println!("  Map:            {}", config.map_id);
    println!("  Max Actions:    {}", config.max_actions_per_run);
    println!("  Flee Below:     {}% HP", config.flee_below_hp_pct);
    println!("  Heal Below:     {}% HP", config.heal_below_hp_pct);
    if let Some(seed) = config.seed {
        println!("  Seed:           {}", seed);
    }
    println!();
    println!("Running simulation...");
    println!();

    let report = run_simulation(&config);
    println!("{}", report.to_text());

    if args.iter().any(|a| a == "--json") {
        let filename = format!(
            "sim_report_{}_{}.json",
            config.map_id,
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        );
        match std::fs::write(&filename, report.to_json()) {
            Ok(()) => println!("JSON report saved to: {}", filename),
            Err(e) => {
                tracing::error!(error = %e, file = %filename, "failed to write JSON report");
                std::process::exit(1);
            }
        }
    }
}

fn parse_args(args: &[String]) -> SimConfig {
    let mut config = SimConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-n" | "--runs" => {
                if i + 1 < args.len() {
                    config.num_runs = args[i + 1].parse().unwrap_or(1000);
                    i += 1;
                }
            }
            "-m" | "--map" => {
                if i + 1 < args.len() {
                    config.map_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "-s" | "--seed" => {
                if i + 1 < args.len() {
                    config.seed = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "-a" | "--actions" => {
                if i + 1 < args.len() {
                    config.max_actions_per_run = args[i + 1].parse().unwrap_or(5_000);
                    i += 1;
                }
            }
            "--flee-below" => {
                if i + 1 < args.len() {
                    config.flee_below_hp_pct = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--heal-below" => {
                if i + 1 < args.len() {
                    config.heal_below_hp_pct = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--no-flee" => {
                config.flee_below_hp_pct = 0;
            }
            "-v" | "--verbose" => {
                config.verbosity = 2;
            }
            "-vv" => {
                config.verbosity = 3;
            }
            "--quick" => {
                config = SimConfig::quick(&config.map_id);
            }
            "--list-maps" => {
                for map in all_maps() {
                    println!(
                        "{:<18} {:<7} waves {}  base level {}",
                        map.id,
                        map.theme.key(),
                        map.max_wave,
                        map.base_level
                    );
                }
                std::process::exit(0);
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

fn print_help() {
    println!("Wander Balance Simulator");
    println!();
    println!("USAGE:");
    println!("    cargo run --bin simulate -- [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -n, --runs <N>        Number of runs (default: 1000)");
    println!("    -m, --map <ID>        Map to play (default: whispering_woods)");
    println!("    -s, --seed <S>        Random seed for reproducibility");
    println!("    -a, --actions <A>     Max decisions per run (default: 5000)");
    println!("    --flee-below <PCT>    Flee under this HP percentage (default: 20)");
    println!("    --heal-below <PCT>    Drink potions under this HP percentage (default: 40)");
    println!("    --no-flee             Never flee");
    println!("    --quick               Quick test (100 runs)");
    println!("    --list-maps           List available maps");
    println!("    -v, --verbose         Log every run");
    println!("    -vv                   Also print each run log");
    println!("    --json                Save JSON report");
    println!("    -h, --help            Show this help");
}
