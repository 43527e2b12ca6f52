//! Silo pool simulator.
//!
//! Replays a scripted sequence of deposits and harvests against an
//! in-memory pool and prints the resulting state as JSON.

mod sim;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use silo_core::constants::EMISSION_PERIOD_SECS;
use silo_core::emission::EmissionSchedule;

#[derive(Parser, Debug)]
#[command(name = "silo-sim", version, about = "Replay staking pool scripts against an in-memory ledger")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a simulation script.
    Run {
        /// Script path (TOML, JSON or YAML). Defaults to `<config dir>/silo/sim.toml`.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the emission rate over a number of decay periods.
    Emission {
        /// Reward per block at period zero.
        #[arg(long)]
        base: u128,
        /// Number of periods to print.
        #[arg(long, default_value_t = 12)]
        periods: u64,
    },
    /// Print the default script settings.
    Defaults,
}

#[derive(Serialize)]
struct RatePoint {
    period: u64,
    rate: u128,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    match cli.command {
        Command::Run { config } => {
            let path = config.unwrap_or_else(sim::default_config_path);
            info!(path = %path.display(), "loading script");
            let cfg = sim::load(&path)?;
            let report = sim::run(&cfg)?;
            println!("{}", serde_json::to_string_pretty(&report).context("failed to encode report")?);
        }
        Command::Emission { base, periods } => {
            let schedule = EmissionSchedule::default();
            let points: Vec<RatePoint> = (0..=periods)
                .map(|period| RatePoint {
                    period,
                    rate: schedule.current_rate(base, 0, period.saturating_mul(EMISSION_PERIOD_SECS)),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&points)?);
        }
        Command::Defaults => {
            println!("{}", serde_json::to_string_pretty(&sim::SimConfig::default())?);
        }
    }
    Ok(())
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` overrides `level_str` when set.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    // stdout carries the report
    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
