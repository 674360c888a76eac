//! fitobserve - activity monitoring demo
//!
//! Wires one activity source to a storage sink and a display sink, runs a
//! number of delivery cycles and prints a JSON summary of what was stored.
//!
//! # Usage
//! ```sh
//! cargo run -- --user-name Alice --activity walking --cycles 3
//! OBSERVABILITY_LOG_FORMAT=json cargo run -- --sensor --seed 7
//! ```
//!
//! # Environment Variables
//! - `OBSERVER_DUPLICATE_POLICY` - `allow` or `reject` (default: allow)
//! - `OBSERVER_DETACH_POLICY` - `strict` or `lenient` (default: strict)
//! - `OBSERVABILITY_ENABLED` - print prometheus metrics at exit (default: true)
//! - `OBSERVABILITY_LOG_FORMAT` - `pretty` or `json` (default: pretty)

use anyhow::Result;
use clap::Parser;
use fitobserve::application::activities::{FixedActivity, SensorActivity};
use fitobserve::application::monitoring::ActivityMonitor;
use fitobserve::config::{Config, LogFormat};
use fitobserve::domain::activity::{ActivityKind, User};
use fitobserve::domain::ports::Producer;
use fitobserve::infrastructure::observability::SourceMetrics;
use fitobserve::infrastructure::{DisplaySink, ObservableSource, StorageSink};
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Activity monitoring demo", long_about = None)]
struct Cli {
    /// Identifier of the monitored user
    #[arg(long, default_value = "1")]
    user_id: u64,

    /// Name of the monitored user
    #[arg(long, default_value = "Alice")]
    user_name: String,

    /// Activity to monitor (walking, running, swimming, cycling)
    #[arg(short, long, default_value = "walking")]
    activity: ActivityKind,

    /// Number of delivery cycles to run
    #[arg(short, long, default_value = "1")]
    cycles: u32,

    /// Read from a simulated sensor instead of fixed readings
    #[arg(long)]
    sensor: bool,

    /// Seed for the simulated sensor
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into());
    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false).pretty())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false).json())
            .init(),
    }

    info!("fitobserve {} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: duplicates={:?}, detach={:?}",
        config.duplicate_policy, config.detach_policy
    );

    let user = User::new(cli.user_id, &cli.user_name);

    if cli.sensor {
        let sensor = match cli.seed {
            Some(seed) => SensorActivity::seeded(cli.activity, &user, seed),
            None => SensorActivity::new(cli.activity, &user),
        };
        run_session(&config, user, sensor, cli.cycles)
    } else {
        let fixed = FixedActivity::new(cli.activity, &user);
        run_session(&config, user, fixed, cli.cycles)
    }
}

fn run_session<P: Producer>(config: &Config, user: User, producer: P, cycles: u32) -> Result<()> {
    let metrics = SourceMetrics::new()?;
    let source =
        ObservableSource::with_config(producer, config.source_config()).with_metrics(metrics.clone());

    let monitor = ActivityMonitor::new(
        user,
        Arc::new(StorageSink::new()),
        Arc::new(DisplaySink::new()),
    );

    let mut failed_cycles = 0u32;
    for cycle in 1..=cycles {
        match monitor.monitor(&source) {
            Ok(report) if report.is_clean() => {}
            Ok(report) => warn!(
                "Cycle {}: {} observer(s) failed",
                cycle,
                report.failures.len()
            ),
            Err(e) => {
                warn!("Cycle {}: {:#}", cycle, e);
                failed_cycles += 1;
            }
        }
    }
    monitor.release(&source)?;

    let summary = serde_json::json!({
        "user": monitor.user(),
        "activity": source.producer().name(),
        "cycles": cycles,
        "failed_cycles": failed_cycles,
        "history": monitor.history(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if config.observability_enabled {
        print!("{}", metrics.render());
    }

    info!("Session complete.");
    Ok(())
}
