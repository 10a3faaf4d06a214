// NICU Monitor CLI - Command-line runner for the simulated monitor stream
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # NICU Monitor CLI
//!
//! Streams simulated neonatal vital signs for one patient and reports
//! threshold alerts.
//!
//! ## Usage
//!
//! ```bash
//! # One minute of telemetry, reproducible
//! nicu-monitor --patient baby-42 --duration 60 --seed 7
//!
//! # JSON event lines with custom rules and a forced bradycardia
//! nicu-monitor --json --thresholds rules.json --trigger bradycardia
//! ```

mod output;

use clap::{Parser, ValueEnum};
use nicu_monitor::{
    ClinicalEventKind, ConfigUpdate, MonitorConfig, MonitorError, MonitorStream, ThresholdTable,
};
use output::{write_event, OutputMode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
enum CliError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Signal handling failed: {0}")]
    Signal(std::io::Error),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EventArg {
    Bradycardia,
    Desaturation,
}

impl From<EventArg> for ClinicalEventKind {
    fn from(arg: EventArg) -> Self {
        match arg {
            EventArg::Bradycardia => ClinicalEventKind::Bradycardia,
            EventArg::Desaturation => ClinicalEventKind::Desaturation,
        }
    }
}

/// Simulated neonatal bedside monitor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Patient identifier
    #[arg(short, long, default_value = "demo-patient")]
    patient: String,

    /// Seconds to stream before disconnecting (0 = until Ctrl-C)
    #[arg(short, long, default_value = "30")]
    duration: u64,

    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON array of threshold rules replacing the neonatal defaults
    #[arg(short, long)]
    thresholds: Option<PathBuf>,

    /// Tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Samples kept per channel
    #[arg(long)]
    capacity: Option<usize>,

    /// Alert cooldown in milliseconds
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Disable threshold alerting
    #[arg(long)]
    no_alerts: bool,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Start a clinical event right after connecting
    #[arg(long, value_enum)]
    trigger: Option<EventArg>,

    /// Length of the triggered event in seconds
    #[arg(long, default_value = "15")]
    trigger_secs: u64,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn config_update(&self) -> ConfigUpdate {
        ConfigUpdate {
            tick_interval_ms: self.tick_ms,
            buffer_capacity: self.capacity,
            alerts_enabled: self.no_alerts.then_some(false),
            cooldown_ms: self.cooldown_ms,
            simulator: None,
        }
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config(args: &Args) -> Result<MonitorConfig, CliError> {
    let base = match &args.config {
        Some(path) => MonitorConfig::from_json(&read_file(path)?)?,
        None => MonitorConfig::default(),
    };
    let config = base.merged(&args.config_update());
    config.validate()?;
    Ok(config)
}

async fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(&args)?;
    info!(
        "Tick {}ms, {} samples per channel, alerts {}",
        config.tick_interval_ms,
        config.buffer_capacity,
        if config.alerts_enabled { "on" } else { "off" }
    );

    let stream = match args.seed {
        Some(seed) => MonitorStream::seeded(config, seed)?,
        None => MonitorStream::new(config)?,
    };

    if let Some(path) = &args.thresholds {
        let table = ThresholdTable::from_json(&read_file(path)?)?;
        info!("Loaded {} threshold rules from {}", table.len(), path.display());
        stream.set_thresholds(table);
    }

    let mode = if args.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    stream.subscribe(move |event| write_event(mode, event));

    stream.connect(&args.patient)?;

    if let Some(kind) = args.trigger {
        let kind = ClinicalEventKind::from(kind);
        if stream.trigger_event(kind, Duration::from_secs(args.trigger_secs)) {
            info!("Triggered {} for {}s", kind.as_str(), args.trigger_secs);
        }
    }

    if args.duration == 0 {
        tokio::signal::ctrl_c().await.map_err(CliError::Signal)?;
    } else {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(args.duration)) => {}
            result = tokio::signal::ctrl_c() => result.map_err(CliError::Signal)?,
        }
    }

    stream.disconnect();

    let stats = stream.stats();
    info!(
        "Session finished: {} ticks, {} samples, {} alerts, {} subscriber failures",
        stats.ticks, stats.samples, stats.alerts, stats.subscriber_failures
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("NICU Monitor v{}", nicu_monitor::VERSION);

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
