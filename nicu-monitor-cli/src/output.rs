// NICU Monitor CLI - Event output
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Rendering of monitor events for the terminal.

use chrono::{DateTime, Utc};
use nicu_monitor::{Alert, MonitorEvent, Sample};
use std::io::Write;
use tracing::{info, warn};

/// How events are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One line per vital sign, alerts through the log.
    Text,
    /// One JSON object per event.
    Json,
}

/// Write a single event. Output errors (e.g. a closed pipe) are ignored.
pub fn write_event(mode: OutputMode, event: &MonitorEvent) {
    match mode {
        OutputMode::Json => match event.to_json() {
            Ok(line) => {
                let _ = writeln!(std::io::stdout().lock(), "{}", line);
            }
            Err(e) => warn!("Failed to serialize event: {}", e),
        },
        OutputMode::Text => match event {
            MonitorEvent::Vital { sample } => {
                let _ = writeln!(std::io::stdout().lock(), "{}", format_sample(sample));
            }
            MonitorEvent::Alert { alert } => log_alert(alert),
            MonitorEvent::Connection { status } => info!("Connection {}", status.as_str()),
        },
    }
}

fn log_alert(alert: &Alert) {
    if alert.is_critical() {
        warn!(
            severity = alert.severity.as_str(),
            category = alert.category.as_str(),
            "{}",
            alert.message
        );
    } else {
        info!(
            severity = alert.severity.as_str(),
            category = alert.category.as_str(),
            "{}",
            alert.message
        );
    }
}

pub fn format_sample(sample: &Sample) -> String {
    format!(
        "{} {:<24} {:>7.1} {}",
        format_time(sample.recorded_at()),
        sample.channel.label(),
        sample.value,
        sample.unit
    )
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| "--:--:--.---".to_string())
}
