// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Alert types raised by the threshold engine.

use crate::channel::VitalChannel;
use crate::threshold::{RuleKind, ThresholdRule};
use serde::{Deserialize, Serialize};

/// Severity level of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Warning => "WARN",
            AlertSeverity::Critical => "CRIT",
        }
    }

    pub fn for_rule(kind: RuleKind) -> Self {
        if kind.is_critical() {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        }
    }
}

/// Clinical category, derived from the channel and the side of the breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Bradycardia,
    Tachycardia,
    Desaturation,
    Hyperoxia,
    Bradypnea,
    Tachypnea,
    Hypothermia,
    Hyperthermia,
    Hypotension,
    Hypertension,
}

impl AlertCategory {
    pub fn from_rule(channel: VitalChannel, kind: RuleKind) -> Self {
        let low = kind.is_low_side();
        match channel {
            VitalChannel::HeartRate if low => AlertCategory::Bradycardia,
            VitalChannel::HeartRate => AlertCategory::Tachycardia,
            VitalChannel::Spo2 if low => AlertCategory::Desaturation,
            VitalChannel::Spo2 => AlertCategory::Hyperoxia,
            VitalChannel::RespiratoryRate if low => AlertCategory::Bradypnea,
            VitalChannel::RespiratoryRate => AlertCategory::Tachypnea,
            VitalChannel::Temperature if low => AlertCategory::Hypothermia,
            VitalChannel::Temperature => AlertCategory::Hyperthermia,
            VitalChannel::SystolicBp | VitalChannel::DiastolicBp if low => {
                AlertCategory::Hypotension
            }
            VitalChannel::SystolicBp | VitalChannel::DiastolicBp => AlertCategory::Hypertension,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Bradycardia => "BRADYCARDIA",
            AlertCategory::Tachycardia => "TACHYCARDIA",
            AlertCategory::Desaturation => "DESATURATION",
            AlertCategory::Hyperoxia => "HYPEROXIA",
            AlertCategory::Bradypnea => "BRADYPNEA",
            AlertCategory::Tachypnea => "TACHYPNEA",
            AlertCategory::Hypothermia => "HYPOTHERMIA",
            AlertCategory::Hyperthermia => "HYPERTHERMIA",
            AlertCategory::Hypotension => "HYPOTENSION",
            AlertCategory::Hypertension => "HYPERTENSION",
        }
    }
}

/// A fired threshold alert. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub channel: VitalChannel,
    pub rule: RuleKind,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub message: String,
    /// Value of the sample that completed the violation.
    pub value: f64,
    /// Boundary that was breached.
    pub threshold: f64,
    /// Unix epoch milliseconds.
    pub timestamp_ms: u64,
}

impl Alert {
    /// Build an alert for `rule` breached by `value`.
    pub fn from_rule(rule: &ThresholdRule, value: f64, timestamp_ms: u64) -> Self {
        let severity = AlertSeverity::for_rule(rule.kind);
        let direction = if rule.kind.is_low_side() {
            "low"
        } else {
            "high"
        };
        let qualifier = if rule.kind.is_critical() {
            "critically "
        } else {
            ""
        };
        let unit = rule.channel.unit();
        let message = format!(
            "{} {}{}: {:.1} {} (limit {:.1} {} for {}s)",
            rule.channel.label(),
            qualifier,
            direction,
            value,
            unit,
            rule.value,
            unit,
            rule.duration_secs
        );

        Self {
            channel: rule.channel,
            rule: rule.kind,
            category: AlertCategory::from_rule(rule.channel, rule.kind),
            severity,
            message,
            value,
            threshold: rule.value,
            timestamp_ms,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity == AlertSeverity::Critical
    }

    #[cfg(feature = "timestamps")]
    pub fn raised_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp_ms as i64)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
