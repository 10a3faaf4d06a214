// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Threshold rules and the per-channel rule table.

use crate::channel::VitalChannel;
use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Boundary kind of a rule.
///
/// Declaration order is evaluation precedence: critical bounds first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    CriticalLow,
    CriticalHigh,
    Low,
    High,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::CriticalLow => "critical_low",
            RuleKind::CriticalHigh => "critical_high",
            RuleKind::Low => "low",
            RuleKind::High => "high",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, RuleKind::CriticalLow | RuleKind::CriticalHigh)
    }

    /// True for rules that fire below their boundary.
    pub fn is_low_side(&self) -> bool {
        matches!(self, RuleKind::CriticalLow | RuleKind::Low)
    }

    /// Whether `value` breaches a boundary of this kind.
    pub fn is_violated(&self, value: f64, boundary: f64) -> bool {
        if self.is_low_side() {
            value < boundary
        } else {
            value > boundary
        }
    }
}

/// One threshold rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub channel: VitalChannel,
    pub kind: RuleKind,
    /// Boundary value in the channel's unit.
    pub value: f64,
    /// Minimum continuous violation before the rule fires (seconds).
    pub duration_secs: f64,
}

impl ThresholdRule {
    pub fn new(channel: VitalChannel, kind: RuleKind, value: f64, duration_secs: f64) -> Self {
        Self {
            channel,
            kind,
            value,
            duration_secs,
        }
    }

    pub fn is_violated(&self, value: f64) -> bool {
        self.kind.is_violated(value, self.value)
    }

    /// Consecutive ticks needed to satisfy the duration at `interval_ms`.
    ///
    /// Never less than one.
    pub fn required_ticks(&self, interval_ms: u64) -> u32 {
        let interval_ms = interval_ms.max(1) as f64;
        let ticks = (self.duration_secs * 1000.0 / interval_ms).ceil();
        (ticks as u32).max(1)
    }
}

/// Static rule set, ordered by channel then precedence.
///
/// Serialized as a bare array of rules; deserialization goes through
/// [`ThresholdTable::new`] validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ThresholdRule>", into = "Vec<ThresholdRule>")]
pub struct ThresholdTable {
    rules: Vec<ThresholdRule>,
}

impl ThresholdTable {
    /// Build a table. Rejects duplicate `(channel, kind)` pairs and
    /// non-finite values or durations.
    pub fn new(mut rules: Vec<ThresholdRule>) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !rule.value.is_finite() {
                return Err(MonitorError::InvalidConfig(format!(
                    "{} {} boundary is not finite",
                    rule.channel,
                    rule.kind.as_str()
                )));
            }
            if !rule.duration_secs.is_finite() || rule.duration_secs < 0.0 {
                return Err(MonitorError::InvalidConfig(format!(
                    "{} {} duration must be a non-negative number",
                    rule.channel,
                    rule.kind.as_str()
                )));
            }
            if !seen.insert((rule.channel, rule.kind)) {
                return Err(MonitorError::InvalidConfig(format!(
                    "duplicate rule {} {}",
                    rule.channel,
                    rule.kind.as_str()
                )));
            }
        }
        rules.sort_by_key(|rule| (rule.channel, rule.kind));
        Ok(Self { rules })
    }

    /// Default neonatal alarm limits.
    pub fn neonatal() -> Self {
        use RuleKind::*;
        use VitalChannel::*;

        let rules = vec![
            ThresholdRule::new(HeartRate, CriticalLow, 80.0, 5.0),
            ThresholdRule::new(HeartRate, Low, 100.0, 10.0),
            ThresholdRule::new(HeartRate, High, 180.0, 10.0),
            ThresholdRule::new(HeartRate, CriticalHigh, 200.0, 5.0),
            ThresholdRule::new(Spo2, CriticalLow, 80.0, 5.0),
            ThresholdRule::new(Spo2, Low, 88.0, 10.0),
            ThresholdRule::new(Spo2, High, 99.5, 30.0),
            ThresholdRule::new(RespiratoryRate, CriticalLow, 20.0, 10.0),
            ThresholdRule::new(RespiratoryRate, Low, 30.0, 15.0),
            ThresholdRule::new(RespiratoryRate, High, 70.0, 15.0),
            ThresholdRule::new(RespiratoryRate, CriticalHigh, 80.0, 10.0),
            ThresholdRule::new(Temperature, CriticalLow, 35.5, 30.0),
            ThresholdRule::new(Temperature, Low, 36.3, 60.0),
            ThresholdRule::new(Temperature, High, 37.5, 60.0),
            ThresholdRule::new(Temperature, CriticalHigh, 38.0, 30.0),
            ThresholdRule::new(SystolicBp, CriticalLow, 40.0, 10.0),
            ThresholdRule::new(SystolicBp, Low, 50.0, 15.0),
            ThresholdRule::new(SystolicBp, High, 90.0, 15.0),
            ThresholdRule::new(SystolicBp, CriticalHigh, 100.0, 10.0),
            ThresholdRule::new(DiastolicBp, CriticalLow, 20.0, 10.0),
            ThresholdRule::new(DiastolicBp, Low, 28.0, 15.0),
            ThresholdRule::new(DiastolicBp, High, 60.0, 15.0),
            ThresholdRule::new(DiastolicBp, CriticalHigh, 70.0, 10.0),
        ];
        let mut table = Self { rules };
        table.rules.sort_by_key(|rule| (rule.channel, rule.kind));
        table
    }

    /// Rules for a channel in precedence order.
    pub fn rules_for(&self, channel: VitalChannel) -> impl Iterator<Item = &ThresholdRule> + '_ {
        self.rules.iter().filter(move |rule| rule.channel == channel)
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parse a JSON array of rules.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl TryFrom<Vec<ThresholdRule>> for ThresholdTable {
    type Error = MonitorError;

    fn try_from(rules: Vec<ThresholdRule>) -> Result<Self> {
        Self::new(rules)
    }
}

impl From<ThresholdTable> for Vec<ThresholdRule> {
    fn from(table: ThresholdTable) -> Self {
        table.rules
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::neonatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_order() {
        let table = ThresholdTable::neonatal();
        let kinds: Vec<RuleKind> = table
            .rules_for(VitalChannel::HeartRate)
            .map(|r| r.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                RuleKind::CriticalLow,
                RuleKind::CriticalHigh,
                RuleKind::Low,
                RuleKind::High
            ]
        );
    }

    #[test]
    fn test_violation_direction() {
        let low = ThresholdRule::new(VitalChannel::HeartRate, RuleKind::Low, 100.0, 10.0);
        assert!(low.is_violated(99.9));
        assert!(!low.is_violated(100.0));

        let high = ThresholdRule::new(VitalChannel::HeartRate, RuleKind::High, 180.0, 10.0);
        assert!(high.is_violated(180.1));
        assert!(!high.is_violated(180.0));
    }

    #[test]
    fn test_required_ticks() {
        let rule = ThresholdRule::new(VitalChannel::HeartRate, RuleKind::Low, 100.0, 10.0);
        assert_eq!(rule.required_ticks(1000), 10);
        assert_eq!(rule.required_ticks(3000), 4);
        assert_eq!(rule.required_ticks(250), 40);

        let instant = ThresholdRule::new(VitalChannel::HeartRate, RuleKind::Low, 100.0, 0.0);
        assert_eq!(instant.required_ticks(1000), 1);
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let rules = vec![
            ThresholdRule::new(VitalChannel::Spo2, RuleKind::Low, 88.0, 10.0),
            ThresholdRule::new(VitalChannel::Spo2, RuleKind::Low, 85.0, 5.0),
        ];
        assert!(matches!(
            ThresholdTable::new(rules),
            Err(MonitorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let rules = vec![ThresholdRule::new(
            VitalChannel::Spo2,
            RuleKind::Low,
            88.0,
            -1.0,
        )];
        assert!(ThresholdTable::new(rules).is_err());
    }

    #[test]
    fn test_json_rules() {
        let json = r#"[
            {"channel": "spo2", "kind": "low", "value": 90.0, "duration_secs": 5.0},
            {"channel": "spo2", "kind": "critical_low", "value": 82.0, "duration_secs": 2.0}
        ]"#;
        let table = ThresholdTable::from_json(json).unwrap();
        assert_eq!(table.len(), 2);
        let first = table.rules_for(VitalChannel::Spo2).next().unwrap();
        assert_eq!(first.kind, RuleKind::CriticalLow);
    }

    #[test]
    fn test_json_matches_to_json_shape() {
        let table = ThresholdTable::neonatal();
        let json = table.to_json().unwrap();
        assert!(json.trim_start().starts_with('['));
        assert_eq!(ThresholdTable::from_json(&json).unwrap(), table);
    }

    #[test]
    fn test_json_duplicate_rejected() {
        let json = r#"[
            {"channel": "heart_rate", "kind": "low", "value": 100.0, "duration_secs": 10.0},
            {"channel": "heart_rate", "kind": "low", "value": 95.0, "duration_secs": 10.0}
        ]"#;
        assert!(matches!(
            ThresholdTable::from_json(json),
            Err(MonitorError::Serialization(msg)) if msg.contains("duplicate")
        ));

        let nested: std::result::Result<Vec<ThresholdTable>, _> = serde_json::from_str(
            r#"[[{"channel": "spo2", "kind": "low", "value": 90.0, "duration_secs": -1.0}]]"#,
        );
        assert!(nested.is_err());
    }
}
