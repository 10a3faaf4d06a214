// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Threshold engine: duration-qualified, cooldown-gated alerting.

use crate::alert::Alert;
use crate::channel::VitalChannel;
use crate::sample::Sample;
use crate::threshold::{RuleKind, ThresholdTable};
use log::info;
use std::collections::HashMap;

/// Compound key for violation and cooldown tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViolationKey {
    pub channel: VitalChannel,
    pub kind: RuleKind,
}

impl ViolationKey {
    pub fn new(channel: VitalChannel, kind: RuleKind) -> Self {
        Self { channel, kind }
    }
}

/// A rule that is currently being violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViolationState {
    /// Timestamp of the first violating sample.
    pub started_ms: u64,
    /// Consecutive violating ticks.
    pub ticks: u32,
}

/// Tracks consecutive violations per rule and fires alerts.
#[derive(Debug, Clone)]
pub struct ThresholdEngine {
    table: ThresholdTable,
    /// Present only while a rule is continuously violated.
    violations: HashMap<ViolationKey, ViolationState>,
    /// Last alert emission time, for cooldown.
    last_alert_ms: HashMap<ViolationKey, u64>,
}

impl ThresholdEngine {
    pub fn new(table: ThresholdTable) -> Self {
        Self {
            table,
            violations: HashMap::new(),
            last_alert_ms: HashMap::new(),
        }
    }

    /// Evaluate one sample against the channel's rules.
    ///
    /// `interval_ms` converts rule durations into tick counts. Returns the
    /// alerts to emit, at most one per rule.
    pub fn evaluate(&mut self, sample: &Sample, interval_ms: u64, cooldown_ms: u64) -> Vec<Alert> {
        let mut alerts = Vec::new();
        let now_ms = sample.timestamp_ms;

        // Set when a critical rule on that side is violated by this sample.
        let mut critical_low = false;
        let mut critical_high = false;

        for rule in self.table.rules_for(sample.channel) {
            let key = ViolationKey::new(sample.channel, rule.kind);

            if !rule.is_violated(sample.value) {
                self.violations.remove(&key);
                continue;
            }

            let escalated = match rule.kind {
                RuleKind::CriticalLow => {
                    critical_low = true;
                    false
                }
                RuleKind::CriticalHigh => {
                    critical_high = true;
                    false
                }
                RuleKind::Low => critical_low,
                RuleKind::High => critical_high,
            };

            let state = self.violations.entry(key).or_insert(ViolationState {
                started_ms: now_ms,
                ticks: 0,
            });
            state.ticks = state.ticks.saturating_add(1);

            if escalated || state.ticks < rule.required_ticks(interval_ms) {
                continue;
            }

            let cooled_down = match self.last_alert_ms.get(&key) {
                Some(&last_ms) => now_ms.saturating_sub(last_ms) >= cooldown_ms,
                None => true,
            };
            if !cooled_down {
                continue;
            }

            self.violations.remove(&key);
            self.last_alert_ms.insert(key, now_ms);

            let alert = Alert::from_rule(rule, sample.value, now_ms);
            info!("[{}] {}", alert.severity.as_str(), alert.message);
            alerts.push(alert);
        }

        alerts
    }

    /// Current violation state for a rule.
    pub fn violation(&self, channel: VitalChannel, kind: RuleKind) -> Option<ViolationState> {
        self.violations
            .get(&ViolationKey::new(channel, kind))
            .copied()
    }

    /// Timestamp of the last alert fired for a rule.
    pub fn last_alert_ms(&self, channel: VitalChannel, kind: RuleKind) -> Option<u64> {
        self.last_alert_ms
            .get(&ViolationKey::new(channel, kind))
            .copied()
    }

    pub fn active_violations(&self) -> usize {
        self.violations.len()
    }

    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    /// Swap the rule table. Tracking state is dropped.
    pub fn set_table(&mut self, table: ThresholdTable) {
        self.table = table;
        self.reset();
    }

    /// Drop in-progress violations. Cooldowns are kept.
    pub fn clear_violations(&mut self) {
        self.violations.clear();
    }

    /// Clear violations and cooldowns.
    pub fn reset(&mut self) {
        self.violations.clear();
        self.last_alert_ms.clear();
    }
}

impl Default for ThresholdEngine {
    fn default() -> Self {
        Self::new(ThresholdTable::neonatal())
    }
}
