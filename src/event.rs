// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Events fanned out to stream subscribers.

use crate::alert::Alert;
use crate::sample::Sample;
use serde::{Deserialize, Serialize};

/// Connection state of a monitor stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    #[default]
    Disconnected,
    /// Switching patients: torn down, not yet connected again.
    Reconnecting,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Reconnecting => "reconnecting",
        }
    }
}

/// Tagged event delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MonitorEvent {
    Vital { sample: Sample },
    Alert { alert: Alert },
    Connection { status: ConnectionStatus },
}

impl MonitorEvent {
    pub fn vital(sample: Sample) -> Self {
        MonitorEvent::Vital { sample }
    }

    pub fn alert(alert: Alert) -> Self {
        MonitorEvent::Alert { alert }
    }

    pub fn connection(status: ConnectionStatus) -> Self {
        MonitorEvent::Connection { status }
    }

    pub fn as_sample(&self) -> Option<&Sample> {
        match self {
            MonitorEvent::Vital { sample } => Some(sample),
            _ => None,
        }
    }

    pub fn as_alert(&self) -> Option<&Alert> {
        match self {
            MonitorEvent::Alert { alert } => Some(alert),
            _ => None,
        }
    }

    pub fn as_connection(&self) -> Option<ConnectionStatus> {
        match self {
            MonitorEvent::Connection { status } => Some(*status),
            _ => None,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
