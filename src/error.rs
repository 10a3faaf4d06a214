// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the monitor stream
//!
//! The core is a pure generator, so the only failures are configuration
//! mistakes and calling the scheduler outside of a runtime.

use thiserror::Error;

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Main error type for monitor operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// Ring buffer capacity must be at least one
    #[error("Invalid capacity: buffer capacity must be at least 1")]
    InvalidCapacity,

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The tick scheduler needs a tokio runtime
    #[error("No tokio runtime available to drive the tick scheduler")]
    NoRuntime,

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MonitorError::InvalidConfig("tick_interval_ms must be positive".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid configuration"));
        assert!(msg.contains("tick_interval_ms"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: MonitorError = json_err.into();
        assert!(matches!(err, MonitorError::Serialization(_)));
    }
}
