//! Configuration schema definitions.
//!
//! This module defines the structure of Weir configuration, covering the
//! runtime's logging setup and the defaults handed to the built-in hooks.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use weir_hooks::{CREATED_AT_KEY, TimestampOptions, TimestampPrecision, UPDATED_AT_KEY};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure for Weir.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeirConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Defaults for the built-in hooks.
    pub hooks: HooksConfig,
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Output destination.
    pub output: LogOutput,
    /// Log file path, required when `output` is `file`.
    pub file_path: Option<PathBuf>,
    /// Span events to emit.
    pub span_events: SpanEventConfig,
    /// Include thread ids in each line.
    pub thread_ids: bool,
    /// Include source file and line in each line.
    pub file_location: bool,
    /// Per-module level overrides, e.g. `weir_core = "trace"`.
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            filters: HashMap::new(),
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive form used in filter strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single line per event, abbreviated.
    #[default]
    Compact,
    /// Single line per event with full context.
    Full,
    /// Multi-line human-readable output.
    Pretty,
    /// Newline-delimited JSON.
    #[cfg(feature = "json-log")]
    Json,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Append to [`LoggingConfig::file_path`].
    File,
}

/// Which span lifecycle events to log.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

// ============================================================================
// Hooks Configuration
// ============================================================================

/// Defaults for the built-in timestamp hooks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HooksConfig {
    /// Key written by `add_created_at`.
    pub created_at_key: String,
    /// Key written by `add_updated_at`.
    pub updated_at_key: String,
    /// Fractional-second digits of generated timestamps.
    pub timestamp_precision: TimestampPrecision,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            created_at_key: CREATED_AT_KEY.to_string(),
            updated_at_key: UPDATED_AT_KEY.to_string(),
            timestamp_precision: TimestampPrecision::default(),
        }
    }
}

impl HooksConfig {
    /// Options for `add_created_at` built from this configuration.
    pub fn created_at_options(&self) -> TimestampOptions {
        TimestampOptions::new()
            .key(&self.created_at_key)
            .precision(self.timestamp_precision)
    }

    /// Options for `add_updated_at` built from this configuration.
    pub fn updated_at_options(&self) -> TimestampOptions {
        TimestampOptions::new()
            .key(&self.updated_at_key)
            .precision(self.timestamp_precision)
    }
}
