//! Logging setup for Weir applications.
//!
//! Hooks, the service registry and the watcher all log through `tracing`.
//! This module installs a `tracing-subscriber` pipeline for them, either from
//! a [`LoggingConfig`] or through [`LoggingBuilder`].
//!
//! ```rust,ignore
//! use weir_runtime::logging::{LoggingBuilder, SpanEvents};
//!
//! LoggingBuilder::new()
//!     .directive("weir_core=trace")
//!     .span_events(SpanEvents::LIFECYCLE)
//!     .init();
//! ```
//!
//! `RUST_LOG`, when set, replaces the configured base level; per-module
//! filters are still added on top.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig};

/// Span lifecycle events to log.
pub type SpanEvents = SpanEventConfig;

impl SpanEventConfig {
    /// No span events.
    pub const NONE: Self = Self {
        new: false,
        enter: false,
        exit: false,
        close: false,
    };

    /// Span creation and close.
    pub const LIFECYCLE: Self = Self {
        new: true,
        enter: false,
        exit: false,
        close: true,
    };

    /// Enter and exit only.
    pub const ACTIVE: Self = Self {
        new: false,
        enter: true,
        exit: true,
        close: false,
    };

    /// Every span event.
    pub const FULL: Self = Self {
        new: true,
        enter: true,
        exit: true,
        close: true,
    };

    fn to_fmt_span(self) -> FmtSpan {
        [
            (self.new, FmtSpan::NEW),
            (self.enter, FmtSpan::ENTER),
            (self.exit, FmtSpan::EXIT),
            (self.close, FmtSpan::CLOSE),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .fold(FmtSpan::NONE, |acc, (_, flag)| acc | flag)
    }
}

/// Installs the global subscriber described by `config`.
///
/// Does nothing if a global subscriber is already set.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Builder for the global `tracing` subscriber.
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: LogLevel,
    directives: Vec<String>,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
    with_target: bool,
    with_thread_ids: bool,
    with_file_location: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    /// Compact stdout logging at `info`.
    pub fn new() -> Self {
        Self {
            level: LogLevel::Info,
            directives: Vec::new(),
            span_events: SpanEvents::NONE,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            with_target: true,
            with_thread_ids: false,
            with_file_location: false,
        }
    }

    /// Builder mirroring a [`LoggingConfig`].
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut filters: Vec<_> = config.filters.iter().collect();
        filters.sort();

        Self {
            level: config.level,
            directives: filters
                .into_iter()
                .map(|(target, level)| format!("{target}={level}"))
                .collect(),
            span_events: config.span_events,
            format: config.format,
            output: config.output,
            file_path: config.file_path.clone(),
            with_target: true,
            with_thread_ids: config.thread_ids,
            with_file_location: config.file_location,
        }
    }

    /// Sets the base level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Adds a filter directive such as `weir_hooks=debug`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Sets the file written when output is [`LogOutput::File`].
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    /// Includes source file and line number.
    pub fn with_file_location(mut self, enabled: bool) -> Self {
        self.with_file_location = enabled;
        self
    }

    fn build_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()));

        for directive in &self.directives {
            match directive.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(error) => eprintln!("Ignoring log directive {directive:?}: {error}"),
            }
        }
        filter
    }

    /// Installs the subscriber, ignoring the error if one is already set.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.build_filter();
        let span_events = self.span_events.to_fmt_span();

        macro_rules! text_layer {
            ($layer:expr) => {
                $layer
                    .with_span_events(span_events.clone())
                    .with_target(self.with_target)
                    .with_thread_ids(self.with_thread_ids)
                    .with_file(self.with_file_location)
                    .with_line_number(self.with_file_location)
            };
        }

        macro_rules! install {
            ($writer:expr) => {{
                let registry = tracing_subscriber::registry().with(filter);
                match self.format {
                    #[cfg(feature = "json-log")]
                    LogFormat::Json => registry
                        .with(
                            fmt::layer()
                                .json()
                                .with_span_events(span_events.clone())
                                .with_writer($writer),
                        )
                        .try_init(),
                    LogFormat::Compact => registry
                        .with(text_layer!(fmt::layer().compact().with_writer($writer)))
                        .try_init(),
                    LogFormat::Full => registry
                        .with(text_layer!(fmt::layer().with_writer($writer)))
                        .try_init(),
                    LogFormat::Pretty => registry
                        .with(text_layer!(fmt::layer().pretty().with_writer($writer)))
                        .try_init(),
                }
            }};
        }

        match (self.output, &self.file_path) {
            (LogOutput::Stdout, _) => install!(std::io::stdout),
            (LogOutput::Stderr, _) => install!(std::io::stderr),
            (LogOutput::File, Some(path)) => {
                let appender = tracing_appender::rolling::never(
                    path.parent().unwrap_or_else(|| Path::new(".")),
                    path.file_name().unwrap_or_else(|| OsStr::new("weir.log")),
                );
                install!(appender)
            }
            (LogOutput::File, None) => {
                let result = install!(std::io::stdout);
                warn!("File output requested without a file path, logging to stdout");
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_event_flags() {
        assert_eq!(SpanEvents::NONE.to_fmt_span(), FmtSpan::NONE);
        assert_eq!(SpanEvents::FULL.to_fmt_span(), FmtSpan::FULL);
        assert_eq!(
            SpanEvents::LIFECYCLE.to_fmt_span(),
            FmtSpan::NEW | FmtSpan::CLOSE
        );
        assert_eq!(SpanEvents::ACTIVE.to_fmt_span(), FmtSpan::ACTIVE);
    }

    #[test]
    fn test_from_config_collects_filters() {
        let mut config = LoggingConfig {
            level: LogLevel::Warn,
            thread_ids: true,
            ..Default::default()
        };
        config.filters.insert("weir_hooks".into(), LogLevel::Debug);
        config.filters.insert("weir_core".into(), LogLevel::Trace);

        let builder = LoggingBuilder::from_config(&config);
        assert_eq!(builder.level, LogLevel::Warn);
        assert_eq!(builder.directives, vec!["weir_core=trace", "weir_hooks=debug"]);
        assert!(builder.with_thread_ids);
        assert!(!builder.with_file_location);
    }

    #[test]
    fn test_second_init_is_an_error() {
        let builder = LoggingBuilder::new().output(LogOutput::Stderr);
        let _ = builder.clone().try_init();
        assert!(builder.try_init().is_err());
    }
}
