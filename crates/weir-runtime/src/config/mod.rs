//! Configuration module for the Weir runtime.
//!
//! This module provides layered configuration loading and validation for
//! logging and the defaults of the built-in hooks.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    HooksConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig, WeirConfig,
};
pub use validation::validate_config;
