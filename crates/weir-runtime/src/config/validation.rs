//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{HooksConfig, LogOutput, LoggingConfig, WeirConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &WeirConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_hooks_config(&config.hooks)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    for target in logging.filters.keys() {
        if target.is_empty() || target.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: {target:?}"
            )));
        }
    }
    Ok(())
}

fn validate_hooks_config(hooks: &HooksConfig) -> ConfigResult<()> {
    if hooks.created_at_key.is_empty() {
        return Err(ConfigError::missing_field("hooks.created_at_key"));
    }
    if hooks.updated_at_key.is_empty() {
        return Err(ConfigError::missing_field("hooks.updated_at_key"));
    }

    // Both hooks often run on the same record.
    if hooks.created_at_key == hooks.updated_at_key {
        return Err(ConfigError::validation(format!(
            "created_at_key and updated_at_key must differ, both are {:?}",
            hooks.created_at_key
        )));
    }
    Ok(())
}
