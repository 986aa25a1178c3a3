//! Configuration loader using figment.
//!
//! Sources are layered, later ones overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. Programmatic overrides passed to [`ConfigLoader::merge`]
//! 3. Profile-specific file (`weir.{profile}.toml` / `weir.{profile}.yaml`)
//! 4. Main file (`weir.toml` / `weir.yaml` / `weir.yml`)
//! 5. Environment variables (`WEIR_*`)
//!
//! File formats are gated by the `toml-config` and `yaml-config` features.
//!
//! # Environment Variable Mapping
//!
//! Variables use the `WEIR_` prefix with `__` as the nesting separator:
//!
//! - `WEIR_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `WEIR_HOOKS__CREATED_AT_KEY=born` → `hooks.created_at_key = "born"`
//!
//! ```rust,ignore
//! use weir_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./deploy/weir.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::WeirConfig;
use super::validation::validate_config;

/// Environment variable prefix.
const ENV_PREFIX: &str = "WEIR_";

/// Environment variable naming the active profile.
const PROFILE_VAR: &str = "WEIR_PROFILE";

/// Directory name under the user config dir.
const APP_DIR: &str = "weir";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    /// Returns the profile name as used in file names.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Reads the profile from `WEIR_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|name| Self::parse(&name))
            .unwrap_or_default()
    }

    fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
#[derive(Debug)]
pub struct ConfigLoader {
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that searches the default locations and reads the
    /// environment.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a directory to search for configuration files.
    ///
    /// Once any path is added the default locations are no longer searched.
    pub fn search_path(mut self, path: impl AsRef<Path>) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Adds `<user config dir>/weir` to the search paths.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(dir) => self.search_path(dir.join(APP_DIR)),
            None => self,
        }
    }

    /// Loads exactly this file instead of searching.
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables `WEIR_*` environment variables (the default).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Layers a configuration value over the built-in defaults.
    pub fn merge(mut self, config: WeirConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Loads, extracts and validates the configuration.
    pub fn load(self) -> ConfigResult<WeirConfig> {
        let profile = self.profile.clone();
        let config: WeirConfig = self.build_figment()?.extract()?;
        validate_config(&config)?;

        debug!(
            %profile,
            level = %config.logging.level,
            created_at_key = %config.hooks.created_at_key,
            updated_at_key = %config.hooks.updated_at_key,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let overrides = std::mem::take(&mut self.overrides);
        let mut figment =
            Figment::from(Serialized::defaults(WeirConfig::default())).merge(overrides);

        figment = match &self.config_file {
            Some(path) if !path.exists() => return Err(ConfigError::FileNotFound(path.clone())),
            Some(path) => {
                info!(path = %path.display(), "Loading configuration file");
                merge_file(figment, path)?
            }
            None => self.search(figment),
        };

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }
        Ok(figment)
    }

    fn resolved_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join(APP_DIR)))
            .collect()
    }

    /// Merges the first base file found, preceded by its profile variant.
    ///
    /// TOML is searched before YAML; once a TOML file is found, YAML files
    /// are ignored.
    #[cfg_attr(
        not(any(feature = "toml-config", feature = "yaml-config")),
        allow(unused_mut, unused_variables)
    )]
    fn search(&self, mut figment: Figment) -> Figment {
        let paths = self.resolved_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        for dir in &paths {
            if let Some(merged) = self.merge_first(&figment, dir, &[("weir", "toml")], |f, p| {
                f.merge(Toml::file(p))
            }) {
                figment = merged;
                found = true;
                break;
            }
        }

        #[cfg(feature = "yaml-config")]
        if !found {
            for dir in &paths {
                if let Some(merged) =
                    self.merge_first(&figment, dir, &[("weir", "yaml"), ("weir", "yml")], |f, p| {
                        f.merge(Yaml::file(p))
                    })
                {
                    figment = merged;
                    found = true;
                    break;
                }
            }
        }

        if !found {
            warn!("No configuration file found, using defaults");
        }
        figment
    }

    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn merge_first(
        &self,
        figment: &Figment,
        dir: &Path,
        names: &[(&str, &str)],
        merge: impl Fn(Figment, &Path) -> Figment,
    ) -> Option<Figment> {
        names.iter().find_map(|(stem, ext)| {
            let base = dir.join(format!("{stem}.{ext}"));
            if !base.exists() {
                return None;
            }

            let mut figment = figment.clone();
            let variant = dir.join(format!("{stem}.{}.{ext}", self.profile));
            if variant.exists() {
                debug!(path = %variant.display(), "Loading profile-specific config");
                figment = merge(figment, &variant);
            }
            info!(path = %base.display(), "Loading configuration file");
            Some(merge(figment, &base))
        })
    }
}

/// Merges one file, picking the format from its extension.
fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Loads configuration from the default locations and the environment.
pub fn load_config() -> ConfigResult<WeirConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from one file plus the environment.
pub fn load_config_from_file(path: impl AsRef<Path>) -> ConfigResult<WeirConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HooksConfig, LogLevel, LoggingConfig};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("weir-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config() {
        let dir = scratch_dir("empty");
        let config = ConfigLoader::new().search_path(&dir).without_env().load().unwrap();
        assert_eq!(config, WeirConfig::default());
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("Staging").as_str(), "staging");
    }

    #[test]
    fn test_merge_overrides_defaults() {
        let dir = scratch_dir("merge");
        let config = ConfigLoader::new()
            .search_path(&dir)
            .without_env()
            .merge(WeirConfig {
                logging: LoggingConfig {
                    level: LogLevel::Trace,
                    ..Default::default()
                },
                ..Default::default()
            })
            .load()
            .unwrap();
        assert_eq!(config.logging.level, LogLevel::Trace);
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new()
            .without_env()
            .file("/nonexistent/weir.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = scratch_dir("ini");
        let path = dir.join("weir.ini");
        std::fs::write(&path, "").unwrap();

        let err = ConfigLoader::new().without_env().file(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "ini"));
    }

    #[test]
    fn test_env_overrides_hook_keys() {
        // SAFETY: no other test reads this variable.
        unsafe { std::env::set_var("WEIR_HOOKS__UPDATED_AT_KEY", "touched") };
        let dir = scratch_dir("env");
        let config = ConfigLoader::new().search_path(&dir).load();
        unsafe { std::env::remove_var("WEIR_HOOKS__UPDATED_AT_KEY") };

        assert_eq!(config.unwrap().hooks.updated_at_key, "touched");
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_is_layered_under_base() {
        let dir = scratch_dir("toml");
        std::fs::write(
            dir.join("weir.staging.toml"),
            "[hooks]\ncreated_at_key = \"born\"\nupdated_at_key = \"edited\"\n",
        )
        .unwrap();
        std::fs::write(dir.join("weir.toml"), "[hooks]\nupdated_at_key = \"touched\"\n").unwrap();

        let config = ConfigLoader::new()
            .profile("staging")
            .search_path(&dir)
            .without_env()
            .load()
            .unwrap();
        assert_eq!(config.hooks.created_at_key, "born");
        assert_eq!(config.hooks.updated_at_key, "touched");
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_invalid_file_fails_validation() {
        let dir = scratch_dir("invalid");
        let path = dir.join("weir.toml");
        std::fs::write(&path, "[hooks]\ncreated_at_key = \"stamp\"\nupdated_at_key = \"stamp\"\n")
            .unwrap();

        let err = ConfigLoader::new().without_env().file(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[cfg(all(feature = "toml-config", feature = "yaml-config"))]
    #[test]
    fn test_toml_file_shadows_yaml_file() {
        let dir = scratch_dir("both-formats");
        std::fs::write(dir.join("weir.toml"), "[hooks]\ncreated_at_key = \"born\"\n").unwrap();
        std::fs::write(
            dir.join("weir.yaml"),
            "hooks:\n  created_at_key: hatched\n  updated_at_key: edited\n",
        )
        .unwrap();

        let config = ConfigLoader::new().search_path(&dir).without_env().load().unwrap();
        assert_eq!(config.hooks.created_at_key, "born");
        assert_eq!(config.hooks.updated_at_key, HooksConfig::default().updated_at_key);
    }

    #[cfg(feature = "yaml-config")]
    #[test]
    fn test_yaml_file_used_without_toml() {
        let dir = scratch_dir("yaml-only");
        std::fs::write(dir.join("weir.yml"), "hooks:\n  updated_at_key: edited\n").unwrap();

        let config = ConfigLoader::new().search_path(&dir).without_env().load().unwrap();
        assert_eq!(config.hooks.updated_at_key, "edited");
    }
}
