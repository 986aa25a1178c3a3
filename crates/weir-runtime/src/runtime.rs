//! The runtime facade.
//!
//! [`HookRuntime`] bundles a loaded [`WeirConfig`] with a shared
//! [`ServiceRegistry`], and hands out hooks pre-configured from the
//! `[hooks]` section.
//!
//! ```rust,ignore
//! use weir_runtime::HookRuntime;
//!
//! let runtime = HookRuntime::builder().config_file("weir.toml").build()?;
//! runtime.init_logging();
//!
//! let created_at = Arc::new(runtime.add_created_at());
//! let watcher = runtime
//!     .hook_all_services_sync(move |service| {
//!         service.hooks().before(Method::Create, Arc::clone(&created_at));
//!     })
//!     .await?;
//!
//! runtime.register_service(HookedService::new("users"));
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};
use weir_core::{
    BoxFuture, BoxedService, HookResult, Service, ServiceRegistry, WatchHandle, hook_all_services,
    hook_all_services_sync,
};
use weir_hooks::{Timestamp, add_created_at, add_updated_at};

use crate::config::{ConfigLoader, ConfigResult, WeirConfig, validate_config};
use crate::logging;

/// Configuration plus the service registry of one application.
#[derive(Debug)]
pub struct HookRuntime {
    config: WeirConfig,
    registry: Arc<ServiceRegistry>,
}

impl Default for HookRuntime {
    fn default() -> Self {
        Self::with_config(WeirConfig::default())
    }
}

impl HookRuntime {
    /// Loads configuration from the default locations.
    ///
    /// Falls back to the built-in defaults if loading fails.
    pub fn new() -> Self {
        match ConfigLoader::new().load() {
            Ok(config) => Self::with_config(config),
            Err(error) => {
                eprintln!("Warning: failed to load config ({error}), using defaults");
                Self::default()
            }
        }
    }

    /// Starts a builder for custom configuration sources.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already built configuration.
    pub fn from_config(config: WeirConfig) -> ConfigResult<Self> {
        validate_config(&config)?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: WeirConfig) -> Self {
        info!(
            level = %config.logging.level,
            created_at_key = %config.hooks.created_at_key,
            updated_at_key = %config.hooks.updated_at_key,
            "Hook runtime created"
        );
        Self {
            config,
            registry: Arc::new(ServiceRegistry::new()),
        }
    }

    pub fn config(&self) -> &WeirConfig {
        &self.config
    }

    /// Installs the global `tracing` subscriber from `[logging]`.
    pub fn init_logging(&self) {
        logging::init_from_config(&self.config.logging);
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Registers a service and returns its shared handle.
    pub fn register_service(&self, service: impl Service + 'static) -> BoxedService {
        let service: BoxedService = Arc::new(service);
        self.register(Arc::clone(&service));
        service
    }

    /// Registers an already shared service.
    pub fn register(&self, service: BoxedService) {
        self.registry.register(service);
    }

    /// Runs the async `callback` once for every service, current and future.
    ///
    /// Callbacks for already registered services have completed when this
    /// returns. Fails with [`weir_core::HookError::NoRuntime`] outside a Tokio
    /// runtime.
    pub async fn hook_all_services<F>(&self, callback: F) -> HookResult<WatchHandle>
    where
        F: Fn(BoxedService) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        debug!(services = self.registry.len(), "Watching services");
        hook_all_services(callback).init(self.registry.as_ref()).await
    }

    /// Like [`hook_all_services`](Self::hook_all_services), for a callback
    /// that does not await.
    pub async fn hook_all_services_sync<F>(&self, callback: F) -> HookResult<WatchHandle>
    where
        F: Fn(&BoxedService) + Send + Sync + 'static,
    {
        debug!(services = self.registry.len(), "Watching services");
        hook_all_services_sync(callback)
            .init(self.registry.as_ref())
            .await
    }

    /// `add_created_at` with the configured key and precision.
    pub fn add_created_at(&self) -> Timestamp {
        add_created_at(self.config.hooks.created_at_options())
    }

    /// `add_updated_at` with the configured key and precision.
    pub fn add_updated_at(&self) -> Timestamp {
        add_updated_at(self.config.hooks.updated_at_options())
    }
}

/// Builder for [`HookRuntime`] over a [`ConfigLoader`].
#[derive(Debug, Default)]
pub struct RuntimeBuilder {
    loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads exactly this configuration file.
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.loader = self.loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.loader = self.loader.profile(profile);
        self
    }

    /// Adds a directory to search for configuration files.
    pub fn search_path(mut self, path: impl AsRef<Path>) -> Self {
        self.loader = self.loader.search_path(path);
        self
    }

    /// Ignores `WEIR_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.loader = self.loader.without_env();
        self
    }

    /// Layers a configuration value over the built-in defaults.
    pub fn merge(mut self, config: WeirConfig) -> Self {
        self.loader = self.loader.merge(config);
        self
    }

    pub fn build(self) -> ConfigResult<HookRuntime> {
        Ok(HookRuntime::with_config(self.loader.load()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, HooksConfig};
    use serde_json::json;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};
    use weir_core::{HookedService, HookedServiceEvent, Method, Phase, Provider};

    fn runtime_with_keys(created: &str, updated: &str) -> ConfigResult<HookRuntime> {
        HookRuntime::from_config(WeirConfig {
            hooks: HooksConfig {
                created_at_key: created.into(),
                updated_at_key: updated.into(),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[test]
    fn test_from_config_validates() {
        let err = assert_err!(runtime_with_keys("stamp", "stamp"));
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_builder_with_missing_file() {
        let result = HookRuntime::builder()
            .without_env()
            .config_file("/nonexistent/weir.toml")
            .build();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_register_service_replaces_by_path() {
        let runtime = HookRuntime::default();
        let first = runtime.register_service(HookedService::new("users"));
        let second = runtime.register_service(HookedService::new("users"));

        assert_eq!(runtime.registry().len(), 1);
        let current = runtime.registry().get("users").unwrap();
        assert!(Arc::ptr_eq(&current, &second));
        assert!(!Arc::ptr_eq(&current, &first));
    }

    #[tokio::test]
    async fn test_configured_hooks_reach_every_service() {
        let runtime = assert_ok!(runtime_with_keys("born", "touched"));
        runtime.register_service(HookedService::new("users"));

        let created_at = Arc::new(runtime.add_created_at());
        let updated_at = Arc::new(runtime.add_updated_at());
        let watcher = assert_ok!(
            runtime
                .hook_all_services_sync(move |service| {
                    service
                        .hooks()
                        .before(Method::Create, Arc::clone(&created_at))
                        .before([Method::Update, Method::Modify], Arc::clone(&updated_at));
                })
                .await
        );
        assert_eq!(watcher.hooked_count(), 1);

        let posts = runtime.register_service(HookedService::new("posts"));
        tokio::time::timeout(Duration::from_millis(200), async {
            while watcher.hooked_count() < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let mut event =
            HookedServiceEvent::before(Method::Create, json!({})).with_provider(Provider::Rest);
        assert_ok!(posts.hooks().fire(&mut event).await);
        let record = event.data.as_map().unwrap();
        assert!(record.contains_key("born"));
        assert!(!record.contains_key("touched"));

        assert_eq!(posts.hooks().len(Phase::Before), 2);
        watcher.stop();
    }

    #[tokio::test]
    async fn test_async_callback_completes_before_hook_all_returns() {
        let runtime = HookRuntime::default();
        let users = runtime.register_service(HookedService::new("users"));

        let created_at = Arc::new(runtime.add_created_at());
        let watcher = assert_ok!(
            runtime
                .hook_all_services(move |service: BoxedService| -> BoxFuture<'static, ()> {
                    let created_at = Arc::clone(&created_at);
                    Box::pin(async move {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        service.hooks().before(Method::Create, created_at);
                    })
                })
                .await
        );

        assert_eq!(users.hooks().len(Phase::Before), 1);
        watcher.stop();
    }
}
