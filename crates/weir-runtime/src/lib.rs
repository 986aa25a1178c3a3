//! Weir Runtime - configuration, logging and service wiring.
//!
//! This crate provides:
//! - Layered configuration loading (`WeirConfig`, `ConfigLoader`)
//! - `tracing` subscriber setup (`LoggingBuilder`, `init_from_config`)
//! - The `HookRuntime` facade: a shared service registry plus hooks
//!   pre-configured from the `[hooks]` section
//!
//! # Configuration
//!
//! ```toml
//! # weir.toml
//! [logging]
//! level = "debug"
//! format = "pretty"
//!
//! [logging.filters]
//! weir_core = "trace"
//!
//! [hooks]
//! created_at_key = "created_at"
//! updated_at_key = "updated_at"
//! timestamp_precision = "secs"
//! ```
//!
//! ```ignore
//! use weir_runtime::HookRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = HookRuntime::new();
//!     runtime.init_logging();
//!
//!     let created_at = std::sync::Arc::new(runtime.add_created_at());
//!     let _watcher = runtime
//!         .hook_all_services_sync(move |service| {
//!             service.hooks().before(Method::Create, created_at.clone());
//!         })
//!         .await?;
//!
//!     runtime.register_service(HookedService::new("users"));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, HooksConfig, LoggingConfig, WeirConfig,
    load_config, load_config_from_file,
};
pub use logging::{LoggingBuilder, SpanEvents, init_from_config};
pub use runtime::{HookRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros and span helpers.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
