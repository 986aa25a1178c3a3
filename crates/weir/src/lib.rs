//! # Weir
//!
//! Composable before/after hooks for CRUD-style services.
//!
//! ## Overview
//!
//! Every call to a service passes two checkpoints: **Before** the method
//! runs, with the incoming `data`, and **After**, with the `result`. Weir
//! attaches listener chains to those checkpoints and ships the hooks most
//! services need: payload transforms, field removal, method disabling and
//! timestamps.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────────┐     ┌──────────────────┐
//! │ weir-runtime │────▶│ ServiceRegistry      │────▶│ ServiceHooks     │
//! │ config, logs │     │ + hook_all_services  │     │ before / after   │
//! └──────────────┘     └──────────────────────┘     └────────┬─────────┘
//!                                                            ▼
//!                        ┌───────────────────────────────────────────────┐
//!                        │ Chain: transform ▶ remove ▶ disable ▶ stamp   │
//!                        └───────────────────────────────────────────────┘
//! ```
//!
//! - **Core**: events, payload shapes, listeners, the normalizer, the service seams
//! - **Hooks**: the ready-made listeners
//! - **Runtime**: configuration, logging and the `HookRuntime` facade
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weir::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = HookRuntime::new();
//!     runtime.init_logging();
//!
//!     let created_at = Arc::new(runtime.add_created_at());
//!     let _watcher = runtime
//!         .hook_all_services_sync(move |service| {
//!             service
//!                 .hooks()
//!                 .before(Method::Create, Arc::clone(&created_at))
//!                 .before(Method::Remove, disable(AccessRule::All))
//!                 .after_all(remove(["password"]));
//!         })
//!         .await?;
//!
//!     let users = runtime.register_service(HookedService::new("users"));
//!
//!     let mut event = HookedServiceEvent::before(Method::Create, serde_json::json!({"name": "ada"}))
//!         .with_provider(Provider::Rest);
//!     users.hooks().fire(&mut event).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `weir.toml` files (default)
//! - `yaml-config`: load `weir.yaml` / `weir.yml` files
//! - `json-log`: JSON log output

pub use weir_core as core;
pub use weir_hooks as hooks;
pub use weir_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use weir::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use weir_runtime::{HookRuntime, WeirConfig};

    // Events and payloads
    pub use weir_core::{
        HookError, HookResult, HookedServiceEvent, Method, Params, Payload, Phase, PropertyBag,
        Provider,
    };

    // Listeners and composition
    pub use weir_core::{BoxFuture, Listener, chain, listener_fn, sync_listener};

    // Services
    pub use weir_core::{
        BoxedService, HookedService, Service, ServiceHost, ServiceRegistry, WatchHandle,
        hook_all_services, hook_all_services_sync,
    };

    // Capabilities for custom payload types
    pub use weir_core::{Extensible, FieldAccess, Record, impl_record};

    // Hooks
    pub use weir_hooks::{
        AccessRule, TimestampOptions, add_created_at, add_updated_at, disable, remove, to_json,
        to_type, transform, try_transform,
    };
}
