//! # Weir Core
//!
//! The core engine of the Weir hook layer.
//!
//! This crate provides the building blocks every hook is made of: the event
//! fired at a service checkpoint, the payload shapes it carries, the listener
//! chain and the payload normalizer.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! Data model and errors:
//! - **Events**: [`HookedServiceEvent`] with its [`Phase`], [`Method`] and [`Params`]
//! - **Payloads**: [`Payload`] and the [`Extensible`], [`Record`] and [`FieldAccess`] capabilities
//! - **Providers**: the closed [`Provider`] enum
//! - **Errors**: [`HookError`] and friends
//!
//! ### Framework Layer
//!
//! Composition:
//! - **Listeners**: [`Listener`], [`listener_fn`], [`sync_listener`], [`chain`]
//! - **Normalizer**: [`normalize`], [`try_normalize`], [`try_normalize_async`], [`leaves_mut`]
//!
//! ### Integration Layer
//!
//! Collaborator seams:
//! - **Codec**: [`Codec`] and the default [`JsonCodec`]
//! - **Services**: [`Service`], [`ServiceHooks`], [`ServiceHost`], [`ServiceRegistry`]
//! - **Watcher**: [`hook_all_services`], [`hook_all_services_sync`]
//!
//! ## Event Flow
//!
//! ```text
//! ┌─────────┐  before  ┌──────────────┐      ┌─────────┐  after  ┌──────────────┐
//! │ Service │─────────▶│ Before chain │─────▶│ Method  │────────▶│ After chain  │──▶ caller
//! └─────────┘  (data)  └──────────────┘      └─────────┘ (result)└──────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weir_core::prelude::*;
//!
//! let users = Arc::new(HookedService::new("users"));
//! users.hooks().before(Method::Create, sync_listener(|event| {
//!     event.params.insert("checked", true);
//!     Ok(())
//! }));
//!
//! let mut event = HookedServiceEvent::before(Method::Create, serde_json::json!({"name": "ada"}))
//!     .with_provider(Provider::Rest);
//! users.hooks().fire(&mut event).await?;
//! ```

// Architectural layers
pub mod foundation;
pub mod framework;
pub mod integration;

// Re-export foundation types
pub use foundation::{
    CodecError, CodecResult, Extensible, FieldAccess, FieldError, FieldResult, HookError,
    HookResult, HookedServiceEvent, Method, PROVIDER_KEY, Params, ParseProviderError, Payload,
    Phase, PropertyBag, Provider, Record,
};

// Re-export framework types
pub use framework::{
    BoxedListener, Chain, Listener, ListenerFn, SyncListener, chain, leaves_mut, listener_fn,
    normalize, sync_listener, try_normalize, try_normalize_async,
};

// Re-export integration types
pub use integration::{
    BoxedService, Codec, HookedService, JsonCodec, Methods, Service, ServiceHooks, ServiceHost,
    ServiceRegistry, ServiceWatcher, WatchCallback, WatchHandle, decode, hook_all_services,
    hook_all_services_sync,
};

pub use futures::future::BoxFuture;

#[doc(hidden)]
pub mod __private {
    pub use serde_json::Value;
}

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::framework::{Chain, Listener, chain, listener_fn, sync_listener};
    pub use super::integration::{
        Codec, HookedService, JsonCodec, Methods, Service, ServiceHooks, ServiceHost,
        ServiceRegistry, hook_all_services, hook_all_services_sync,
    };
    pub use super::{BoxFuture, impl_record};
}
