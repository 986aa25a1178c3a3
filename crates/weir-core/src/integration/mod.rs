//! Integration layer - Interfaces to the surrounding application.
//!
//! This module contains what Weir needs from its collaborators:
//! - The serialization codec used by conversion hooks
//! - The service and service-host seam, with an in-memory registry
//! - The watcher that hooks every service of a host

pub mod codec;
pub mod service;
pub mod watcher;

pub use codec::{Codec, JsonCodec, decode};
pub use service::{
    BoxedService, HookedService, Methods, Service, ServiceHooks, ServiceHost, ServiceRegistry,
};
pub use watcher::{
    ServiceWatcher, WatchCallback, WatchHandle, hook_all_services, hook_all_services_sync,
};
