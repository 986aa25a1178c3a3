//! Foundation layer - Core data model and error types.
//!
//! This module contains the values every hook works with:
//! - The event fired at each service checkpoint
//! - The payload shapes carried as call input and output
//! - Transport providers
//! - The error family shared by all hooks

pub mod error;
pub mod event;
pub mod payload;
pub mod provider;

pub use error::{
    CodecError, CodecResult, FieldError, FieldResult, HookError, HookResult, ParseProviderError,
};
pub use event::{HookedServiceEvent, Method, PROVIDER_KEY, Params, Phase};
pub use payload::{Extensible, FieldAccess, Payload, PropertyBag, Record};
pub use provider::Provider;
