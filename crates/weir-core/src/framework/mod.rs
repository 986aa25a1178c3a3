//! Framework layer - Listener composition and payload walking.
//!
//! This module contains the machinery hooks are built from:
//! - The listener trait, closure adapters and ordered chains
//! - The normalizer that applies a per-record function across a payload

pub mod listener;
pub mod normalize;

pub use listener::{
    BoxedListener, Chain, Listener, ListenerFn, SyncListener, chain, listener_fn, sync_listener,
};
pub use normalize::{leaves_mut, normalize, try_normalize, try_normalize_async};
