//! # Weir Hooks
//!
//! Ready-made hooks for Weir services.
//!
//! Every hook here is a [`Listener`](weir_core::Listener) and can be attached
//! to a service's Before or After checkpoint, or composed with others using
//! [`chain`](weir_core::chain):
//!
//! - [`transform`], [`try_transform`], [`to_json`], [`to_type`] - rebuild the
//!   payload of the current phase record by record
//! - [`remove`] - strip fields from results sent to clients
//! - [`disable`] - reject client calls to a method
//! - [`add_created_at`], [`add_updated_at`] - stamp records with the current
//!   time
//!
//! Hooks that act on "client calls" look for a `provider` key in the event
//! params, which transports set and internal calls leave out.

pub mod disable;
pub mod remove;
pub mod strategy;
pub mod timestamp;
pub mod transform;

pub use disable::{AccessRule, Disable, Predicate, disable};
pub use remove::{Keys, Remove, Remover, remove, remove_with};
pub use strategy::{assign_key, remove_key};
pub use timestamp::{
    Assign, CREATED_AT_KEY, Timestamp, TimestampOptions, TimestampPrecision, UPDATED_AT_KEY,
    add_created_at, add_updated_at,
};
pub use transform::{
    ToType, Transform, TryTransform, to_json, to_json_with, to_type, to_type_with, transform,
    try_transform,
};
