//! Transform hooks.
//!
//! These hooks rebuild the payload of the current phase (`data` on Before,
//! `result` on After) by running a function over each of its records. They
//! run on every call, internal or client-originated.
//!
//! ```rust,ignore
//! use weir_hooks::{to_json, to_type, transform};
//!
//! users.hooks()
//!     .before(Method::Create, to_type::<User>())
//!     .after_all(to_json())
//!     .after_all(transform(|record| record));
//! ```
//!
//! If a fallible transform fails, the payload it was working on is dropped
//! along with the rest of the call.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::trace;
use weir_core::{
    Codec, HookResult, HookedServiceEvent, JsonCodec, Listener, Payload, Record, decode,
    normalize, try_normalize,
};

// ============================================================================
// transform / try_transform
// ============================================================================

/// Hook built by [`transform`].
pub struct Transform<F> {
    f: F,
}

/// Replaces each record of the current payload with `f(record)`.
pub fn transform<F>(f: F) -> Transform<F>
where
    F: Fn(Payload) -> Payload + Send + Sync,
{
    Transform { f }
}

#[async_trait]
impl<F> Listener for Transform<F>
where
    F: Fn(Payload) -> Payload + Send + Sync,
{
    async fn call(&self, event: &mut HookedServiceEvent) -> HookResult<()> {
        let target = event.target_mut();
        *target = normalize(target.take(), &self.f);
        Ok(())
    }

    fn name(&self) -> &str {
        "transform"
    }
}

/// Hook built by [`try_transform`].
pub struct TryTransform<F> {
    f: F,
    name: &'static str,
}

/// Fallible form of [`transform`]; the first error aborts the call.
pub fn try_transform<F>(f: F) -> TryTransform<F>
where
    F: Fn(Payload) -> HookResult<Payload> + Send + Sync,
{
    TryTransform {
        f,
        name: "try_transform",
    }
}

#[async_trait]
impl<F> Listener for TryTransform<F>
where
    F: Fn(Payload) -> HookResult<Payload> + Send + Sync,
{
    async fn call(&self, event: &mut HookedServiceEvent) -> HookResult<()> {
        let target = event.target_mut();
        *target = try_normalize(target.take(), &self.f)?;
        Ok(())
    }

    fn name(&self) -> &str {
        self.name
    }
}

// ============================================================================
// to_json
// ============================================================================

type EncodeFn = Box<dyn Fn(Payload) -> HookResult<Payload> + Send + Sync>;

/// Converts each record of the current payload into plain JSON using
/// [`JsonCodec`].
///
/// Domain objects become maps; maps and scalars are left as they are.
pub fn to_json() -> TryTransform<EncodeFn> {
    to_json_with(JsonCodec)
}

/// Like [`to_json`], with a caller-supplied codec.
pub fn to_json_with(codec: impl Codec + 'static) -> TryTransform<EncodeFn> {
    let encode: EncodeFn = Box::new(move |record: Payload| -> HookResult<Payload> {
        Ok(Payload::from(codec.encode(&record)?))
    });
    TryTransform {
        f: encode,
        name: "to_json",
    }
}

// ============================================================================
// to_type
// ============================================================================

/// Hook built by [`to_type`].
pub struct ToType<T> {
    codec: Arc<dyn Codec>,
    _marker: PhantomData<fn() -> T>,
}

/// Converts each record of the current payload into a `T`.
///
/// Records that already are a `T` pass through untouched, so the hook is
/// idempotent. Anything else is encoded to JSON and deserialized with serde.
pub fn to_type<T>() -> ToType<T>
where
    T: Record + DeserializeOwned,
{
    to_type_with(JsonCodec)
}

/// Like [`to_type`], encoding records with a caller-supplied codec.
pub fn to_type_with<T>(codec: impl Codec + 'static) -> ToType<T>
where
    T: Record + DeserializeOwned,
{
    ToType {
        codec: Arc::new(codec),
        _marker: PhantomData,
    }
}

impl<T> ToType<T>
where
    T: Record + DeserializeOwned,
{
    fn convert(&self, record: Payload) -> HookResult<Payload> {
        if let Payload::Object(object) = &record
            && object.is::<T>()
        {
            trace!(ty = std::any::type_name::<T>(), "Record already converted");
            return Ok(record);
        }
        let value = self.codec.encode(&record)?;
        Ok(Payload::object(decode::<T>(value)?))
    }
}

#[async_trait]
impl<T> Listener for ToType<T>
where
    T: Record + DeserializeOwned,
{
    async fn call(&self, event: &mut HookedServiceEvent) -> HookResult<()> {
        let target = event.target_mut();
        *target = try_normalize(target.take(), |record| self.convert(record))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "to_type"
    }
}
