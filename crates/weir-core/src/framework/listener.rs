//! Listener trait and chaining.
//!
//! A [`Listener`] is an async callback that receives exclusive access to a
//! [`HookedServiceEvent`]. Every hook in Weir is a listener, and so is a
//! [`Chain`] of them, which is how several hooks compose into one.
//!
//! # Example
//!
//! ```rust,ignore
//! use weir_core::{HookError, chain, listener_fn, sync_listener};
//!
//! let audit = listener_fn(|event| {
//!     Box::pin(async move {
//!         tracing::info!(method = %event.method(), "call");
//!         Ok(())
//!     })
//! });
//!
//! let guard = sync_listener(|event| {
//!     if event.params.contains_key("banned") {
//!         return Err(HookError::custom("banned"));
//!     }
//!     Ok(())
//! });
//!
//! let hooks = chain([audit.boxed(), guard.boxed()]);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::trace;

use crate::foundation::error::HookResult;
use crate::foundation::event::HookedServiceEvent;

/// A type-erased, shareable listener.
pub type BoxedListener = Arc<dyn Listener>;

// ============================================================================
// Listener Trait
// ============================================================================

/// An async callback attached to a service checkpoint.
///
/// A listener may mutate the event (usually the payload of the current
/// phase) or fail, which aborts the rest of the chain.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Processes one event.
    async fn call(&self, event: &mut HookedServiceEvent) -> HookResult<()>;

    /// Name used in trace output.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Erases the listener type.
    fn boxed(self) -> BoxedListener
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

#[async_trait]
impl<L: Listener + ?Sized> Listener for Arc<L> {
    async fn call(&self, event: &mut HookedServiceEvent) -> HookResult<()> {
        (**self).call(event).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ============================================================================
// Closure Adapters
// ============================================================================

/// Listener backed by an async closure. Built by [`listener_fn`].
pub struct ListenerFn<F> {
    f: F,
    name: Option<String>,
}

impl<F> ListenerFn<F> {
    /// Names the listener for trace output.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Wraps an async closure as a [`Listener`].
///
/// The closure borrows the event for the lifetime of the returned future:
///
/// ```rust,ignore
/// let hook = listener_fn(|event| Box::pin(async move {
///     event.params.insert("seen", true);
///     Ok(())
/// }));
/// ```
pub fn listener_fn<F>(f: F) -> ListenerFn<F>
where
    F: for<'a> Fn(&'a mut HookedServiceEvent) -> BoxFuture<'a, HookResult<()>> + Send + Sync,
{
    ListenerFn { f, name: None }
}

#[async_trait]
impl<F> Listener for ListenerFn<F>
where
    F: for<'a> Fn(&'a mut HookedServiceEvent) -> BoxFuture<'a, HookResult<()>> + Send + Sync,
{
    async fn call(&self, event: &mut HookedServiceEvent) -> HookResult<()> {
        (self.f)(event).await
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("listener_fn")
    }
}

/// Listener backed by a synchronous closure. Built by [`sync_listener`].
pub struct SyncListener<F> {
    f: F,
}

/// Wraps a synchronous closure as a [`Listener`].
pub fn sync_listener<F>(f: F) -> SyncListener<F>
where
    F: Fn(&mut HookedServiceEvent) -> HookResult<()> + Send + Sync,
{
    SyncListener { f }
}

#[async_trait]
impl<F> Listener for SyncListener<F>
where
    F: Fn(&mut HookedServiceEvent) -> HookResult<()> + Send + Sync,
{
    async fn call(&self, event: &mut HookedServiceEvent) -> HookResult<()> {
        (self.f)(event)
    }

    fn name(&self) -> &str {
        "sync_listener"
    }
}

// ============================================================================
// Chain
// ============================================================================

/// An ordered sequence of listeners that runs as one.
///
/// Listener *i* is awaited to completion before listener *i + 1* starts. The
/// first error is returned unchanged and the remaining listeners are skipped.
#[derive(Clone, Default)]
pub struct Chain {
    listeners: Vec<BoxedListener>,
}

/// Composes listeners into a single [`Chain`].
pub fn chain<I>(listeners: I) -> Chain
where
    I: IntoIterator<Item = BoxedListener>,
{
    Chain {
        listeners: listeners.into_iter().collect(),
    }
}

impl Chain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener.
    pub fn push(&mut self, listener: impl Listener + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    /// Appends a listener (builder pattern).
    pub fn with(mut self, listener: impl Listener + 'static) -> Self {
        self.push(listener);
        self
    }

    /// Number of listeners in the chain.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if the chain has no listeners.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[async_trait]
impl Listener for Chain {
    async fn call(&self, event: &mut HookedServiceEvent) -> HookResult<()> {
        for (index, listener) in self.listeners.iter().enumerate() {
            trace!(
                listener = listener.name(),
                index,
                phase = %event.phase(),
                method = %event.method(),
                "Running listener"
            );
            listener.call(event).await?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "chain"
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("listeners", &self.listeners.iter().map(|l| l.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::error::HookError;
    use crate::foundation::event::Method;
    use crate::foundation::payload::Payload;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> BoxedListener {
        let log = Arc::clone(log);
        listener_fn(move |_event| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().push(tag);
                Ok(())
            })
        })
        .boxed()
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let slow = {
            let log = Arc::clone(&log);
            listener_fn(move |_event| {
                let log = Arc::clone(&log);
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    log.lock().push("slow");
                    Ok(())
                })
            })
            .boxed()
        };

        let hooks = chain([recorder(&log, "a"), slow, recorder(&log, "b")]);
        let mut event = HookedServiceEvent::before(Method::Create, Payload::Null);
        assert_ok!(hooks.call(&mut event).await);

        assert_eq!(*log.lock(), vec!["a", "slow", "b"]);
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let failing = sync_listener(|_event| Err(HookError::custom("boom"))).boxed();

        let hooks = chain([recorder(&log, "a"), failing, recorder(&log, "c")]);
        let mut event = HookedServiceEvent::after(Method::Index, Payload::Null);
        let err = assert_err!(hooks.call(&mut event).await);

        assert_eq!(err.to_string(), "boom");
        assert_eq!(*log.lock(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_empty_chain_succeeds() {
        let mut event = HookedServiceEvent::after(Method::Read, Payload::Null);
        assert!(Chain::new().is_empty());
        assert_ok!(Chain::new().call(&mut event).await);
    }

    #[tokio::test]
    async fn test_listener_mutates_event() {
        let hooks = Chain::new().with(sync_listener(|event| {
            event.params.insert("seen", true);
            Ok(())
        }));
        let mut event = HookedServiceEvent::before(Method::Create, Payload::Null);
        assert_ok!(hooks.call(&mut event).await);
        assert_eq!(event.params.get("seen"), Some(&serde_json::json!(true)));
    }
}
