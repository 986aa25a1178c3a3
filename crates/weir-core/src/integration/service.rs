//! Service seam.
//!
//! Weir does not own the service abstraction; it only needs three things
//! from it:
//!
//! - a [`Service`] exposes a path and its [`ServiceHooks`]
//! - a [`ServiceHost`] enumerates registered services and announces new ones
//! - the service fires [`ServiceHooks::fire`] at its Before and After
//!   checkpoints
//!
//! [`ServiceRegistry`] is an in-memory [`ServiceHost`] for applications that
//! do not bring their own.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::foundation::error::HookResult;
use crate::foundation::event::{HookedServiceEvent, Method, Phase};
use crate::framework::listener::{BoxedListener, Chain, Listener, chain};

// ─── Method filters ───────────────────────────────────────────────────────────

/// Which service methods a hook is attached to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Methods {
    /// Every method.
    #[default]
    All,
    /// Only the listed methods.
    Only(Vec<Method>),
}

impl Methods {
    /// Returns `true` if the filter admits `method`.
    pub fn matches(&self, method: Method) -> bool {
        match self {
            Self::All => true,
            Self::Only(methods) => methods.contains(&method),
        }
    }
}

impl From<Method> for Methods {
    fn from(method: Method) -> Self {
        Self::Only(vec![method])
    }
}

impl<const N: usize> From<[Method; N]> for Methods {
    fn from(methods: [Method; N]) -> Self {
        Self::Only(methods.to_vec())
    }
}

impl From<Vec<Method>> for Methods {
    fn from(methods: Vec<Method>) -> Self {
        Self::Only(methods)
    }
}

// ─── Per-service hook storage ─────────────────────────────────────────────────

struct HookEntry {
    methods: Methods,
    listener: BoxedListener,
}

/// Before and After listener lists of one service.
///
/// Registration takes `&self`, so hooks can be attached to a service that is
/// already shared. Firing snapshots the matching listeners first; hooks added
/// while an event is in flight apply from the next event on.
#[derive(Default)]
pub struct ServiceHooks {
    before: RwLock<Vec<HookEntry>>,
    after: RwLock<Vec<HookEntry>>,
}

impl ServiceHooks {
    /// Creates empty hook lists.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, phase: Phase) -> &RwLock<Vec<HookEntry>> {
        match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
        }
    }

    /// Appends a listener for `phase`, restricted to `methods`.
    pub fn add(
        &self,
        phase: Phase,
        methods: impl Into<Methods>,
        listener: impl Listener + 'static,
    ) -> &Self {
        let methods = methods.into();
        trace!(%phase, ?methods, listener = listener.name(), "Adding hook");
        self.slot(phase).write().push(HookEntry {
            methods,
            listener: Arc::new(listener),
        });
        self
    }

    /// Appends a Before listener for `methods`.
    pub fn before(&self, methods: impl Into<Methods>, listener: impl Listener + 'static) -> &Self {
        self.add(Phase::Before, methods, listener)
    }

    /// Appends an After listener for `methods`.
    pub fn after(&self, methods: impl Into<Methods>, listener: impl Listener + 'static) -> &Self {
        self.add(Phase::After, methods, listener)
    }

    /// Appends a Before listener for every method.
    pub fn before_all(&self, listener: impl Listener + 'static) -> &Self {
        self.before(Methods::All, listener)
    }

    /// Appends an After listener for every method.
    pub fn after_all(&self, listener: impl Listener + 'static) -> &Self {
        self.after(Methods::All, listener)
    }

    /// Snapshot of the listeners that fire for `phase` and `method`, in
    /// registration order.
    pub fn listeners(&self, phase: Phase, method: Method) -> Chain {
        let entries = self.slot(phase).read();
        chain(
            entries
                .iter()
                .filter(|entry| entry.methods.matches(method))
                .map(|entry| Arc::clone(&entry.listener))
                .collect::<Vec<_>>(),
        )
    }

    /// Number of listeners registered for `phase`.
    pub fn len(&self, phase: Phase) -> usize {
        self.slot(phase).read().len()
    }

    /// Runs the listeners matching the event's phase and method.
    pub async fn fire(&self, event: &mut HookedServiceEvent) -> HookResult<()> {
        let listeners = self.listeners(event.phase(), event.method());
        listeners.call(event).await
    }
}

impl std::fmt::Debug for ServiceHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHooks")
            .field("before", &self.before.read().len())
            .field("after", &self.after.read().len())
            .finish()
    }
}

// ─── Service and host traits ──────────────────────────────────────────────────

/// A service whose calls are intercepted by hooks.
pub trait Service: Send + Sync {
    /// The path the service is mounted at.
    fn path(&self) -> &str;

    /// The service's hook lists.
    fn hooks(&self) -> &ServiceHooks;
}

/// A shareable service handle.
pub type BoxedService = Arc<dyn Service>;

/// The application's view of its registered services.
pub trait ServiceHost: Send + Sync {
    /// Every registered service, in a stable order.
    fn services(&self) -> Vec<BoxedService>;

    /// A stream yielding each service as it gets registered from now on.
    fn on_service(&self) -> BoxStream<'static, BoxedService>;
}

/// A bare service: a path and hook lists.
///
/// Useful when the hooks are all the service needs to carry, and in tests.
#[derive(Debug)]
pub struct HookedService {
    path: String,
    hooks: ServiceHooks,
}

impl HookedService {
    /// Creates a service mounted at `path` with no hooks.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hooks: ServiceHooks::new(),
        }
    }
}

impl Service for HookedService {
    fn path(&self) -> &str {
        &self.path
    }

    fn hooks(&self) -> &ServiceHooks {
        &self.hooks
    }
}

// ─── In-memory registry ───────────────────────────────────────────────────────

/// An in-memory [`ServiceHost`].
///
/// Services are kept in registration order. Registering a second service
/// under an existing path replaces the first in place.
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<Vec<BoxedService>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<BoxedService>>>,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service and announces it to every subscriber.
    ///
    /// Announcements go out even when the same instance is registered again;
    /// telling repeats apart is the subscriber's job.
    pub fn register(&self, service: BoxedService) {
        {
            let mut services = self.services.write();
            match services.iter_mut().find(|s| s.path() == service.path()) {
                Some(slot) => *slot = Arc::clone(&service),
                None => services.push(Arc::clone(&service)),
            }
        }
        debug!(path = service.path(), "Service registered");

        self.subscribers
            .lock()
            .retain(|tx| tx.send(Arc::clone(&service)).is_ok());
    }

    /// Looks up a service by path.
    pub fn get(&self, path: &str) -> Option<BoxedService> {
        self.services
            .read()
            .iter()
            .find(|s| s.path() == path)
            .cloned()
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    /// Returns `true` when no service is registered.
    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}

impl ServiceHost for ServiceRegistry {
    fn services(&self) -> Vec<BoxedService> {
        self.services.read().clone()
    }

    fn on_service(&self) -> BoxStream<'static, BoxedService> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|service| (service, rx))
        })
        .boxed()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field(
                "services",
                &self
                    .services
                    .read()
                    .iter()
                    .map(|s| s.path().to_string())
                    .collect::<Vec<_>>(),
            )
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}
