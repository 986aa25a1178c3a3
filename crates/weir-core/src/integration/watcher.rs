//! Service watcher.
//!
//! [`hook_all_services`] runs a callback once for every service of a
//! [`ServiceHost`], including services registered after the watcher starts.
//! It is how application-wide hooks get attached without touching each
//! service by hand:
//!
//! ```rust,ignore
//! use weir_core::{BoxFuture, BoxedService, hook_all_services};
//!
//! let handle = hook_all_services(|service: BoxedService| -> BoxFuture<'static, ()> {
//!     Box::pin(async move {
//!         let audit = load_audit_rules(service.path()).await;
//!         service.hooks().before_all(audit);
//!     })
//! })
//! .init(&registry)
//! .await?;
//! ```
//!
//! [`hook_all_services_sync`] takes a plain closure for callbacks that do
//! not await.
//!
//! Services are told apart by instance (`Arc` pointer), not by path: a new
//! instance registered under an old path is hooked again, the same instance
//! registered twice is not.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::service::{BoxedService, ServiceHost};
use crate::foundation::error::{HookError, HookResult};

type Touched = Arc<Mutex<HashMap<usize, BoxedService>>>;

/// Callback run once per service; its future is awaited before the next
/// service is touched.
pub type WatchCallback = Arc<dyn Fn(BoxedService) -> BoxFuture<'static, ()> + Send + Sync>;

/// Creates a watcher that runs the async `callback` for every service.
///
/// Nothing happens until [`ServiceWatcher::init`] is awaited.
pub fn hook_all_services<F>(callback: F) -> ServiceWatcher
where
    F: Fn(BoxedService) -> BoxFuture<'static, ()> + Send + Sync + 'static,
{
    ServiceWatcher {
        callback: Arc::new(callback),
        touched: Arc::new(Mutex::new(HashMap::new())),
    }
}

/// Like [`hook_all_services`], for a callback that does not await.
pub fn hook_all_services_sync<F>(callback: F) -> ServiceWatcher
where
    F: Fn(&BoxedService) + Send + Sync + 'static,
{
    hook_all_services(move |service: BoxedService| -> BoxFuture<'static, ()> {
        callback(&service);
        Box::pin(async {})
    })
}

/// A callback waiting to be attached to a [`ServiceHost`].
pub struct ServiceWatcher {
    callback: WatchCallback,
    /// Touched services keyed by instance address. The `Arc`s are held so an
    /// address can never be reused by a different service.
    touched: Touched,
}

impl ServiceWatcher {
    /// Hooks every existing service of `host`, then keeps hooking new ones in
    /// a background task.
    ///
    /// Existing services are hooked in the host's order, each callback
    /// awaited before the next starts; all of them have completed when this
    /// returns. The subscription is taken before existing services are
    /// enumerated, so a service registered in between is seen exactly once.
    ///
    /// Fails with [`HookError::NoRuntime`] when polled outside a Tokio
    /// runtime, before any service is touched.
    pub async fn init(self, host: &dyn ServiceHost) -> HookResult<WatchHandle> {
        let runtime = Handle::try_current().map_err(|_| HookError::NoRuntime {
            component: "service watcher",
        })?;
        let stream = host.on_service();

        for service in host.services() {
            touch(&self.touched, &self.callback, service).await;
        }

        let token = CancellationToken::new();
        let callback = Arc::clone(&self.callback);
        let touched = Arc::clone(&self.touched);
        let stream = stream.take_until(token.clone().cancelled_owned());

        let task = runtime.spawn(async move {
            let mut stream = std::pin::pin!(stream);
            while let Some(service) = stream.next().await {
                touch(&touched, &callback, service).await;
            }
            debug!("Service watcher stopped");
        });

        Ok(WatchHandle {
            token,
            task,
            touched: self.touched,
        })
    }
}

impl std::fmt::Debug for ServiceWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWatcher")
            .field("hooked", &self.touched.lock().len())
            .finish_non_exhaustive()
    }
}

/// Records `service` as touched. Returns `false` if it already was.
fn claim(touched: &Touched, service: &BoxedService) -> bool {
    let key = Arc::as_ptr(service).cast::<()>() as usize;
    let mut touched = touched.lock();
    if touched.contains_key(&key) {
        return false;
    }
    touched.insert(key, Arc::clone(service));
    true
}

async fn touch(touched: &Touched, callback: &WatchCallback, service: BoxedService) {
    if !claim(touched, &service) {
        trace!(path = service.path(), "Service already hooked");
        return;
    }

    debug!(path = service.path(), "Hooking service");
    callback(service).await;
}

/// Handle to a running watcher.
///
/// Dropping the handle leaves the watcher running; call
/// [`stop`](Self::stop) to end it.
pub struct WatchHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
    touched: Touched,
}

impl WatchHandle {
    /// Stops watching for new services.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Returns `true` once [`stop`](Self::stop) was called.
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Number of distinct service instances hooked so far.
    pub fn hooked_count(&self) -> usize {
        self.touched.lock().len()
    }

    /// Waits for the background task to finish.
    ///
    /// Only returns after [`stop`](Self::stop) or once the host's stream
    /// ends.
    pub async fn stopped(self) {
        let _ = self.task.await;
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("stopped", &self.is_stopped())
            .field("hooked", &self.hooked_count())
            .finish()
    }
}
