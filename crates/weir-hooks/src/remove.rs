//! Field-removal hook.
//!
//! [`remove`] strips keys from the records a service returns to a client.
//! It only runs as an After hook, and only for calls that came in through a
//! transport; internal calls see the full records.
//!
//! ```rust,ignore
//! use weir_hooks::remove;
//!
//! users.hooks().after_all(remove(["password", "token"]));
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::trace;
use weir_core::{HookError, HookResult, HookedServiceEvent, Listener, Payload, try_normalize_async};

use crate::strategy::remove_key;

/// Custom removal handler: receives one key and one record, returns the
/// record without the key.
pub type Remover =
    Arc<dyn Fn(String, Payload) -> BoxFuture<'static, HookResult<Payload>> + Send + Sync>;

/// One or more keys to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keys(Vec<String>);

impl Keys {
    /// The keys, in removal order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for Keys {
    fn from(key: &str) -> Self {
        Self(vec![key.to_string()])
    }
}

impl From<String> for Keys {
    fn from(key: String) -> Self {
        Self(vec![key])
    }
}

impl<const N: usize> From<[&str; N]> for Keys {
    fn from(keys: [&str; N]) -> Self {
        Self(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl From<&[&str]> for Keys {
    fn from(keys: &[&str]) -> Self {
        Self(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl From<Vec<&str>> for Keys {
    fn from(keys: Vec<&str>) -> Self {
        Self::from(keys.as_slice())
    }
}

impl From<Vec<String>> for Keys {
    fn from(keys: Vec<String>) -> Self {
        Self(keys)
    }
}

/// Hook built by [`remove`] and [`remove_with`].
pub struct Remove {
    keys: Keys,
    remover: Option<Remover>,
}

/// Removes `keys` from every record of the result of client-originated calls.
///
/// Fails with [`HookError::PhaseViolation`] when attached as a Before hook.
pub fn remove(keys: impl Into<Keys>) -> Remove {
    Remove {
        keys: keys.into(),
        remover: None,
    }
}

/// Like [`remove`], with a custom removal handler replacing the built-in
/// per-shape strategy.
pub fn remove_with<F>(keys: impl Into<Keys>, remover: F) -> Remove
where
    F: Fn(String, Payload) -> BoxFuture<'static, HookResult<Payload>> + Send + Sync + 'static,
{
    Remove {
        keys: keys.into(),
        remover: Some(Arc::new(remover)),
    }
}

impl Remove {
    async fn strip(&self, mut record: Payload) -> HookResult<Payload> {
        for key in self.keys.as_slice() {
            record = match &self.remover {
                Some(remover) => remover(key.clone(), record).await?,
                None => remove_key(key, record)?,
            };
        }
        Ok(record)
    }
}

#[async_trait]
impl Listener for Remove {
    async fn call(&self, event: &mut HookedServiceEvent) -> HookResult<()> {
        if event.is_before() {
            return Err(HookError::PhaseViolation {
                hook: "remove",
                phase: event.phase(),
            });
        }
        if !event.params.has_provider() {
            trace!("Internal call, keeping all fields");
            return Ok(());
        }

        let strip = |record| self.strip(record);
        event.result = try_normalize_async(event.result.take(), &strip).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "remove"
    }
}

impl std::fmt::Debug for Remove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Remove")
            .field("keys", &self.keys)
            .field("custom_remover", &self.remover.is_some())
            .finish()
    }
}
