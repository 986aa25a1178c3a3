//! Access-control hook.
//!
//! [`disable`] rejects client-originated calls to a service method. Calls
//! without a `provider` param (internal calls) always pass.
//!
//! ```rust,ignore
//! use weir_hooks::{AccessRule, disable};
//!
//! // No client may delete users.
//! users.hooks().before(Method::Remove, disable(AccessRule::All));
//!
//! // Websocket clients may not create users.
//! users.hooks().before(Method::Create, disable(AccessRule::providers(["websocket"])?));
//!
//! // Only admins may update.
//! users.hooks().before(Method::Update, disable(AccessRule::when(|event| {
//!     event.params.get("role").and_then(|r| r.as_str()) == Some("admin")
//! })));
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use weir_core::{HookError, HookResult, HookedServiceEvent, Listener, ParseProviderError, Provider};

/// Async access predicate: `true` lets the call through.
pub type Predicate =
    Arc<dyn for<'a> Fn(&'a HookedServiceEvent) -> BoxFuture<'a, bool> + Send + Sync>;

/// Which client-originated calls to reject.
#[derive(Clone, Default)]
pub enum AccessRule {
    /// Reject every client-originated call.
    #[default]
    All,
    /// Reject calls whose provider is in the set.
    Providers(Vec<Provider>),
    /// Reject calls for which the predicate returns `false`.
    Predicate(Predicate),
}

impl AccessRule {
    /// Builds a [`AccessRule::Providers`] rule from provider names.
    ///
    /// Names are parsed here, once; an unknown name is an error.
    pub fn providers<I, S>(ids: I) -> Result<Self, ParseProviderError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .map(|id| id.as_ref().parse())
            .collect::<Result<_, _>>()
            .map(Self::Providers)
    }

    /// Builds a predicate rule from a synchronous check.
    pub fn when<F>(check: F) -> Self
    where
        F: Fn(&HookedServiceEvent) -> bool + Send + Sync + 'static,
    {
        Self::when_async(move |event| {
            let allowed = check(event);
            Box::pin(async move { allowed })
        })
    }

    /// Builds a predicate rule from an async check.
    pub fn when_async<F>(check: F) -> Self
    where
        F: for<'a> Fn(&'a HookedServiceEvent) -> BoxFuture<'a, bool> + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(check))
    }

    async fn allows(&self, event: &HookedServiceEvent) -> bool {
        match self {
            Self::All => false,
            Self::Providers(blocked) => event
                .params
                .provider()
                .is_none_or(|provider| !blocked.contains(&provider)),
            Self::Predicate(check) => check(event).await,
        }
    }
}

impl From<Provider> for AccessRule {
    fn from(provider: Provider) -> Self {
        Self::Providers(vec![provider])
    }
}

impl From<Vec<Provider>> for AccessRule {
    fn from(providers: Vec<Provider>) -> Self {
        Self::Providers(providers)
    }
}

impl std::fmt::Debug for AccessRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Providers(providers) => f.debug_tuple("Providers").field(providers).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Hook built by [`disable`].
#[derive(Debug, Clone)]
pub struct Disable {
    rule: AccessRule,
}

/// Rejects client-originated calls according to `rule`.
///
/// Rejections fail with [`HookError::MethodNotAllowed`].
pub fn disable(rule: impl Into<AccessRule>) -> Disable {
    Disable { rule: rule.into() }
}

#[async_trait]
impl Listener for Disable {
    async fn call(&self, event: &mut HookedServiceEvent) -> HookResult<()> {
        if !event.params.has_provider() {
            return Ok(());
        }
        if self.rule.allows(event).await {
            return Ok(());
        }

        Err(HookError::MethodNotAllowed {
            method: event.method(),
            provider: event.params.provider_raw(),
        })
    }

    fn name(&self) -> &str {
        "disable"
    }
}
