//! Timestamp hooks.
//!
//! [`add_created_at`] and [`add_updated_at`] stamp each record of the current
//! payload with the current UTC time as an RFC 3339 string. Only
//! client-originated calls are stamped, and every record of one call gets the
//! same instant.
//!
//! ```rust,ignore
//! use weir_hooks::{TimestampOptions, add_created_at, add_updated_at};
//!
//! users.hooks()
//!     .before(Method::Create, add_created_at(TimestampOptions::default()))
//!     .before([Method::Update, Method::Modify], add_updated_at(TimestampOptions::new().key("touched")));
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;
use weir_core::{HookResult, HookedServiceEvent, Listener, Payload, leaves_mut};

use crate::strategy::assign_key;

/// Default key written by [`add_created_at`].
pub const CREATED_AT_KEY: &str = "createdAt";

/// Default key written by [`add_updated_at`].
pub const UPDATED_AT_KEY: &str = "updatedAt";

/// Custom assignment handler: writes the timestamp string into one record.
pub type Assign =
    Arc<dyn for<'a> Fn(&'a mut Payload, &'a str) -> BoxFuture<'a, HookResult<()>> + Send + Sync>;

// ============================================================================
// Options
// ============================================================================

/// Fractional-second digits of the generated timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPrecision {
    /// Whole seconds: `2024-01-01T00:00:00Z`.
    Secs,
    /// Milliseconds: `2024-01-01T00:00:00.000Z`.
    #[default]
    Millis,
    /// Microseconds: `2024-01-01T00:00:00.000000Z`.
    Micros,
}

impl TimestampPrecision {
    /// Formats `at` as an RFC 3339 UTC string with a `Z` suffix.
    pub fn format(self, at: DateTime<Utc>) -> String {
        let digits = match self {
            Self::Secs => SecondsFormat::Secs,
            Self::Millis => SecondsFormat::Millis,
            Self::Micros => SecondsFormat::Micros,
        };
        at.to_rfc3339_opts(digits, true)
    }
}

/// Options of [`add_created_at`] and [`add_updated_at`].
#[derive(Clone, Default)]
pub struct TimestampOptions {
    /// Key to write. Missing or empty means the hook's default key.
    pub key: Option<String>,
    /// Custom assignment replacing the built-in per-shape strategy.
    pub assign: Option<Assign>,
    /// Timestamp precision.
    pub precision: TimestampPrecision,
}

impl TimestampOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key to write.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets a custom assignment handler.
    pub fn assign<F>(mut self, assign: F) -> Self
    where
        F: for<'a> Fn(&'a mut Payload, &'a str) -> BoxFuture<'a, HookResult<()>>
            + Send
            + Sync
            + 'static,
    {
        self.assign = Some(Arc::new(assign));
        self
    }

    /// Sets the timestamp precision.
    pub fn precision(mut self, precision: TimestampPrecision) -> Self {
        self.precision = precision;
        self
    }
}

impl std::fmt::Debug for TimestampOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampOptions")
            .field("key", &self.key)
            .field("assign", &self.assign.as_ref().map(|_| ".."))
            .field("precision", &self.precision)
            .finish()
    }
}

// ============================================================================
// Hook
// ============================================================================

/// Hook built by [`add_created_at`] and [`add_updated_at`].
pub struct Timestamp {
    name: &'static str,
    key: String,
    assign: Option<Assign>,
    precision: TimestampPrecision,
}

/// Stamps records with their creation time under `createdAt` by default.
pub fn add_created_at(options: TimestampOptions) -> Timestamp {
    Timestamp::new("add_created_at", CREATED_AT_KEY, options)
}

/// Stamps records with their update time under `updatedAt` by default.
pub fn add_updated_at(options: TimestampOptions) -> Timestamp {
    Timestamp::new("add_updated_at", UPDATED_AT_KEY, options)
}

impl Timestamp {
    fn new(name: &'static str, default_key: &str, options: TimestampOptions) -> Self {
        let key = options
            .key
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| default_key.to_string());
        Self {
            name,
            key,
            assign: options.assign,
            precision: options.precision,
        }
    }

    /// The key this hook writes.
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl Listener for Timestamp {
    async fn call(&self, event: &mut HookedServiceEvent) -> HookResult<()> {
        if !event.params.has_provider() {
            return Ok(());
        }

        let now = self.precision.format(Utc::now());
        trace!(hook = self.name, key = %self.key, %now, "Stamping records");

        for record in leaves_mut(event.target_mut()) {
            match &self.assign {
                Some(assign) => assign(record, &now).await?,
                None => assign_key(record, &self.key, Value::String(now.clone()))?,
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        self.name
    }
}

impl std::fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timestamp")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("precision", &self.precision)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};
    use weir_core::{HookError, Method, PropertyBag, Provider};

    fn stamp(payload: &Payload, key: &str) -> Option<String> {
        payload
            .as_map()
            .and_then(|map| map.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    #[test]
    fn test_precision_formats() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(TimestampPrecision::Secs.format(at), "2024-01-02T03:04:05Z");
        assert_eq!(TimestampPrecision::Millis.format(at), "2024-01-02T03:04:05.000Z");
        assert_eq!(
            TimestampPrecision::Micros.format(at),
            "2024-01-02T03:04:05.000000Z"
        );
    }

    #[tokio::test]
    async fn test_created_at_shared_across_records() {
        let mut event = HookedServiceEvent::before(Method::Create, json!([{}, {}]))
            .with_provider(Provider::Rest);
        assert_ok!(add_created_at(TimestampOptions::default()).call(&mut event).await);

        let items = event.data.as_list().unwrap();
        let first = stamp(&items[0], CREATED_AT_KEY).unwrap();
        assert_eq!(stamp(&items[1], CREATED_AT_KEY), Some(first.clone()));
        assert!(first.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&first).is_ok());
    }

    #[tokio::test]
    async fn test_internal_calls_are_not_stamped() {
        let mut event = HookedServiceEvent::before(Method::Create, json!({}));
        assert_ok!(add_created_at(TimestampOptions::default()).call(&mut event).await);
        assert!(event.data.as_map().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_key_falls_back_and_after_targets_result() {
        let hook = add_updated_at(TimestampOptions::new().key(""));
        assert_eq!(hook.key(), UPDATED_AT_KEY);

        let mut event = HookedServiceEvent::after(
            Method::Update,
            Payload::List(vec![Payload::from(PropertyBag::new())]),
        )
        .with_provider(Provider::Websocket);
        assert_ok!(hook.call(&mut event).await);

        let items = event.result.as_list().unwrap();
        assert!(items[0].as_properties().unwrap().contains_key(UPDATED_AT_KEY));
    }

    #[tokio::test]
    async fn test_custom_assign() {
        let hook = add_created_at(TimestampOptions::new().assign(|record, now| {
            Box::pin(async move {
                if let Some(map) = record.as_map_mut() {
                    map.insert("meta".into(), json!({ "created": now }));
                }
                Ok::<_, HookError>(())
            })
        }));

        let mut event =
            HookedServiceEvent::before(Method::Create, json!({})).with_provider(Provider::Rest);
        assert_ok!(hook.call(&mut event).await);
        assert!(event.data.as_map().unwrap()["meta"]["created"].is_string());
    }

    #[tokio::test]
    async fn test_scalar_record_is_unsupported() {
        let mut event =
            HookedServiceEvent::before(Method::Create, json!(["x"])).with_provider(Provider::Rest);
        let err = assert_err!(add_created_at(TimestampOptions::default()).call(&mut event).await);
        assert!(matches!(err, HookError::UnsupportedShape { shape: "scalar", .. }));
    }
}
