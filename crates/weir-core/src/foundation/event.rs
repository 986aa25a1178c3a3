//! The event value flowing through a service's hook pipeline.
//!
//! A service abstraction builds one [`HookedServiceEvent`] per call per phase:
//!
//! ```text
//!  caller ──▶ Before event ──▶ listeners ──▶ service method ──▶ After event ──▶ listeners ──▶ caller
//!             (data)                                            (result)
//! ```
//!
//! Listeners borrow the event mutably, one at a time, and may rewrite the
//! payload belonging to the current phase.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::payload::Payload;
use super::provider::Provider;

/// The params key a transport sets when a call originates from a client.
pub const PROVIDER_KEY: &str = "provider";

// ============================================================================
// Phase
// ============================================================================

/// Which checkpoint fired an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Before the service method runs; hooks operate on `data`.
    Before,
    /// After the service method returned; hooks operate on `result`.
    After,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Before => "before",
            Self::After => "after",
        })
    }
}

// ============================================================================
// Method
// ============================================================================

/// The CRUD method of the service call that fired the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// List records.
    Index,
    /// Fetch one record by id.
    Read,
    /// Create one or more records.
    Create,
    /// Partially update a record.
    Modify,
    /// Replace a record.
    Update,
    /// Delete a record.
    Remove,
}

impl Method {
    /// All methods, in declaration order.
    pub const ALL: [Method; 6] = [
        Self::Index,
        Self::Read,
        Self::Create,
        Self::Modify,
        Self::Update,
        Self::Remove,
    ];

    /// Lowercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Read => "read",
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Update => "update",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown service method '{s}'"))
    }
}

// ============================================================================
// Params
// ============================================================================

/// Call context attached to an event.
///
/// A string-keyed map of arbitrary JSON values. Transports put a
/// [`PROVIDER_KEY`] entry here for client-originated calls; internal calls
/// leave it out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    /// Creates empty params (an internal call).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates params for a call that arrived through `provider`.
    pub fn from_provider(provider: Provider) -> Self {
        let mut params = Self::new();
        params.set_provider(provider);
        params
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Returns the value under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if `key` is present, whatever its value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns `true` when the call came from a client transport.
    ///
    /// Only the presence of the key matters, matching how transports mark
    /// external calls.
    pub fn has_provider(&self) -> bool {
        self.contains_key(PROVIDER_KEY)
    }

    /// The raw provider value, rendered as a string.
    pub fn provider_raw(&self) -> Option<String> {
        self.get(PROVIDER_KEY).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// The provider parsed into a [`Provider`].
    ///
    /// Returns `None` when the key is absent or does not name a known provider.
    pub fn provider(&self) -> Option<Provider> {
        self.get(PROVIDER_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// Marks the call as originating from `provider`.
    pub fn set_provider(&mut self, provider: Provider) {
        self.insert(PROVIDER_KEY, provider.as_str());
    }

    /// Borrows the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// HookedServiceEvent
// ============================================================================

/// The value passed through a service's hook chain at one checkpoint.
///
/// `data` is only meaningful under [`Phase::Before`] and `result` only under
/// [`Phase::After`]. That discipline belongs to the listeners; the event does
/// not enforce it.
#[derive(Debug)]
pub struct HookedServiceEvent {
    phase: Phase,
    method: Method,
    /// Record id for `read`, `modify`, `update` and `remove` calls.
    pub id: Option<Value>,
    /// Input payload.
    pub data: Payload,
    /// Output payload.
    pub result: Payload,
    /// Call context.
    pub params: Params,
}

impl HookedServiceEvent {
    /// Creates an event for the Before checkpoint carrying `data`.
    pub fn before(method: Method, data: impl Into<Payload>) -> Self {
        Self {
            phase: Phase::Before,
            method,
            id: None,
            data: data.into(),
            result: Payload::Null,
            params: Params::new(),
        }
    }

    /// Creates an event for the After checkpoint carrying `result`.
    pub fn after(method: Method, result: impl Into<Payload>) -> Self {
        Self {
            phase: Phase::After,
            method,
            id: None,
            data: Payload::Null,
            result: result.into(),
            params: Params::new(),
        }
    }

    /// Replaces the params.
    pub fn with_params(mut self, params: impl Into<Params>) -> Self {
        self.params = params.into();
        self
    }

    /// Marks the event as coming from a client transport.
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.params.set_provider(provider);
        self
    }

    /// Sets the record id.
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Which checkpoint fired this event.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The service method being called.
    pub fn method(&self) -> Method {
        self.method
    }

    /// `true` under [`Phase::Before`].
    pub fn is_before(&self) -> bool {
        self.phase == Phase::Before
    }

    /// `true` under [`Phase::After`].
    pub fn is_after(&self) -> bool {
        self.phase == Phase::After
    }

    /// The payload belonging to the current phase.
    pub fn target(&self) -> &Payload {
        match self.phase {
            Phase::Before => &self.data,
            Phase::After => &self.result,
        }
    }

    /// Mutable access to the payload belonging to the current phase.
    pub fn target_mut(&mut self) -> &mut Payload {
        match self.phase {
            Phase::Before => &mut self.data,
            Phase::After => &mut self.result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_provider_presence_is_by_key() {
        let mut params = Params::new();
        assert!(!params.has_provider());

        params.insert(PROVIDER_KEY, Value::Null);
        assert!(params.has_provider());
        assert_eq!(params.provider(), None);
    }

    #[test]
    fn test_params_provider_parses_known_names() {
        let params = Params::from_provider(Provider::Websocket);
        assert_eq!(params.provider(), Some(Provider::Websocket));
        assert_eq!(params.provider_raw().as_deref(), Some("websocket"));

        let mut unknown = Params::new();
        unknown.insert(PROVIDER_KEY, "carrier-pigeon");
        assert!(unknown.has_provider());
        assert_eq!(unknown.provider(), None);
    }

    #[test]
    fn test_target_follows_phase() {
        let mut before = HookedServiceEvent::before(Method::Create, json!({"a": 1}));
        assert!(before.is_before());
        assert!(before.target().as_map().is_some());
        *before.target_mut() = Payload::Null;
        assert!(before.data.is_null());

        let after = HookedServiceEvent::after(Method::Read, json!([1, 2])).with_id(7);
        assert!(after.is_after());
        assert_eq!(after.target().as_list().map(<[Payload]>::len), Some(2));
        assert_eq!(after.id, Some(json!(7)));
    }

    #[test]
    fn test_method_parse_ignores_case() {
        assert_eq!("MODIFY".parse::<Method>(), Ok(Method::Modify));
        assert!("patch".parse::<Method>().is_err());
    }
}
