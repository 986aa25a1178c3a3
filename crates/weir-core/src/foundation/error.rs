//! Error types for the Weir hook layer.
//!
//! Every hook reports failure through [`HookError`]. The listener chain never
//! recovers, retries or logs these errors: they travel unchanged to the
//! service abstraction that fired the event, which decides how to surface
//! them to its caller (see [`HookError::status_code`]).

use thiserror::Error;

use super::event::{Method, Phase};

// =============================================================================
// Field Access Errors
// =============================================================================

/// Errors raised by a [`FieldAccess`](super::payload::FieldAccess) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The object has no field with this name.
    #[error("unknown field '{name}'")]
    UnknownField {
        /// The requested field name.
        name: String,
    },

    /// The field exists but cannot be written or cleared.
    #[error("field '{name}' is read-only")]
    ReadOnly {
        /// The protected field name.
        name: String,
    },

    /// The value does not fit the field's type.
    #[error("invalid value for field '{name}': {reason}")]
    InvalidValue {
        /// The field being written.
        name: String,
        /// Why the value was refused.
        reason: String,
    },
}

impl FieldError {
    /// Creates an unknown-field error.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownField { name: name.into() }
    }

    /// Creates an invalid-value error.
    pub fn invalid(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidValue {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Codec Errors
// =============================================================================

/// Errors raised while converting payloads to or from plain JSON values.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// The value could not be turned into JSON.
    #[error("failed to serialize {type_name}: {reason}")]
    Serialize {
        /// Type being serialized.
        type_name: String,
        /// Underlying serializer message.
        reason: String,
    },

    /// The JSON value could not be turned into the requested type.
    #[error("failed to deserialize into {type_name}: {reason}")]
    Deserialize {
        /// Target type.
        type_name: &'static str,
        /// Underlying deserializer message.
        reason: String,
    },
}

// =============================================================================
// Provider Parsing
// =============================================================================

/// Returned when a string does not name a known [`Provider`](super::provider::Provider).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider '{0}'")]
pub struct ParseProviderError(pub String);

// =============================================================================
// Hook Errors
// =============================================================================

/// Failure of a hook while processing a [`HookedServiceEvent`](super::event::HookedServiceEvent).
#[derive(Debug, Clone, Error)]
pub enum HookError {
    /// The hook was attached to a phase it cannot run in.
    #[error("hook '{hook}' cannot run as a {phase} hook")]
    PhaseViolation {
        /// Name of the offending hook.
        hook: &'static str,
        /// Phase of the event it received.
        phase: Phase,
    },

    /// No strategy can remove or assign `key` on this payload shape.
    #[error("cannot apply key '{key}' to {shape} value: {object}")]
    UnsupportedShape {
        /// The key being removed or assigned.
        key: String,
        /// Shape of the payload leaf.
        shape: &'static str,
        /// Debug rendering of the payload leaf.
        object: String,
    },

    /// The call was rejected by an access-control hook.
    #[error("method '{method}' is not allowed{}", via_provider(.provider))]
    MethodNotAllowed {
        /// The rejected service method.
        method: Method,
        /// Raw provider value from the event params, if any.
        provider: Option<String>,
    },

    /// Serialization collaborator failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Field access collaborator failure.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// A component that spawns background work was started outside a Tokio
    /// runtime.
    #[error("{component} must be started from within a Tokio runtime")]
    NoRuntime {
        /// What needed the runtime.
        component: &'static str,
    },

    /// Failure raised by a user-defined listener.
    #[error("{0}")]
    Custom(String),
}

impl HookError {
    /// Creates a custom hook error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// HTTP-style status code a transport should answer with.
    ///
    /// Only access-control rejections map to a client error; everything else
    /// is a server-side fault.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MethodNotAllowed { .. } => 405,
            _ => 500,
        }
    }

    /// Returns `true` for access-control rejections.
    pub fn is_method_not_allowed(&self) -> bool {
        matches!(self, Self::MethodNotAllowed { .. })
    }
}

fn via_provider(provider: &Option<String>) -> String {
    provider
        .as_ref()
        .map(|p| format!(" via provider '{p}'"))
        .unwrap_or_default()
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for hook execution.
pub type HookResult<T> = Result<T, HookError>;

/// Result type for field access.
pub type FieldResult<T> = Result<T, FieldError>;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
