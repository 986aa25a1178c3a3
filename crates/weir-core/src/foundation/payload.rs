//! Payload model.
//!
//! A service call carries its input and output as a [`Payload`]: a closed set
//! of shapes that the built-in hooks know how to walk and mutate.
//!
//! - [`Payload::List`] / [`Payload::Iterable`] - collections; hooks apply to
//!   every element
//! - [`Payload::Map`] - plain key/value records
//! - [`Payload::Extensible`] - domain objects exposing a dynamic property bag
//!   ([`Extensible`])
//! - [`Payload::Object`] - opaque domain objects ([`Record`]), optionally
//!   writable through [`FieldAccess`]
//! - [`Payload::Value`] - scalars
//! - [`Payload::Null`] - no payload
//!
//! # Domain objects
//!
//! ```rust,ignore
//! use serde::{Deserialize, Serialize};
//! use weir_core::{FieldAccess, FieldError, FieldResult, Payload, impl_record};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     secret: Option<String>,
//! }
//!
//! impl FieldAccess for User {
//!     fn set_field(&mut self, name: &str, value: serde_json::Value) -> FieldResult<()> {
//!         match name {
//!             "secret" => self.secret = value.as_str().map(str::to_string),
//!             _ => return Err(FieldError::unknown(name)),
//!         }
//!         Ok(())
//!     }
//!
//!     fn remove_field(&mut self, name: &str) -> FieldResult<()> {
//!         match name {
//!             "secret" => self.secret = None,
//!             _ => return Err(FieldError::unknown(name)),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl_record!(User, field_access);
//!
//! let payload = Payload::object(User { name: "ada".into(), secret: None });
//! ```

use std::any::Any;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{CodecError, CodecResult, FieldResult};

// ============================================================================
// Capability Traits
// ============================================================================

/// A domain object exposing a dynamic property bag.
///
/// Hooks add and remove keys on the bag directly; the codec emits the bag as
/// the object's JSON form.
pub trait Extensible: Debug + Send + Sync + 'static {
    /// The object's properties.
    fn properties(&self) -> &Map<String, Value>;

    /// Mutable access to the object's properties.
    fn properties_mut(&mut self) -> &mut Map<String, Value>;
}

/// Optional capability of a [`Record`] to have named fields written or cleared.
///
/// This is the only way the built-in hooks touch an opaque object; there is
/// no reflection.
pub trait FieldAccess {
    /// Writes `value` into the field `name`.
    fn set_field(&mut self, name: &str, value: Value) -> FieldResult<()>;

    /// Clears the field `name`.
    fn remove_field(&mut self, name: &str) -> FieldResult<()>;
}

/// An opaque domain object carried in a payload.
///
/// Implement it with [`impl_record!`](crate::impl_record) for any
/// `Serialize` type.
pub trait Record: Debug + Send + Sync + 'static {
    /// Name of the concrete type, used in error messages.
    fn type_name(&self) -> &'static str;

    /// Converts the object into a plain JSON value.
    fn to_json(&self) -> CodecResult<Value>;

    /// Field write access, if the type supports it.
    fn field_access(&mut self) -> Option<&mut dyn FieldAccess> {
        None
    }

    /// Returns `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl dyn Record {
    /// Returns `true` if the object is a `T`.
    pub fn is<T: Record>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcasts to a concrete record type.
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Serializes a record through serde. Used by [`impl_record!`](crate::impl_record).
#[doc(hidden)]
pub fn serialize_record<T: Serialize>(value: &T) -> CodecResult<Value> {
    serde_json::to_value(value).map_err(|e| CodecError::Serialize {
        type_name: std::any::type_name::<T>().to_string(),
        reason: e.to_string(),
    })
}

/// Implements [`Record`] for a `Serialize` type.
///
/// Pass `field_access` as a second argument when the type also implements
/// [`FieldAccess`], so hooks can write and clear its fields.
#[macro_export]
macro_rules! impl_record {
    (@common $ty:ty) => {
        fn type_name(&self) -> &'static str {
            ::std::any::type_name::<$ty>()
        }

        fn to_json(&self) -> $crate::CodecResult<$crate::__private::Value> {
            $crate::foundation::payload::serialize_record(self)
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }
    };
    ($ty:ty) => {
        impl $crate::Record for $ty {
            $crate::impl_record!(@common $ty);
        }
    };
    ($ty:ty, field_access) => {
        impl $crate::Record for $ty {
            $crate::impl_record!(@common $ty);

            fn field_access(&mut self) -> ::std::option::Option<&mut dyn $crate::FieldAccess> {
                ::std::option::Option::Some(self)
            }
        }
    };
}

// ============================================================================
// Property Bag
// ============================================================================

/// A ready-made [`Extensible`] object backed by a JSON map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(Map<String, Value>);

impl PropertyBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property (builder pattern).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the property `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if the property `key` is set.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

impl Extensible for PropertyBag {
    fn properties(&self) -> &Map<String, Value> {
        &self.0
    }

    fn properties_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }
}

impl From<Map<String, Value>> for PropertyBag {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ============================================================================
// Payload
// ============================================================================

/// The input or output of a service call.
#[derive(Debug, Default)]
pub enum Payload {
    /// No payload. Every built-in hook leaves it alone.
    #[default]
    Null,
    /// Ordered sequence; mutated in place.
    List(Vec<Payload>),
    /// Unordered or lazily produced collection; rebuilt, never mutated.
    Iterable(Vec<Payload>),
    /// Plain key/value record.
    Map(Map<String, Value>),
    /// Domain object with a dynamic property bag.
    Extensible(Box<dyn Extensible>),
    /// Opaque domain object.
    Object(Box<dyn Record>),
    /// Scalar JSON value (string, number, boolean).
    Value(Value),
}

impl Payload {
    /// Wraps a domain object.
    pub fn object<T: Record>(record: T) -> Self {
        Self::Object(Box::new(record))
    }

    /// Wraps an object with a property bag.
    pub fn extensible<T: Extensible>(object: T) -> Self {
        Self::Extensible(Box::new(object))
    }

    /// Builds an [`Payload::Iterable`] from any iterator of payloads.
    pub fn iterable<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Payload>,
    {
        Self::Iterable(items.into_iter().map(Into::into).collect())
    }

    /// Returns `true` for [`Payload::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for lists and iterables.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Iterable(_))
    }

    /// Borrows the map of a [`Payload::Map`].
    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Mutably borrows the map of a [`Payload::Map`].
    pub fn as_map_mut(&mut self) -> Option<&mut Map<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrows the elements of a list or iterable.
    pub fn as_list(&self) -> Option<&[Payload]> {
        match self {
            Self::List(items) | Self::Iterable(items) => Some(items),
            _ => None,
        }
    }

    /// Borrows the properties of a [`Payload::Extensible`].
    pub fn as_properties(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Extensible(object) => Some(object.properties()),
            _ => None,
        }
    }

    /// Borrows the scalar of a [`Payload::Value`].
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Downcasts a [`Payload::Object`] to a concrete record type.
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        match self {
            Self::Object(record) => record.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Takes the payload out, leaving [`Payload::Null`].
    pub fn take(&mut self) -> Payload {
        std::mem::take(self)
    }

    /// Short name of the payload's shape.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::List(_) => "list",
            Self::Iterable(_) => "iterable",
            Self::Map(_) => "map",
            Self::Extensible(_) => "extensible",
            Self::Object(record) => record.type_name(),
            Self::Value(_) => "scalar",
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(map),
            scalar => Self::Value(scalar),
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self::Map(map)
    }
}

impl From<Vec<Payload>> for Payload {
    fn from(items: Vec<Payload>) -> Self {
        Self::List(items)
    }
}

impl From<PropertyBag> for Payload {
    fn from(bag: PropertyBag) -> Self {
        Self::extensible(bag)
    }
}
