//! Serialization collaborator.
//!
//! Hooks that turn domain objects into plain data, or plain data back into
//! domain objects, go through a [`Codec`]. Deserialization always uses serde
//! directly, so only the encoding side is pluggable.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::foundation::error::{CodecError, CodecResult};
use crate::foundation::payload::Payload;

/// Converts payloads into plain JSON values.
pub trait Codec: Send + Sync {
    /// Encodes `payload` as a JSON value.
    fn encode(&self, payload: &Payload) -> CodecResult<Value>;
}

/// The default serde_json-backed codec.
///
/// | shape        | encoded as                      |
/// |--------------|---------------------------------|
/// | `Null`       | `null`                          |
/// | `List`, `Iterable` | array of encoded elements |
/// | `Map`        | the map itself                  |
/// | `Extensible` | its property bag                |
/// | `Object`     | [`Record::to_json`](crate::Record::to_json) |
/// | `Value`      | the scalar                      |
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, payload: &Payload) -> CodecResult<Value> {
        Ok(match payload {
            Payload::Null => Value::Null,
            Payload::List(items) | Payload::Iterable(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.encode(item))
                    .collect::<CodecResult<_>>()?,
            ),
            Payload::Map(map) => Value::Object(map.clone()),
            Payload::Extensible(object) => Value::Object(object.properties().clone()),
            Payload::Object(record) => record.to_json()?,
            Payload::Value(value) => value.clone(),
        })
    }
}

/// Deserializes a plain JSON value into `T`.
pub fn decode<T: DeserializeOwned>(value: Value) -> CodecResult<T> {
    serde_json::from_value(value).map_err(|e| CodecError::Deserialize {
        type_name: std::any::type_name::<T>(),
        reason: e.to_string(),
    })
}
