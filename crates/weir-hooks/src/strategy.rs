//! Built-in per-shape strategies.
//!
//! The removal and timestamp hooks delegate the actual edit of a payload
//! leaf to these functions unless a custom handler is supplied. Dispatch is
//! on [`Payload`] shape, in this order:
//!
//! | shape        | remove                         | assign                    |
//! |--------------|--------------------------------|---------------------------|
//! | `List`       | drop elements equal to the key | unsupported               |
//! | `Iterable`   | filtered copy without the key  | unsupported               |
//! | `Map`        | remove the entry               | set the entry             |
//! | `Extensible` | remove the property            | set the property          |
//! | `Object`     | [`FieldAccess::remove_field`]  | [`FieldAccess::set_field`] |
//!
//! Everything else, and objects without [`FieldAccess`], yields
//! [`HookError::UnsupportedShape`].
//!
//! [`FieldAccess`]: weir_core::FieldAccess
//! [`FieldAccess::remove_field`]: weir_core::FieldAccess::remove_field
//! [`FieldAccess::set_field`]: weir_core::FieldAccess::set_field

use serde_json::Value;
use weir_core::{HookError, HookResult, Payload};

/// Removes `key` from one payload leaf.
pub fn remove_key(key: &str, payload: Payload) -> HookResult<Payload> {
    match payload {
        Payload::List(mut items) => {
            items.retain(|item| !is_key(item, key));
            Ok(Payload::List(items))
        }
        Payload::Iterable(items) => Ok(Payload::Iterable(
            items.into_iter().filter(|item| !is_key(item, key)).collect(),
        )),
        Payload::Map(mut map) => {
            map.remove(key);
            Ok(Payload::Map(map))
        }
        Payload::Extensible(mut object) => {
            object.properties_mut().remove(key);
            Ok(Payload::Extensible(object))
        }
        Payload::Object(mut record) => {
            if let Some(access) = record.field_access() {
                access.remove_field(key)?;
                return Ok(Payload::Object(record));
            }
            Err(unsupported(key, &Payload::Object(record)))
        }
        other => Err(unsupported(key, &other)),
    }
}

/// Sets `key` to `value` on one payload leaf, in place.
pub fn assign_key(payload: &mut Payload, key: &str, value: Value) -> HookResult<()> {
    match payload {
        Payload::Map(map) => {
            map.insert(key.to_string(), value);
            return Ok(());
        }
        Payload::Extensible(object) => {
            object.properties_mut().insert(key.to_string(), value);
            return Ok(());
        }
        Payload::Object(record) => {
            if let Some(access) = record.field_access() {
                access.set_field(key, value)?;
                return Ok(());
            }
        }
        _ => {}
    }
    Err(unsupported(key, payload))
}

fn is_key(item: &Payload, key: &str) -> bool {
    matches!(item, Payload::Value(Value::String(s)) if s == key)
}

fn unsupported(key: &str, payload: &Payload) -> HookError {
    HookError::UnsupportedShape {
        key: key.to_string(),
        shape: payload.shape_name(),
        object: format!("{payload:?}"),
    }
}
