//! Payload normalization.
//!
//! Hooks that work on "a record" are applied to every record of a payload
//! through one shared rule:
//!
//! - [`Payload::Null`] stays `Null`
//! - [`Payload::List`] is normalized element-wise and rebuilt in order
//! - [`Payload::Iterable`] is normalized element-wise into a new iterable
//! - anything else is a leaf and goes through the leaf function
//!
//! The walk is shallow: collections held *inside* a leaf (an array field of
//! a map, say) are never visited.

use std::future::Future;

use futures::future::BoxFuture;

use crate::foundation::error::HookResult;
use crate::foundation::payload::Payload;

/// Applies `leaf` to every leaf of `payload`.
pub fn normalize<F>(payload: Payload, mut leaf: F) -> Payload
where
    F: FnMut(Payload) -> Payload,
{
    fn walk<F: FnMut(Payload) -> Payload>(payload: Payload, leaf: &mut F) -> Payload {
        match payload {
            Payload::Null => Payload::Null,
            Payload::List(items) => {
                Payload::List(items.into_iter().map(|item| walk(item, leaf)).collect())
            }
            Payload::Iterable(items) => {
                Payload::Iterable(items.into_iter().map(|item| walk(item, leaf)).collect())
            }
            other => leaf(other),
        }
    }

    walk(payload, &mut leaf)
}

/// Fallible form of [`normalize`]. Stops at the first failing leaf.
pub fn try_normalize<F>(payload: Payload, mut leaf: F) -> HookResult<Payload>
where
    F: FnMut(Payload) -> HookResult<Payload>,
{
    fn walk<F>(payload: Payload, leaf: &mut F) -> HookResult<Payload>
    where
        F: FnMut(Payload) -> HookResult<Payload>,
    {
        Ok(match payload {
            Payload::Null => Payload::Null,
            Payload::List(items) => Payload::List(
                items
                    .into_iter()
                    .map(|item| walk(item, leaf))
                    .collect::<HookResult<_>>()?,
            ),
            Payload::Iterable(items) => Payload::Iterable(
                items
                    .into_iter()
                    .map(|item| walk(item, leaf))
                    .collect::<HookResult<_>>()?,
            ),
            other => leaf(other)?,
        })
    }

    walk(payload, &mut leaf)
}

/// Async form of [`try_normalize`].
///
/// Leaves are processed one after another; leaf *i* completes before leaf
/// *i + 1* starts.
pub fn try_normalize_async<'a, F, Fut>(
    payload: Payload,
    leaf: &'a F,
) -> BoxFuture<'a, HookResult<Payload>>
where
    F: Fn(Payload) -> Fut + Sync,
    Fut: Future<Output = HookResult<Payload>> + Send + 'a,
{
    Box::pin(async move {
        let (items, ordered) = match payload {
            Payload::Null => return Ok(Payload::Null),
            Payload::List(items) => (items, true),
            Payload::Iterable(items) => (items, false),
            other => return leaf(other).await,
        };

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(try_normalize_async(item, leaf).await?);
        }

        Ok(if ordered {
            Payload::List(out)
        } else {
            Payload::Iterable(out)
        })
    })
}

/// Mutable references to every leaf of `payload`, in order.
///
/// For hooks that edit records in place instead of rebuilding the payload.
pub fn leaves_mut(payload: &mut Payload) -> Vec<&mut Payload> {
    fn collect<'a>(payload: &'a mut Payload, out: &mut Vec<&'a mut Payload>) {
        match payload {
            Payload::Null => {}
            Payload::List(items) | Payload::Iterable(items) => {
                for item in items {
                    collect(item, out);
                }
            }
            leaf => out.push(leaf),
        }
    }

    let mut out = Vec::new();
    collect(payload, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::error::HookError;
    use serde_json::{Value, json};
    use tokio_test::{assert_err, assert_ok};

    fn double(payload: Payload) -> Payload {
        match payload {
            Payload::Value(Value::Number(n)) => {
                Payload::Value(json!(n.as_i64().unwrap_or_default() * 2))
            }
            other => other,
        }
    }

    fn numbers(payload: &Payload) -> Vec<Value> {
        payload
            .as_list()
            .unwrap()
            .iter()
            .map(|p| p.as_value().cloned().unwrap_or(Value::Null))
            .collect()
    }

    #[test]
    fn test_null_stays_null() {
        let mut calls = 0;
        let out = normalize(Payload::Null, |p| {
            calls += 1;
            p
        });
        assert!(out.is_null());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_list_is_mapped_in_order() {
        let out = normalize(Payload::from(json!([1, 2, 3])), double);
        assert!(matches!(out, Payload::List(_)));
        assert_eq!(numbers(&out), vec![json!(2), json!(4), json!(6)]);
    }

    #[test]
    fn test_iterable_stays_iterable() {
        let out = normalize(Payload::iterable([json!(5)]), double);
        assert!(matches!(out, Payload::Iterable(_)));
        assert_eq!(numbers(&out), vec![json!(10)]);
    }

    #[test]
    fn test_single_leaf_is_passed_through_leaf_fn() {
        let out = normalize(Payload::from(json!(21)), double);
        assert_eq!(out.as_value(), Some(&json!(42)));
    }

    #[test]
    fn test_walk_is_shallow() {
        let mut seen = Vec::new();
        normalize(Payload::from(json!([{"tags": [1, 2]}])), |p| {
            seen.push(p.shape_name());
            p
        });
        assert_eq!(seen, vec!["map"]);
    }

    #[test]
    fn test_try_normalize_stops_on_error() {
        let mut visited = 0;
        let err = assert_err!(try_normalize(Payload::from(json!([1, 2, 3])), |p| {
            visited += 1;
            if p.as_value() == Some(&json!(2)) {
                return Err(HookError::custom("two"));
            }
            Ok(p)
        }));
        assert_eq!(err.to_string(), "two");
        assert_eq!(visited, 2);
    }

    #[tokio::test]
    async fn test_try_normalize_async_keeps_order() {
        let leaf = |p: Payload| async move { Ok::<_, HookError>(double(p)) };
        let input = Payload::from(json!([1, [2], null]));
        let out = assert_ok!(try_normalize_async(input, &leaf).await);

        let items = out.as_list().unwrap();
        assert_eq!(items[0].as_value(), Some(&json!(2)));
        assert_eq!(numbers(&items[1]), vec![json!(4)]);
        assert!(items[2].is_null());
    }

    #[test]
    fn test_leaves_mut_skips_null_and_flattens() {
        let mut payload = Payload::from(json!([{"a": 1}, null, [{"b": 2}]]));
        let leaves = leaves_mut(&mut payload);
        assert_eq!(leaves.len(), 2);

        for leaf in leaves {
            if let Some(map) = leaf.as_map_mut() {
                map.insert("seen".into(), json!(true));
            }
        }
        let items = payload.as_list().unwrap();
        assert_eq!(items[0].as_map().unwrap()["seen"], json!(true));
        assert!(items[1].is_null());
    }
}
