//! End-to-end behaviour of hooks attached through services.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tokio_test::{assert_err, assert_ok};
use weir::core::normalize;
use weir::prelude::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Note {
    title: String,
}

impl_record!(Note);

fn recorder(
    log: &Arc<Mutex<Vec<&'static str>>>,
    tag: &'static str,
    delay_ms: u64,
) -> impl Listener + 'static {
    let log = Arc::clone(log);
    listener_fn(move |_event| {
        let log = Arc::clone(&log);
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            log.lock().await.push(tag);
            Ok::<_, HookError>(())
        })
    })
}

// ─── Chain ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chain_runs_in_order_and_stops_at_first_error() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let hooks = chain([
        recorder(&log, "slow", 20).boxed(),
        recorder(&log, "fast", 0).boxed(),
        sync_listener(|_event| Err(HookError::custom("halt"))).boxed(),
        recorder(&log, "never", 0).boxed(),
    ]);

    let mut event = HookedServiceEvent::before(Method::Create, json!({}));
    let err = assert_err!(hooks.call(&mut event).await);

    assert_eq!(err.to_string(), "halt");
    assert_eq!(*log.lock().await, vec!["slow", "fast"]);
}

// ─── Watcher ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn watcher_touches_each_service_once() {
    let runtime = HookRuntime::default();
    let users = runtime.register_service(HookedService::new("users"));
    runtime.register_service(HookedService::new("posts"));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let watcher = assert_ok!(
        runtime
            .hook_all_services({
                let seen = Arc::clone(&seen);
                move |service: BoxedService| -> BoxFuture<'static, ()> {
                    let seen = Arc::clone(&seen);
                    Box::pin(async move {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        seen.lock().await.push(service.path().to_string());
                    })
                }
            })
            .await
    );
    assert_eq!(watcher.hooked_count(), 2);
    assert_eq!(*seen.lock().await, vec!["users", "posts"]);

    runtime.register_service(HookedService::new("tags"));
    runtime.register(Arc::clone(&users));

    tokio::time::timeout(Duration::from_millis(200), async {
        while watcher.hooked_count() < 3 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("new service was not hooked");
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(*seen.lock().await, vec!["users", "posts", "tags"]);
    watcher.stop();
}

// ─── Normalizer ───────────────────────────────────────────────────────────────

#[test]
fn normalize_maps_leaves_and_keeps_null() {
    let double = |record: Payload| {
        let number = record.as_value().and_then(Value::as_i64);
        match number {
            Some(n) => Payload::from(json!(n * 2)),
            None => record,
        }
    };

    assert!(normalize(Payload::Null, double).is_null());

    let list = normalize(Payload::from(json!([1, 2, 3])), double);
    let values: Vec<_> = list
        .as_list()
        .unwrap()
        .iter()
        .map(|item| item.as_value().cloned())
        .collect();
    assert_eq!(values, vec![Some(json!(2)), Some(json!(4)), Some(json!(6))]);

    let single = normalize(Payload::from(json!(5)), double);
    assert_eq!(single.as_value(), Some(&json!(10)));
}

// ─── remove ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn remove_behaviour_by_phase_and_provider() {
    let users = HookedService::new("users");
    users
        .hooks()
        .before(Method::Create, remove("secret"))
        .after(Method::Read, remove("secret"));

    let mut before = HookedServiceEvent::before(Method::Create, json!({"secret": 1}));
    let err = assert_err!(users.hooks().fire(&mut before).await);
    assert!(matches!(err, HookError::PhaseViolation { phase: Phase::Before, .. }));

    let mut external =
        HookedServiceEvent::before(Method::Create, json!({"secret": 1})).with_provider(Provider::Rest);
    let err = assert_err!(users.hooks().fire(&mut external).await);
    assert!(matches!(err, HookError::PhaseViolation { phase: Phase::Before, .. }));
    assert_eq!(external.data.as_map().unwrap()["secret"], json!(1));

    let mut internal = HookedServiceEvent::after(Method::Read, json!({"secret": 1, "name": "ada"}));
    assert_ok!(users.hooks().fire(&mut internal).await);
    assert!(internal.result.as_map().unwrap().contains_key("secret"));

    let mut client = HookedServiceEvent::after(Method::Read, json!({"secret": 1, "name": "ada"}))
        .with_params(Params::from_iter([("provider".to_string(), json!("rest"))]));
    assert_ok!(users.hooks().fire(&mut client).await);
    let stripped = Value::Object(client.result.as_map().unwrap().clone());
    assert_eq!(stripped, json!({"name": "ada"}));
}

// ─── disable ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn disable_all_rejects_clients_only() {
    let users = HookedService::new("users");
    users.hooks().before(Method::Remove, disable(AccessRule::All));

    let mut client =
        HookedServiceEvent::before(Method::Remove, Payload::Null).with_provider(Provider::Websocket);
    let err = assert_err!(users.hooks().fire(&mut client).await);
    assert!(err.is_method_not_allowed());
    assert_eq!(err.status_code(), 405);

    let mut internal = HookedServiceEvent::before(Method::Remove, Payload::Null);
    assert_ok!(users.hooks().fire(&mut internal).await);
}

#[tokio::test]
async fn disable_provider_set_rejects_only_members() {
    let users = HookedService::new("users");
    users
        .hooks()
        .before(Method::Create, disable(AccessRule::providers(["rest"]).unwrap()));

    let mut rest =
        HookedServiceEvent::before(Method::Create, json!({})).with_provider(Provider::Rest);
    assert_err!(users.hooks().fire(&mut rest).await);

    let mut socket =
        HookedServiceEvent::before(Method::Create, json!({})).with_provider(Provider::Websocket);
    assert_ok!(users.hooks().fire(&mut socket).await);
}

// ─── Timestamps ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn created_at_is_shared_by_all_records_of_a_call() {
    let users = HookedService::new("users");
    users
        .hooks()
        .before(Method::Create, add_created_at(TimestampOptions::default()));

    let mut event =
        HookedServiceEvent::before(Method::Create, json!([{}, {}])).with_provider(Provider::Rest);
    assert_ok!(users.hooks().fire(&mut event).await);

    let stamps: Vec<_> = event
        .data
        .as_list()
        .unwrap()
        .iter()
        .map(|record| record.as_map().unwrap()["createdAt"].clone())
        .collect();
    assert!(stamps[0].is_string());
    assert_eq!(stamps[0], stamps[1]);
}

// ─── to_type ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn to_type_twice_equals_once() {
    let notes = HookedService::new("notes");
    notes
        .hooks()
        .before_all(to_type::<Note>())
        .before_all(to_type::<Note>());

    let mut event = HookedServiceEvent::before(Method::Create, json!({"title": "hello"}));
    assert_ok!(notes.hooks().fire(&mut event).await);
    assert_eq!(
        event.data.downcast_ref::<Note>(),
        Some(&Note {
            title: "hello".into()
        })
    );

    // And back out to plain JSON on the way to the client.
    notes.hooks().after_all(to_json());
    let mut after = HookedServiceEvent::after(Method::Read, Payload::object(Note {
        title: "hello".into(),
    }));
    assert_ok!(notes.hooks().fire(&mut after).await);
    assert_eq!(after.result.as_map().unwrap()["title"], json!("hello"));
}
