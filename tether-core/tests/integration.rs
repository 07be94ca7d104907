//! Integration Tests for the Store and Bindings
//!
//! These tests drive the store, the hook and the consumer together the way a
//! framework adapter would.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use tether_core::{
    impl_shallow_eq, use_shared_state, Children, Consumer, DeletePolicy, Lifecycle, Next,
    SeedPolicy, Selector, Store, StoreConfig, StoreError, StateManager, SubscriberId, Update,
    UseOptions,
};

#[derive(Debug, Clone, PartialEq)]
struct Counter {
    count: i64,
}
impl_shallow_eq!(Counter { count });

#[derive(Debug, Clone, PartialEq)]
struct Doc {
    count: i64,
    text: String,
}
impl_shallow_eq!(Doc { count, text });

fn doc(count: i64, text: &str) -> Doc {
    Doc {
        count,
        text: text.to_string(),
    }
}

/// A host that counts re-render requests.
fn counting_host() -> (impl Fn() + Clone + Send + Sync + 'static, Arc<AtomicI32>) {
    let renders = Arc::new(AtomicI32::new(0));
    let renders_clone = renders.clone();
    let host = move || {
        renders_clone.fetch_add(1, Ordering::SeqCst);
    };
    (host, renders)
}

/// A raw subscriber that counts notifications.
fn watch(store: &Store, key: &str) -> (SubscriberId, Arc<AtomicI32>) {
    let hits = Arc::new(AtomicI32::new(0));
    let hits_clone = hits.clone();
    let id = SubscriberId::new();
    store.subscribe(key, id, move || {
        hits_clone.fetch_add(1, Ordering::SeqCst);
    });
    (id, hits)
}

/// Test that a key never written or observed reads as absent.
#[test]
fn unknown_key_is_absent() {
    let store = Store::new();
    assert!(store.get::<i32>("nothing").is_none());
    assert!(!store.contains("nothing"));
}

/// Test that each changing write notifies once and an equal write not at all.
#[test]
fn changing_writes_notify_once_each() {
    let store = Store::new();
    let (_, hits) = watch(&store, "k");

    store.set("k", vec![1, 2]);
    store.set("k", vec![1, 3]);
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // Shallow-equal but freshly allocated.
    store.set("k", vec![1, 3]);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

/// Test the `{ count, text }` example: a `text` selector ignores `count`.
#[test]
fn selector_ignores_unselected_fields() {
    let store = Store::new();
    store.set("doc", doc(0, "a"));

    let (host, renders) = counting_host();
    let mut state = use_shared_state(
        &store,
        "doc",
        host,
        UseOptions::new().selector(|d: Option<&Doc>| d.map(|d| d.text.clone())),
    );
    state.on_mount();

    store.set("doc", doc(1, "a"));
    assert_eq!(renders.load(Ordering::SeqCst), 0);

    store.set("doc", doc(1, "b"));
    assert_eq!(renders.load(Ordering::SeqCst), 1);
}

/// Test that an observer can unsubscribe from inside its own callback.
#[test]
fn unsubscribe_from_own_callback() {
    let store = Store::new();
    let hits = Arc::new(AtomicI32::new(0));
    let id = SubscriberId::new();

    let (inner, hits_clone) = (store.clone(), hits.clone());
    store.subscribe("k", id, move || {
        hits_clone.fetch_add(1, Ordering::SeqCst);
        inner.unsubscribe("k", id);
    });

    store.set("k", 1_i32);
    store.set("k", 2_i32);
    store.set("k", 3_i32);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!store.is_subscribed("k", id));
}

/// Test that an observer removed mid-fan-out by another is not invoked.
#[test]
fn unsubscribe_during_fan_out_skips_target() {
    let store = Store::new();
    let victim = SubscriberId::new();
    let victim_hits = Arc::new(AtomicI32::new(0));

    let inner = store.clone();
    store.subscribe("k", SubscriberId::new(), move || {
        inner.unsubscribe("k", victim);
    });
    let hits_clone = victim_hits.clone();
    store.subscribe("k", victim, move || {
        hits_clone.fetch_add(1, Ordering::SeqCst);
    });

    store.set("k", 1_i32);
    assert_eq!(victim_hits.load(Ordering::SeqCst), 0);
}

/// Test that delete removes the value and notifies observers exactly once.
#[test]
fn delete_notifies_once() {
    let store = Store::new();
    store.set("k", 1_i32);
    let (id, hits) = watch(&store, "k");

    assert!(store.delete("k"));
    assert!(store.get::<i32>("k").is_none());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!store.is_subscribed("k", id));

    store.set("k", 2_i32);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

/// Test that a silent store drops observers without notifying them.
#[test]
fn silent_delete_does_not_notify() {
    let store = Store::with_config(StoreConfig::default().with_delete_policy(DeletePolicy::Silent));
    store.set("k", 1_i32);
    let (_, hits) = watch(&store, "k");

    store.clear();
    assert!(store.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

/// Test the counter scenario: two observers, three increments.
#[test]
fn counter_scenario() {
    let store = Store::new();
    store.set("counter", Counter { count: 0 });

    let (host_a, renders_a) = counting_host();
    let mut a = use_shared_state(&store, "counter", host_a, UseOptions::<Counter>::new());

    let (host_b, renders_b) = counting_host();
    let mut b = use_shared_state(
        &store,
        "counter",
        host_b,
        UseOptions::new().selector(|c: Option<&Counter>| c.map(|c| c.count)),
    );

    a.on_mount();
    b.on_mount();

    for _ in 0..3 {
        store
            .update("counter", |prev: Option<&Counter>| {
                Next::Value(Counter {
                    count: prev.map_or(0, |c| c.count) + 1,
                })
            })
            .unwrap();
    }

    assert_eq!(renders_a.load(Ordering::SeqCst), 3);
    assert_eq!(renders_b.load(Ordering::SeqCst), 3);
    assert_eq!(store.get::<Counter>("counter").as_deref(), Some(&Counter { count: 3 }));
    assert_eq!(b.render().value(), Some(&Counter { count: 3 }));
}

/// Test that the refresh sentinel notifies without changing the value.
#[test]
fn refresh_sentinel_forces_notification() {
    let store = Store::new();
    store.set("k", Counter { count: 1 });
    let before = store.get::<Counter>("k");
    let (_, hits) = watch(&store, "k");

    store.apply("k", Update::with(|_: Option<&Counter>| Next::Refresh)).unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    let after = store.get::<Counter>("k");
    assert!(matches!((before, after), (Some(b), Some(a)) if Arc::ptr_eq(&b, &a)));
}

/// Test that a refresh keeps a value written while its updater ran.
#[test]
fn refresh_keeps_value_written_by_updater() {
    let store = Store::new();
    store.set("k", 1_i32);
    let (_, hits) = watch(&store, "k");

    let inner = store.clone();
    store
        .update("k", move |_: Option<&i32>| {
            inner.set("k", 2_i32);
            Next::Refresh
        })
        .unwrap();

    assert_eq!(store.get::<i32>("k").as_deref(), Some(&2));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

/// Test that a hook without a selector re-renders on refresh.
#[test]
fn refresh_rerenders_unselected_hook() {
    let store = Store::new();
    let (host, renders) = counting_host();
    let mut state = use_shared_state(&store, "k", host, UseOptions::new().initial(5_i32));
    state.on_mount();

    state.render().setter().refresh();
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert_eq!(state.render().value(), Some(&5));
}

/// Test that typed access to a slot of another type is reported.
#[test]
fn type_mismatch_is_reported() {
    let store = Store::new();
    store.set("k", 1_i32);

    assert!(store.get::<String>("k").is_none());
    assert!(matches!(
        store.try_get::<String>("k"),
        Err(StoreError::TypeMismatch { .. })
    ));
    assert!(store
        .update("k", |s: Option<&String>| Next::Value(s.cloned().unwrap_or_default()))
        .is_err());
    assert_eq!(store.get::<i32>("k").as_deref(), Some(&1));
}

/// Test that two instances seeding the same key resolve by policy.
#[test]
fn seeding_race_follows_policy() {
    let store = Store::new();
    let (host, _) = counting_host();
    let mut first = use_shared_state(&store, "k", host.clone(), UseOptions::new().initial(1_i32));
    let mut second = use_shared_state(&store, "k", host, UseOptions::new().initial(2_i32));
    assert_eq!(first.render().value(), Some(&1));
    assert_eq!(second.render().value(), Some(&1));

    let config = StoreConfig::from_json(r#"{ "seed_policy": "last_writer_wins" }"#).unwrap();
    assert_eq!(config.seed_policy, SeedPolicy::LastWriterWins);
    let store = Store::with_config(config);
    let (host, _) = counting_host();
    let _first = use_shared_state(&store, "k", host.clone(), UseOptions::new().initial(1_i32));
    let _second = use_shared_state(&store, "k", host, UseOptions::new().initial(2_i32));
    assert_eq!(store.get::<i32>("k").as_deref(), Some(&2));
}

/// Test a consumer and a hook sharing one slot.
#[test]
fn consumer_and_hook_share_state() {
    let store = Store::new();
    let manager = StateManager::new(&store, "doc", doc(0, "a"));

    let (host, writer_renders) = counting_host();
    let mut writer = manager.use_state(host);
    writer.on_mount();

    let (host, reader_renders) = counting_host();
    let mut reader: Consumer<Doc, String> = Consumer::new(
        &store,
        "doc",
        host,
        Some(Selector::new(|d: Option<&Doc>| d.map(|d| d.text.clone()))),
        Children::render(|d: Option<&Doc>| d.map(|d| d.text.to_uppercase()).unwrap_or_default()),
    );
    reader.on_mount();
    assert_eq!(reader.render(), "A");

    writer.render().setter().set(doc(1, "a"));
    assert_eq!(writer_renders.load(Ordering::SeqCst), 1);
    assert_eq!(reader_renders.load(Ordering::SeqCst), 0);

    manager.set_state(doc(1, "b"));
    assert_eq!(reader_renders.load(Ordering::SeqCst), 1);
    assert_eq!(reader.render(), "B");

    reader.on_unmount();
    writer.on_unmount();
    assert_eq!(store.subscriber_count("doc"), 0);
}

/// Test that the process-wide store is shared between handles.
#[test]
fn global_store_is_shared() {
    let key = "integration::global_store_is_shared";
    Store::global().set(key, 42_u32);
    assert_eq!(Store::global().get::<u32>(key).as_deref(), Some(&42));
    assert!(Store::global().delete(key));
}
