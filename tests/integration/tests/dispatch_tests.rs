//! Dispatch integration tests
//!
//! Exercise the registry, dispatcher, reclassifier and completion emitter
//! together, the way the gateway and invocation layers drive them.
//!
//! Run with: cargo test -p integration-tests --test dispatch_tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use events_core::{
    component_events, derive_dispatch_key, ButtonPressed, Connect, ContextKind, ErrorEvent, Event,
    EventName, GatewayPayload, RawGatewayEvent, Ready, ShardConnect, WebsocketReady,
};
use events_dispatch::{listener_fn, DispatchError, Dispatcher, Listener, ListenerOptions};
use integration_tests::{fixtures, test_config, test_dispatcher, Recorder};
use serde_json::json;
use tokio::sync::Notify;

#[derive(Debug, thiserror::Error)]
#[error("database unavailable (attempt {attempt})")]
struct DatabaseDown {
    attempt: u32,
}

// ============================================================================
// Naming
// ============================================================================

#[test]
fn test_dispatch_key_derivation() {
    let cases = [
        ("ButtonPressed", "button_pressed"),
        ("WebsocketReady", "websocket_ready"),
        ("Ready", "ready"),
        ("ShardConnect", "shard_connect"),
        ("AutocompleteCompletion", "autocomplete_completion"),
        ("RawGatewayEvent", "raw_gateway_event"),
    ];
    for (type_name, key) in cases {
        assert_eq!(derive_dispatch_key(type_name), key, "{type_name}");
    }

    assert_eq!(ButtonPressed::event_name(), "button_pressed");
    assert_eq!(WebsocketReady::event_name(), "websocket_ready");
    assert_eq!(Ready::event_name(), "ready");
    assert_ne!(ShardConnect::event_name(), Connect::event_name());
}

// ============================================================================
// Registration and dispatch
// ============================================================================

#[tokio::test]
async fn test_listener_receives_the_event_once() {
    let (dispatcher, _) = test_dispatcher();
    let (recorder, seen) = Recorder::new("ready");
    dispatcher.register(Ready::event_name(), recorder);

    let event: Arc<dyn Event> = Arc::new(Ready);
    assert_eq!(dispatcher.dispatch_arc(Arc::clone(&event)), 1);
    dispatcher.drain().await;

    let events = seen.events();
    assert_eq!(events.len(), 1);
    assert!(Arc::ptr_eq(&events[0], &event));
}

#[tokio::test]
async fn test_wildcard_listener_receives_everything() {
    let (dispatcher, _) = test_dispatcher();
    let (all, everything) = Recorder::new("all");
    let (specific, connects) = Recorder::new("connects");
    dispatcher.register("*", all);
    dispatcher.register("on_connect", specific);

    dispatcher.dispatch(Connect);
    dispatcher.dispatch(ShardConnect::new(2));
    dispatcher.dispatch(RawGatewayEvent::named("raw_typing_start", Default::default()));
    dispatcher.drain().await;

    let mut names = everything.names();
    names.sort();
    assert_eq!(names, ["connect", "raw_typing_start", "shard_connect"]);
    assert_eq!(connects.names(), ["connect"]);
}

#[tokio::test]
async fn test_component_interaction_fans_out() {
    let (dispatcher, _) = test_dispatcher();
    let (recorder, seen) = Recorder::new("all");
    dispatcher.register("*", recorder);

    let ctx = Arc::new(fixtures::select("colour", &["red", "blue"]));
    for event in component_events(&ctx) {
        dispatcher.dispatch_arc(event);
    }
    dispatcher.drain().await;

    assert_eq!(seen.count("component"), 1);
    assert_eq!(seen.count("select"), 1);
}

#[tokio::test]
async fn test_gateway_payloads() {
    let (dispatcher, _) = test_dispatcher();
    let (recorder, seen) = Recorder::new("all");
    dispatcher.register("*", recorder);

    dispatcher
        .dispatch_json(r#"{"op":0,"t":"READY","s":1,"d":{"session_id":"abc","v":10}}"#)
        .unwrap();
    dispatcher.dispatch_payload(GatewayPayload::dispatch(
        "GUILD_CREATE",
        2,
        json!({"id": "81384788765712384"}),
    ));
    dispatcher.drain().await;

    assert_eq!(seen.count("raw_ready"), 1);
    assert_eq!(seen.count("websocket_ready"), 1);
    assert_eq!(seen.count("raw_guild_create"), 1);

    let ready = seen
        .events()
        .into_iter()
        .find_map(|e| {
            e.downcast_ref::<WebsocketReady>()
                .and_then(|r| r.session_id().map(String::from))
        });
    assert_eq!(ready.as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_unregister_during_dispatch() {
    let (dispatcher, _) = test_dispatcher();
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let runs = Arc::new(AtomicUsize::new(0));

    let handle = {
        let (started, release, runs) = (started.clone(), release.clone(), runs.clone());
        dispatcher.register(
            "shard_connect",
            listener_fn("slow", move |_| {
                let (started, release, runs) = (started.clone(), release.clone(), runs.clone());
                async move {
                    started.notify_one();
                    release.notified().await;
                    runs.fetch_add(1, Ordering::SeqCst);
                    anyhow::Ok(())
                }
            }),
        )
    };

    dispatcher.dispatch(ShardConnect::new(0));
    started.notified().await;

    assert!(dispatcher.unregister(&handle));
    release.notify_one();
    dispatcher.drain().await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    assert_eq!(dispatcher.dispatch(ShardConnect::new(0)), 0);
    dispatcher.drain().await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_listener_registered_during_dispatch_misses_the_event() {
    let (dispatcher, _) = test_dispatcher();
    let (late, seen) = Recorder::new("late");
    let late: Arc<dyn Listener> = late;
    let registered = Arc::new(AtomicBool::new(false));

    {
        let (held, registered) = (dispatcher.clone(), registered.clone());
        dispatcher.register(
            "connect",
            listener_fn("registers", move |_| {
                let (held, late, registered) = (held.clone(), late.clone(), registered.clone());
                async move {
                    if !registered.swap(true, Ordering::SeqCst) {
                        held.register("connect", late);
                    }
                    anyhow::Ok(())
                }
            }),
        );
    }

    dispatcher.dispatch(Connect);
    dispatcher.drain().await;
    assert!(registered.load(Ordering::SeqCst));
    assert!(seen.is_empty());

    assert_eq!(dispatcher.dispatch(Connect), 2);
    dispatcher.drain().await;
    assert_eq!(seen.names(), ["connect"]);

    dispatcher.close().await.unwrap();
}

#[tokio::test]
async fn test_listener_can_dispatch_its_own_event_type() {
    let (dispatcher, reporter) = test_dispatcher();
    let shards = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let ran_inline = Arc::new(AtomicBool::new(false));

    {
        let (held, shards, ran_inline) = (dispatcher.clone(), shards.clone(), ran_inline.clone());
        dispatcher.listen(move |event: Arc<ShardConnect>| {
            let (held, shards, ran_inline) = (held.clone(), shards.clone(), ran_inline.clone());
            async move {
                shards.lock().push(event.shard_id);
                if event.shard_id == 0 {
                    let before = shards.lock().len();
                    assert_eq!(held.dispatch(ShardConnect::new(1)), 1);
                    // The nested invocation is only scheduled, never run in place
                    ran_inline.store(shards.lock().len() != before, Ordering::SeqCst);
                }
                anyhow::Ok(())
            }
        });
    }

    dispatcher.dispatch(ShardConnect::new(0));
    dispatcher.drain().await;

    let mut seen = shards.lock().clone();
    seen.sort_unstable();
    assert_eq!(seen, [0, 1]);
    assert!(!ran_inline.load(Ordering::SeqCst));
    assert_eq!(dispatcher.dispatched(), 2);
    assert_eq!(reporter.count(), 0);

    dispatcher.close().await.unwrap();
}

// ============================================================================
// Failure isolation and reclassification
// ============================================================================

#[tokio::test]
async fn test_failing_listener_produces_one_typed_error() {
    let (dispatcher, reporter) = test_dispatcher();
    let (sibling, sibling_seen) = Recorder::new("sibling");
    let (errors, error_seen) = Recorder::new("errors");

    dispatcher.register(
        "button_pressed",
        listener_fn("flaky", |_| async {
            Err::<(), _>(anyhow::Error::new(DatabaseDown { attempt: 3 }))
        }),
    );
    dispatcher.register("button_pressed", sibling);
    dispatcher.register("component_error", errors);

    let ctx = Arc::new(fixtures::button("confirm"));
    dispatcher.dispatch(ButtonPressed {
        ctx: Arc::clone(&ctx),
    });
    dispatcher.drain().await;

    assert_eq!(sibling_seen.names(), ["button_pressed"]);
    assert_eq!(error_seen.len(), 1);
    assert_eq!(reporter.count(), 0);

    let events = error_seen.events();
    let error = events[0].downcast_ref::<ErrorEvent>().unwrap();
    assert_eq!(error.kind(), ContextKind::Component);
    assert_eq!(
        error.failure().downcast_ref::<DatabaseDown>().map(|e| e.attempt),
        Some(3)
    );
    match error {
        ErrorEvent::Component(component) => assert!(Arc::ptr_eq(&component.ctx, &ctx)),
        other => panic!("expected a component error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_listener_panic_is_contained() {
    let (dispatcher, _) = test_dispatcher();
    let (errors, error_seen) = Recorder::new("errors");
    let (sibling, sibling_seen) = Recorder::new("sibling");

    dispatcher.register("connect", listener_fn("panics", panicking));
    dispatcher.register("connect", sibling);
    dispatcher.register("error", errors);

    dispatcher.dispatch(Connect);
    dispatcher.drain().await;

    assert_eq!(sibling_seen.len(), 1);
    let events = error_seen.events();
    assert_eq!(events.len(), 1);

    let error = events[0].downcast_ref::<ErrorEvent>().unwrap();
    assert!(error.failure().is_panic());
    assert!(error.source().is_some_and(|s| s.contains("panics") && s.contains("connect")));
}

async fn panicking(_event: Arc<dyn Event>) -> anyhow::Result<()> {
    panic!("listener blew up")
}

#[tokio::test]
async fn test_failing_error_listener_does_not_recurse() {
    let (dispatcher, reporter) = test_dispatcher();
    let (error_listener, error_seen) = Recorder::failing("bad_error_handler", "still broken");

    dispatcher.register(
        "connect",
        listener_fn("bad", |_| async { Err::<(), _>(anyhow::anyhow!("first failure")) }),
    );
    dispatcher.register("error", error_listener);

    dispatcher.dispatch(Connect);
    dispatcher.drain().await;

    // One error event, one double fault, then silence
    assert_eq!(error_seen.len(), 1);
    assert_eq!(reporter.count(), 1);
    assert!(reporter.sources()[0].contains("bad_error_handler"));
    assert_eq!(dispatcher.pending(), 0);
}

#[tokio::test]
async fn test_error_chain_is_bounded() {
    let (dispatcher, reporter) = test_dispatcher();
    let (command_errors, command_seen) = Recorder::failing("command_errors", "oops");
    let (generic_errors, generic_seen) = Recorder::failing("generic_errors", "oops again");
    dispatcher.register("command_error", command_errors);
    dispatcher.register("error", generic_errors);

    let outcome = dispatcher
        .invoke(fixtures::command("deploy"), async {
            Err::<(), _>(anyhow::anyhow!("deploy failed"))
        })
        .await;
    dispatcher.drain().await;

    assert!(!outcome.is_completed());
    assert_eq!(command_seen.len(), 1);
    assert_eq!(generic_seen.len(), 1);
    assert_eq!(reporter.count(), 1);

    // The generic error keeps the command context
    let events = generic_seen.events();
    let generic = events[0].downcast_ref::<ErrorEvent>().unwrap();
    assert_eq!(generic.kind(), ContextKind::None);
    assert_eq!(generic.context().map(|c| c.kind()), Some(ContextKind::Command));
}

// ============================================================================
// Invocation boundary
// ============================================================================

#[tokio::test]
async fn test_successful_command_completes_once() {
    let (dispatcher, _) = test_dispatcher();
    let (recorder, seen) = Recorder::new("all");
    dispatcher.register("*", recorder);

    let outcome = dispatcher
        .invoke(fixtures::command("ping"), async { anyhow::Ok(()) })
        .await;
    dispatcher.drain().await;

    assert!(outcome.is_completed());
    assert_eq!(seen.names(), ["command_completion"]);
}

#[tokio::test]
async fn test_failing_command_reports_once() {
    let (dispatcher, _) = test_dispatcher();
    let (recorder, seen) = Recorder::new("all");
    dispatcher.register("*", recorder);

    let (args, kwargs) = fixtures::call_args();
    let outcome = dispatcher
        .invoker()
        .run(fixtures::command("ban"), args.clone(), kwargs.clone(), async {
            Err::<(), _>(anyhow::Error::new(DatabaseDown { attempt: 1 }))
        })
        .await;
    dispatcher.drain().await;

    assert_eq!(seen.names(), ["command_error"]);
    assert_eq!(seen.count("command_completion"), 0);

    let events = seen.events();
    let error = events[0].downcast_ref::<ErrorEvent>().unwrap();
    let failure = outcome.failure().unwrap();
    assert!(error.failure().same_failure(failure));
    assert_eq!(error.args(), args.as_slice());
    assert_eq!(error.kwargs(), &kwargs);
}

#[tokio::test]
async fn test_each_context_has_its_own_events() {
    let (dispatcher, _) = test_dispatcher();
    let (recorder, seen) = Recorder::new("all");
    dispatcher.register("*", recorder);

    dispatcher
        .invoke(fixtures::autocomplete("search", "query", "ru"), async { anyhow::Ok(()) })
        .await;
    dispatcher
        .invoke(fixtures::modal("report"), async { anyhow::Ok(()) })
        .await;
    dispatcher
        .invoke(fixtures::autocomplete("search", "query", "rus"), async {
            Err::<(), _>(anyhow::anyhow!("index offline"))
        })
        .await;
    dispatcher
        .invoke(fixtures::modal("report"), async {
            Err::<(), _>(anyhow::anyhow!("too long"))
        })
        .await;
    dispatcher.drain().await;

    assert_eq!(seen.count("autocomplete_completion"), 1);
    assert_eq!(seen.count("modal_completion"), 1);
    assert_eq!(seen.count("autocomplete_error"), 1);
    assert_eq!(seen.count("modal_error"), 1);
    assert_eq!(seen.len(), 4);
}

// ============================================================================
// Defaults, readiness and waiting
// ============================================================================

#[tokio::test]
async fn test_user_listener_replaces_default_handler() {
    let dispatcher = Dispatcher::new().unwrap();
    let defaults = dispatcher.registry().listeners_for("error");
    assert!(defaults.iter().all(|l| l.options.is_default));

    let (recorder, _) = Recorder::new("mine");
    dispatcher.register("on_error", recorder);

    let names: Vec<String> = dispatcher
        .registry()
        .listeners_for("error")
        .iter()
        .map(|l| l.name().to_string())
        .collect();
    assert_eq!(names, ["mine"]);
}

#[tokio::test]
async fn test_configured_delay_until_ready() {
    let config = events_common::DispatchConfig {
        delay_until_ready: true,
        ..test_config()
    };
    let dispatcher = Dispatcher::builder().config(config).build().unwrap();
    let (recorder, seen) = Recorder::new("connects");
    dispatcher.register("connect", recorder);
    let (errors, error_seen) = Recorder::new("errors");
    dispatcher.register_with("error", errors, ListenerOptions::new().delay_until_ready(true));

    dispatcher.dispatch(Connect);
    dispatcher
        .reclassifier()
        .report(anyhow::anyhow!("early").into(), None, Vec::new(), Default::default(), "boot");

    // Errors bypass the gate, so this one arrives before readiness
    tokio::time::timeout(Duration::from_secs(1), async {
        while error_seen.is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert!(seen.is_empty());

    dispatcher.dispatch(Ready);
    dispatcher.drain().await;
    assert_eq!(seen.names(), ["connect"]);
}

#[tokio::test]
async fn test_wait_for_raw_event() {
    let (dispatcher, _) = test_dispatcher();

    let waiting = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            dispatcher
                .wait_for(
                    "raw_message_create",
                    |e| {
                        e.downcast_ref::<RawGatewayEvent>()
                            .and_then(|raw| raw.get("content"))
                            == Some(&json!("!ping"))
                    },
                    Some(Duration::from_secs(5)),
                )
                .await
        })
    };

    while !waiting.is_finished() {
        for content in ["hello", "!ping"] {
            dispatcher.dispatch_payload(GatewayPayload::dispatch(
                "MESSAGE_CREATE",
                1,
                json!({ "content": content }),
            ));
        }
        tokio::task::yield_now().await;
    }

    let event = waiting.await.unwrap().unwrap();
    assert_eq!(event.resolved_name(), "raw_message_create");
}

#[tokio::test]
async fn test_close_stops_dispatch() {
    let (dispatcher, _) = test_dispatcher();
    let (recorder, seen) = Recorder::new("all");
    dispatcher.register("*", recorder);

    dispatcher.dispatch(Connect);
    dispatcher.drain().await;
    dispatcher.close().await.unwrap();

    assert_eq!(dispatcher.dispatch(Connect), 0);
    assert_eq!(seen.len(), 1);
    assert!(dispatcher.is_shut_down());
    assert!(matches!(
        dispatcher.wait_for("connect", |_| true, None).await,
        Err(DispatchError::ShutDown)
    ));
}
