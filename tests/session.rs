//! Integration tests driving [`absinthe_client::Session`] against the local
//! test server in `tests/common`, mirroring the reconnecting RPC client's
//! own `call_works`/`sub_works`/`sub_with_reconnect` scenarios.

mod common;

use std::time::Duration;

use absinthe_client::{CallerEvent, Config, PushOutcome, ReplyStatus, Session};
use serde_json::json;

#[tokio::test]
async fn push_sync_returns_a_reply() {
    let (url, _shutdown) = common::run_server().await;
    let session = Session::connect(Config::new(url).unwrap(), std::future::pending())
        .await
        .unwrap();
    let (caller, _events) = session.register_caller();

    let outcome = session
        .query(&caller, "query { ping }", Some(json!({})))
        .await;

    match outcome {
        PushOutcome::Reply { status, payload } => {
            assert_eq!(status, ReplyStatus::Ok);
            assert_eq!(payload["data"]["echo"], "query { ping }");
        }
        other => panic!("expected a reply, got {other:?}"),
    }
}

#[tokio::test]
async fn subscription_delivers_data_frames() {
    let (url, _shutdown) = common::run_server().await;
    let session = Session::connect(Config::new(url).unwrap(), std::future::pending())
        .await
        .unwrap();
    let (caller, mut events) = session.register_caller();

    session
        .subscribe(&caller, "subscription { tick }", None, json!("tick-sub"))
        .unwrap();

    let first = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("subscription data should arrive")
        .expect("mailbox should stay open");

    match first {
        CallerEvent::Reply { status, caller_ref, .. } => {
            assert_eq!(status, ReplyStatus::Ok);
            assert_eq!(caller_ref, Some(json!("tick-sub")));
            let second = tokio::time::timeout(Duration::from_secs(2), events.recv())
                .await
                .expect("subscription data should arrive")
                .expect("mailbox should stay open");
            assert_message(second);
        }
        CallerEvent::Message { .. } => assert_message(first),
    }
}

fn assert_message(event: CallerEvent) {
    match event {
        CallerEvent::Message { event, caller_ref, payload, .. } => {
            assert_eq!(event, "subscription:data");
            assert_eq!(caller_ref, Some(json!("tick-sub")));
            assert!(payload["result"]["data"]["tick"].is_number());
        }
        other => panic!("expected subscription data, got {other:?}"),
    }
}

#[tokio::test]
async fn subscription_survives_reconnect() {
    let (url, shutdown) = common::run_server().await;
    let addr: std::net::SocketAddr = url.trim_start_matches("ws://").parse().unwrap();

    let session = Session::connect(Config::new(&url).unwrap(), std::future::pending())
        .await
        .unwrap();
    let (caller, mut events) = session.register_caller();

    session
        .subscribe(&caller, "subscription { tick }", None, json!("tick-sub"))
        .unwrap();

    // Drain the initial reply and at least one data frame before breaking
    // the connection.
    let _ = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap();
    let _ = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap();

    // Kill every connection the first server holds open.
    let _ = shutdown.send(());
    drop(shutdown);

    // Restart on the same address; the session should reconnect, rejoin,
    // and re-subscribe without the caller lifting a finger.
    let (_url, _new_shutdown) = common::run_server_on(Some(addr)).await;

    let resumed = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Some(CallerEvent::Message { .. }) = events.recv().await {
                return;
            }
        }
    })
    .await;

    assert!(resumed.is_ok(), "subscription should resume after reconnect");
}

#[tokio::test]
async fn unsubscribe_all_stops_delivery_and_is_idempotent() {
    let (url, _shutdown) = common::run_server().await;
    let session = Session::connect(Config::new(url).unwrap(), std::future::pending())
        .await
        .unwrap();
    let (caller, mut events) = session.register_caller();

    session
        .subscribe(&caller, "subscription { tick }", None, json!("tick-sub"))
        .unwrap();

    // Drain the subscribe reply and at least one data frame.
    let _ = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap();
    let _ = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap();

    session.unsubscribe_all(&caller, Some(json!("u1"))).unwrap();

    let unsub_reply = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("unsubscribe reply should arrive")
        .expect("mailbox should stay open");
    match unsub_reply {
        CallerEvent::Reply { event, status, caller_ref, .. } => {
            assert_eq!(event, "unsubscribe");
            assert_eq!(status, ReplyStatus::Ok);
            assert_eq!(caller_ref, Some(json!("u1")));
        }
        other => panic!("expected an unsubscribe reply, got {other:?}"),
    }

    // No further data frames for the dropped subscription: a short wait
    // with nothing arriving is the only observable proof of "nothing more
    // comes" for a negative property like this.
    let nothing = tokio::time::timeout(Duration::from_millis(100), events.recv()).await;
    assert!(nothing.is_err(), "no further events expected after unsubscribe_all");

    // A second call has nothing left to unsubscribe, so it is a no-op: no
    // further unsubscribe push goes out, and the mailbox stays quiet.
    session.unsubscribe_all(&caller, Some(json!("u2"))).unwrap();
    let nothing = tokio::time::timeout(Duration::from_millis(100), events.recv()).await;
    assert!(nothing.is_err(), "repeated unsubscribe_all should be a no-op");
}

#[tokio::test]
async fn owner_down_terminates_the_session() {
    let (url, _shutdown) = common::run_server().await;
    let (owner_done_tx, owner_done_rx) = tokio::sync::oneshot::channel::<()>();
    let owner_done = async move {
        let _ = owner_done_rx.await;
    };

    let session = Session::connect(Config::new(url).unwrap(), owner_done)
        .await
        .unwrap();
    let (caller, _events) = session.register_caller();

    session
        .subscribe(&caller, "subscription { tick }", None, json!("tick-sub"))
        .unwrap();

    // Give the actor a moment to join and transmit before killing the owner.
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(owner_done_tx);

    // The actor shuts down and drops its command receiver; further pushes
    // on this (now orphaned) session handle fail rather than hang.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let outcome = session.query(&caller, "query { ping }", None).await;
    assert!(matches!(outcome, PushOutcome::Timeout | PushOutcome::NotJoined));
}

#[tokio::test]
async fn push_sync_reports_not_joined_once_retries_are_exhausted() {
    // Nothing is listening on this port, so the control channel never
    // joins; push_sync should give up after its bounded retries rather
    // than hang forever.
    let config = Config::new("ws://127.0.0.1:9/socket/websocket")
        .unwrap()
        .with_join_wait(2, Duration::from_millis(10))
        .with_receive_timeout(Duration::from_millis(200));
    let session = Session::connect(config, std::future::pending()).await.unwrap();
    let (caller, _events) = session.register_caller();

    let outcome = session
        .query(&caller, "query { ping }", Some(json!({})))
        .await;

    assert!(
        matches!(outcome, PushOutcome::NotJoined),
        "expected NotJoined once join-wait retries are exhausted, got {outcome:?}"
    );
}
