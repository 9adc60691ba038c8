//! A minimal Absinthe-speaking test server, in the style of the reconnecting
//! RPC client's own `run_server`/`run_server_with_settings` harness: bind a
//! loopback listener, hand back its address plus a shutdown sender, and
//! accept connections until told to stop.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Start a server on a fresh ephemeral port. Returns its `ws://` URL and a
/// sender that tears down every open connection and stops the accept loop
/// when dropped or sent to.
pub async fn run_server() -> (String, broadcast::Sender<()>) {
    run_server_on(None).await
}

/// Start a server, optionally rebinding the exact address a previous server
/// used (to simulate a restart the client should transparently reconnect
/// to).
pub async fn run_server_on(addr: Option<std::net::SocketAddr>) -> (String, broadcast::Sender<()>) {
    let listener = match addr {
        Some(addr) => bind_retrying(addr).await,
        None => TcpListener::bind("127.0.0.1:0").await.expect("bind"),
    };
    let local_addr = listener.local_addr().expect("local_addr");
    let (shutdown_tx, _) = broadcast::channel(4);
    let accept_shutdown = shutdown_tx.clone();

    tokio::spawn(async move {
        let mut rx = accept_shutdown.subscribe();
        loop {
            tokio::select! {
                biased;
                _ = rx.recv() => break,
                accepted = listener.accept() => {
                    let Ok((stream, _)) = accepted else { continue };
                    let conn_shutdown = accept_shutdown.subscribe();
                    tokio::spawn(serve_connection(stream, conn_shutdown));
                }
            }
        }
    });

    (format!("ws://{local_addr}"), shutdown_tx)
}

async fn bind_retrying(addr: std::net::SocketAddr) -> TcpListener {
    for _ in 0..20 {
        if let Ok(listener) = TcpListener::bind(addr).await {
            return listener;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("address {addr} never became free");
}

async fn serve_connection(stream: tokio::net::TcpStream, mut shutdown: broadcast::Receiver<()>) {
    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    let (mut sink, mut source) = ws.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Value>();
    let mut next_data_ref: u64 = 0;
    let mut sub_tasks: Vec<tokio::task::JoinHandle<()>> = Vec::new();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            outbound = out_rx.recv() => {
                let Some(frame) = outbound else { break };
                if sink.send(WsMessage::Text(frame.to_string())).await.is_err() {
                    break;
                }
            }
            msg = source.next() => {
                let Some(Ok(WsMessage::Text(text))) = msg else { break };
                let Ok(frame) = serde_json::from_str::<Value>(&text) else { continue };
                handle_frame(&frame, &out_tx, &mut next_data_ref, &mut sub_tasks);
            }
        }
    }

    for task in sub_tasks {
        task.abort();
    }
}

/// Handle one inbound frame, sending the `phx_reply` (and, for a
/// subscription doc, spawning the task that pushes `subscription:data`
/// frames) onto `out_tx`.
fn handle_frame(
    frame: &Value,
    out_tx: &mpsc::UnboundedSender<Value>,
    next_data_ref: &mut u64,
    sub_tasks: &mut Vec<tokio::task::JoinHandle<()>>,
) {
    let (Some(join_ref), Some(push_ref), Some(topic), Some(event)) = (
        frame.get("join_ref").and_then(Value::as_str),
        frame.get("ref").and_then(Value::as_str),
        frame.get("topic").and_then(Value::as_str),
        frame.get("event").and_then(Value::as_str),
    ) else {
        return;
    };
    let payload = frame.get("payload").cloned().unwrap_or(Value::Null);

    match event {
        "phx_join" => {
            let _ = out_tx.send(reply_frame(join_ref, push_ref, topic, json!({})));
        }
        "doc" => {
            let query = payload.get("query").and_then(Value::as_str).unwrap_or("");
            if query.contains("subscription") {
                *next_data_ref += 1;
                let subscription_id = format!("sub-{next_data_ref}");
                let data_tx = out_tx.clone();
                let sub_id = subscription_id.clone();
                sub_tasks.push(tokio::spawn(async move {
                    for i in 0.. {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        let frame = json!({
                            "join_ref": Value::Null,
                            "ref": Value::Null,
                            "topic": sub_id,
                            "event": "subscription:data",
                            "payload": { "result": { "data": { "tick": i } } },
                        });
                        if data_tx.send(frame).is_err() {
                            break;
                        }
                    }
                }));
                let _ = out_tx.send(reply_frame(
                    join_ref,
                    push_ref,
                    topic,
                    json!({ "subscriptionId": subscription_id }),
                ));
            } else {
                let _ = out_tx.send(reply_frame(
                    join_ref,
                    push_ref,
                    topic,
                    json!({ "data": { "echo": query } }),
                ));
            }
        }
        "unsubscribe" => {
            let _ = out_tx.send(reply_frame(join_ref, push_ref, topic, json!({})));
        }
        _ => {}
    }
}

fn reply_frame(join_ref: &str, push_ref: &str, topic: &str, response: Value) -> Value {
    json!({
        "join_ref": join_ref,
        "ref": push_ref,
        "topic": topic,
        "event": "phx_reply",
        "payload": { "status": "ok", "response": response },
    })
}
