use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::{sync::mpsc, time};
use tokio_util::sync::CancellationToken;

use super::connection::WsConnection;
use super::hub::NotificationHub;
use crate::config;

/// How long a closing socket gets to accept its Close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

pub struct WsServerOptions {
    pub ws_ping_sec: u64,
    pub outbound_buffer: usize,
}

impl WsServerOptions {
    pub fn from_config() -> Self {
        Self {
            ws_ping_sec: config::ws_ping_seconds(),
            outbound_buffer: config::ws_outbound_buffer(),
        }
    }
}

/// Drives one notification socket from attach to detach.
///
/// The socket is registered with the hub as a `WsConnection` over a bounded
/// outbound queue. Whether the client leaves, errors, or the hub drops it
/// after a failed send, the socket ends up unregistered exactly once and the
/// writer, ping and reader all stop.
pub async fn serve_notifications(socket: WebSocket, hub: NotificationHub, opts: WsServerOptions) {
    let (mut sink, mut socket_rx) = socket.split();
    let closed = CancellationToken::new();

    // Outbound queue and writer task
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(opts.outbound_buffer.max(1));
    let writer_task = {
        let closed = closed.clone();
        tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    biased;
                    _ = closed.cancelled() => break,
                    frame = out_rx.recv() => match frame {
                        Some(frame) => frame,
                        None => return,
                    },
                };
                tokio::select! {
                    biased;
                    _ = closed.cancelled() => break,
                    res = sink.send(frame) => {
                        if res.is_err() {
                            return;
                        }
                    }
                }
            }
            // A stalled peer will not take this either; give up after the grace period.
            let _ = time::timeout(CLOSE_GRACE, sink.send(Message::Close(None))).await;
        })
    };

    let id = match hub
        .register(WsConnection::new(out_tx.clone(), closed.clone()))
        .await
    {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Refusing notification socket: {e}");
            drop(out_tx);
            let _ = writer_task.await;
            return;
        }
    };
    tracing::info!(connection = id, "Notification socket attached");

    // WS-level periodic ping
    let ping_task = {
        let out_tx = out_tx.clone();
        tokio::spawn(async move {
            loop {
                time::sleep(Duration::from_secs(opts.ws_ping_sec)).await;
                if out_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        })
    };

    // C→S: clients only talk to keep the link alive
    loop {
        let msg = tokio::select! {
            _ = closed.cancelled() => {
                tracing::info!(connection = id, "Notification socket dropped by hub");
                break;
            }
            msg = socket_rx.next() => match msg {
                Some(Ok(msg)) => msg,
                _ => break,
            },
        };
        match msg {
            Message::Text(text) => {
                if is_app_ping(text.as_str()) {
                    let pong = serde_json::json!({
                        "type": "pong",
                        "ts": Utc::now().to_rfc3339(),
                    })
                    .to_string();
                    if out_tx.send(Message::Text(pong.into())).await.is_err() {
                        break;
                    }
                }
            }
            Message::Ping(payload) => {
                if out_tx.send(Message::Pong(payload)).await.is_err() {
                    break;
                }
            }
            Message::Pong(_) => {}
            Message::Binary(_) => {
                tracing::warn!(connection = id, "Ignoring binary frame on notification socket");
            }
            Message::Close(_) => break,
        }
    }

    let _ = hub.unregister(id).await;
    closed.cancel();
    ping_task.abort();
    drop(out_tx);
    let _ = writer_task.await;
    tracing::info!(connection = id, "Notification socket detached");
}

fn is_app_ping(raw: &str) -> bool {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        if let Some(Value::String(t)) = map.get("type") {
            return t == "ping";
        }
    }
    false
}
