//! Single-owner broadcast hub for notification listeners.
//!
//! One task owns the set of live connections. Registration, removal and
//! publishing are commands on a bounded queue and are applied strictly one at
//! a time, so the set is never touched concurrently and every listener sees
//! publishes in queue order. Handles are cheap to clone and safe to use from
//! any task.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Utf8Bytes;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::connection::Connection;
use super::event::NotificationEvent;

/// Stable handle for a registered connection.
pub type ConnectionId = u64;

#[derive(Debug, Error)]
pub enum HubError {
    /// The owner task has stopped; nothing is delivered anymore.
    #[error("notification hub is closed")]
    Closed,
    #[error("failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),
}

enum Command {
    Register {
        id: ConnectionId,
        connection: Box<dyn Connection>,
    },
    Unregister {
        id: ConnectionId,
    },
    Publish {
        frame: Utf8Bytes,
    },
    Count {
        reply: oneshot::Sender<usize>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a running hub.
#[derive(Clone)]
pub struct NotificationHub {
    tx: mpsc::Sender<Command>,
    next_id: Arc<AtomicU64>,
}

impl NotificationHub {
    /// Starts the owner task and returns a handle to it.
    ///
    /// `queue_capacity` bounds the number of pending commands; callers wait
    /// for room when it is full. Must be called inside a Tokio runtime.
    pub fn spawn(queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        tokio::spawn(HubOwner::default().run(rx));
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Adds `connection` to the live set. It takes part in every publish
    /// queued after this call.
    pub async fn register<C: Connection>(&self, connection: C) -> Result<ConnectionId, HubError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cmd = Command::Register {
            id,
            connection: Box::new(connection),
        };
        if let Err(mpsc::error::SendError(cmd)) = self.tx.send(cmd).await {
            if let Command::Register { connection, .. } = cmd {
                connection.close();
            }
            return Err(HubError::Closed);
        }
        Ok(id)
    }

    /// Removes and closes the connection. Unknown or already removed ids are ignored.
    pub async fn unregister(&self, id: ConnectionId) -> Result<(), HubError> {
        self.send(Command::Unregister { id }).await
    }

    /// Encodes `event` once and queues it for every live connection.
    ///
    /// Returns as soon as the event is queued; delivery failures are handled
    /// inside the hub and never reported here.
    pub async fn publish(&self, event: &NotificationEvent) -> Result<(), HubError> {
        let frame = Utf8Bytes::from(serde_json::to_string(event)?);
        self.send(Command::Publish { frame }).await
    }

    /// Number of live connections once every previously queued command is applied.
    pub async fn connection_count(&self) -> Result<usize, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Count { reply }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Closes every connection and stops the owner task.
    pub async fn shutdown(&self) -> Result<(), HubError> {
        let (done, rx) = oneshot::channel();
        self.send(Command::Shutdown { done }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    async fn send(&self, cmd: Command) -> Result<(), HubError> {
        self.tx.send(cmd).await.map_err(|_| HubError::Closed)
    }
}

#[derive(Default)]
struct HubOwner {
    connections: HashMap<ConnectionId, Box<dyn Connection>>,
}

impl HubOwner {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        tracing::info!("Notification hub started");
        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::Register { id, connection } => {
                    self.connections.insert(id, connection);
                    tracing::debug!(connection = id, live = self.connections.len(), "Listener registered");
                }
                Command::Unregister { id } => self.remove(id),
                Command::Publish { frame } => self.fan_out(frame),
                Command::Count { reply } => {
                    let _ = reply.send(self.connections.len());
                }
                Command::Shutdown { done } => {
                    self.close_all();
                    let _ = done.send(());
                    break;
                }
            }
        }
        // Every handle dropped, or shut down explicitly.
        self.close_all();
        tracing::info!("Notification hub stopped");
    }

    fn fan_out(&mut self, frame: Utf8Bytes) {
        let mut failed = Vec::new();
        for (id, connection) in &self.connections {
            if let Err(e) = connection.send(frame.clone()) {
                tracing::warn!(connection = *id, "Dropping listener after failed send: {e}");
                failed.push(*id);
            }
        }
        for id in failed {
            self.remove(id);
        }
    }

    fn remove(&mut self, id: ConnectionId) {
        if let Some(connection) = self.connections.remove(&id) {
            connection.close();
            tracing::debug!(connection = id, live = self.connections.len(), "Listener removed");
        }
    }

    fn close_all(&mut self) {
        for (_, connection) in self.connections.drain() {
            connection.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::connection::{SendError, WsConnection};
    use crate::ws::event::{Audience, EventKind, Priority};
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicBool;

    #[derive(Clone, Default)]
    struct Recorder {
        frames: Arc<Mutex<Vec<String>>>,
        fail: Arc<AtomicBool>,
        closed: Arc<AtomicBool>,
    }

    impl Recorder {
        fn failing() -> Self {
            let p = Recorder::default();
            p.fail.store(true, Ordering::SeqCst);
            p
        }

        fn titles(&self) -> Vec<String> {
            self.frames
                .lock()
                .unwrap()
                .iter()
                .map(|f| {
                    let v: serde_json::Value = serde_json::from_str(f).unwrap();
                    v["title"].as_str().unwrap().to_string()
                })
                .collect()
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    impl Connection for Recorder {
        fn send(&self, frame: Utf8Bytes) -> Result<(), SendError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(SendError::Closed);
            }
            self.frames.lock().unwrap().push(frame.as_str().to_string());
            Ok(())
        }

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn event(title: &str) -> NotificationEvent {
        NotificationEvent::new(
            EventKind::Alert,
            title,
            "body",
            Audience::All,
            Priority::Low,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn publish_reaches_every_listener() {
        let hub = NotificationHub::spawn(16);
        let a = Recorder::default();
        let b = Recorder::default();
        hub.register(a.clone()).await.unwrap();
        hub.register(b.clone()).await.unwrap();

        hub.publish(&event("hello")).await.unwrap();
        assert_eq!(hub.connection_count().await.unwrap(), 2);

        assert_eq!(a.titles(), vec!["hello"]);
        assert_eq!(b.titles(), vec!["hello"]);
    }

    #[tokio::test]
    async fn failed_listener_is_removed_and_others_still_receive() {
        let hub = NotificationHub::spawn(16);
        let healthy: Vec<Recorder> = (0..3).map(|_| Recorder::default()).collect();
        for p in &healthy {
            hub.register(p.clone()).await.unwrap();
        }
        let broken = Recorder::failing();
        hub.register(broken.clone()).await.unwrap();
        assert_eq!(hub.connection_count().await.unwrap(), 4);

        hub.publish(&event("first")).await.unwrap();
        assert_eq!(hub.connection_count().await.unwrap(), 3);
        assert!(broken.is_closed());

        hub.publish(&event("second")).await.unwrap();
        assert_eq!(hub.connection_count().await.unwrap(), 3);
        for p in &healthy {
            assert_eq!(p.titles(), vec!["first", "second"]);
            assert!(!p.is_closed());
        }
        assert!(broken.titles().is_empty());
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let hub = NotificationHub::spawn(4);
        let p = Recorder::default();
        hub.register(p.clone()).await.unwrap();

        for i in 0..50 {
            hub.publish(&event(&format!("e{i}"))).await.unwrap();
        }
        hub.connection_count().await.unwrap();

        let expected: Vec<String> = (0..50).map(|i| format!("e{i}")).collect();
        assert_eq!(p.titles(), expected);
    }

    #[tokio::test]
    async fn socket_dropped_for_a_full_queue_is_told_to_close() {
        let hub = NotificationHub::spawn(16);
        let (out_tx, mut out_rx) = tokio::sync::mpsc::channel(1);
        let closed = tokio_util::sync::CancellationToken::new();
        // The socket task keeps its own sender, so the channel stays open.
        let _socket_tx = out_tx.clone();
        hub.register(WsConnection::new(out_tx, closed.clone()))
            .await
            .unwrap();

        hub.publish(&event("first")).await.unwrap();
        hub.publish(&event("second")).await.unwrap();
        assert_eq!(hub.connection_count().await.unwrap(), 0);

        assert!(closed.is_cancelled());
        assert!(matches!(
            out_rx.recv().await,
            Some(axum::extract::ws::Message::Text(_))
        ));
        assert!(out_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn late_listener_gets_no_history() {
        let hub = NotificationHub::spawn(16);
        hub.publish(&event("before")).await.unwrap();
        let p = Recorder::default();
        hub.register(p.clone()).await.unwrap();
        hub.publish(&event("after")).await.unwrap();
        hub.connection_count().await.unwrap();

        assert_eq!(p.titles(), vec!["after"]);
    }

    #[tokio::test]
    async fn unregister_closes_and_is_idempotent() {
        let hub = NotificationHub::spawn(16);
        let p = Recorder::default();
        let id = hub.register(p.clone()).await.unwrap();

        hub.unregister(id).await.unwrap();
        hub.unregister(id).await.unwrap();
        hub.unregister(9999).await.unwrap();
        assert_eq!(hub.connection_count().await.unwrap(), 0);
        assert!(p.is_closed());

        hub.publish(&event("ignored")).await.unwrap();
        hub.connection_count().await.unwrap();
        assert!(p.titles().is_empty());
    }

    #[tokio::test]
    async fn ids_are_unique_across_clones() {
        let hub = NotificationHub::spawn(16);
        let other = hub.clone();
        let a = hub.register(Recorder::default()).await.unwrap();
        let b = other.register(Recorder::default()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn concurrent_registration_and_publish() {
        let hub = NotificationHub::spawn(8);
        let listeners: Vec<Recorder> = (0..32).map(|_| Recorder::default()).collect();

        let mut tasks = Vec::new();
        for p in listeners.clone() {
            let hub = hub.clone();
            tasks.push(tokio::spawn(async move { hub.register(p).await.unwrap() }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        hub.publish(&event("all")).await.unwrap();
        assert_eq!(hub.connection_count().await.unwrap(), 32);
        for p in &listeners {
            assert_eq!(p.titles(), vec!["all"]);
        }
    }

    #[tokio::test]
    async fn shutdown_closes_listeners_and_rejects_further_work() {
        let hub = NotificationHub::spawn(16);
        let p = Recorder::default();
        hub.register(p.clone()).await.unwrap();

        hub.shutdown().await.unwrap();
        assert!(p.is_closed());

        // The owner drops its receiver right after acknowledging shutdown.
        tokio::task::yield_now().await;
        let late = Recorder::default();
        assert!(matches!(hub.register(late.clone()).await, Err(HubError::Closed)));
        assert!(late.is_closed());
        assert!(matches!(hub.publish(&event("x")).await, Err(HubError::Closed)));
    }
}
