//! The delivery side of one attached listener.
//!
//! The hub only ever sees `dyn Connection`; the transport decides what a send
//! means. Sends must not wait on the peer, so a slow client shows up as a
//! failed send instead of stalling the fan-out.

use axum::extract::ws::{Message, Utf8Bytes};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The outbound buffer is full; the peer is not keeping up.
    #[error("outbound buffer full")]
    Full,
    /// The peer is gone.
    #[error("connection closed")]
    Closed,
}

pub trait Connection: Send + 'static {
    /// Queue one text frame without blocking.
    fn send(&self, frame: Utf8Bytes) -> Result<(), SendError>;

    /// Release the connection. Called exactly once, when the hub drops it.
    fn close(&self);
}

/// A WebSocket client as seen by the hub: the sending half of the socket's
/// bounded outbound queue. A writer task drains the queue into the socket.
///
/// Closing cancels `closed` instead of queueing a frame, so a client whose
/// queue is full still gets torn down.
pub struct WsConnection {
    out_tx: mpsc::Sender<Message>,
    closed: CancellationToken,
}

impl WsConnection {
    pub fn new(out_tx: mpsc::Sender<Message>, closed: CancellationToken) -> Self {
        Self { out_tx, closed }
    }
}

impl Connection for WsConnection {
    fn send(&self, frame: Utf8Bytes) -> Result<(), SendError> {
        self.out_tx
            .try_send(Message::Text(frame))
            .map_err(|e| match e {
                TrySendError::Full(_) => SendError::Full,
                TrySendError::Closed(_) => SendError::Closed,
            })
    }

    fn close(&self) {
        self.closed.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_buffer_reports_full() {
        let (tx, _rx) = mpsc::channel(1);
        let conn = WsConnection::new(tx, CancellationToken::new());
        assert!(conn.send("a".into()).is_ok());
        assert_eq!(conn.send("b".into()), Err(SendError::Full));
    }

    #[test]
    fn dropped_receiver_reports_closed() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let conn = WsConnection::new(tx, CancellationToken::new());
        assert_eq!(conn.send("a".into()), Err(SendError::Closed));
    }

    #[tokio::test]
    async fn close_cancels_without_touching_the_queue() {
        let (tx, mut rx) = mpsc::channel(4);
        let closed = CancellationToken::new();
        let conn = WsConnection::new(tx, closed.clone());
        conn.send("hello".into()).unwrap();
        conn.close();

        assert!(closed.is_cancelled());
        match rx.recv().await {
            Some(Message::Text(t)) => assert_eq!(t.as_str(), "hello"),
            other => panic!("expected text frame, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn close_is_signalled_even_when_the_queue_is_full() {
        let (tx, _rx) = mpsc::channel(1);
        let closed = CancellationToken::new();
        let conn = WsConnection::new(tx, closed.clone());
        conn.send("a".into()).unwrap();
        assert_eq!(conn.send("b".into()), Err(SendError::Full));

        conn.close();
        assert!(closed.is_cancelled());
    }
}
