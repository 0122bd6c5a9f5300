//! Application state container shared across Axum route handlers and services.
//!
//! Holds the database connection and the notification hub. Both are cheap to
//! clone, so the state is passed into handlers via Axum's `State<T>` extractor.

use crate::ws::NotificationHub;
use sea_orm::DatabaseConnection;

/// Central application state shared across the server.
///
/// This includes:
/// - A cloned, thread-safe database connection for use with SeaORM.
/// - The `NotificationHub` that owns every live WebSocket listener.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    hub: NotificationHub,
}

impl AppState {
    /// Creates a new `AppState` from an open connection and a running hub.
    pub fn new(db: DatabaseConnection, hub: NotificationHub) -> Self {
        Self { db, hub }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns a shared reference to the notification hub handle.
    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }
}

impl AppState {
    /// Returns a cloned copy of the database connection.
    ///
    /// Useful for async contexts or spawning tasks that require ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }

    /// Returns a cloned hub handle.
    pub fn hub_clone(&self) -> NotificationHub {
        self.hub.clone()
    }
}
