// util/src/ws/mod.rs
pub mod axum_adapter;
pub mod connection;
pub mod event;
pub mod hub;
pub mod serve;

pub use connection::{Connection, SendError, WsConnection};
pub use event::{Audience, EventKind, NotificationEvent, Priority};
pub use hub::{ConnectionId, HubError, NotificationHub};
