//! WebSocket entry point for `/ws/...`.
//!
//! `/ws/notifications` attaches a listener to the notification hub. Clients
//! receive every event published after they connect; nothing is replayed.

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use util::{
    state::AppState,
    ws::{axum_adapter::ws_route, serve::WsServerOptions},
};

pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/notifications", get(notifications_ws))
}

async fn notifications_ws(ws: WebSocketUpgrade, state: State<AppState>) -> impl IntoResponse {
    ws_route(ws, state, WsServerOptions::from_config()).await
}
