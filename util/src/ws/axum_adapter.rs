// util/ws/axum_adapter.rs
use axum::{
    extract::{State, WebSocketUpgrade, ws::WebSocket},
    response::IntoResponse,
};

use super::serve::{WsServerOptions, serve_notifications};
use crate::state::AppState;

/// Upgrades the request and hands the socket to the state's hub.
pub async fn ws_route(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    opts: WsServerOptions,
) -> impl IntoResponse {
    let hub = state.hub_clone();

    ws.on_upgrade(move |socket: WebSocket| async move {
        serve_notifications(socket, hub, opts).await;
    })
}
