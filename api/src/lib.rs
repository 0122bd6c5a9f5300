//! HTTP and WebSocket surface of the QR attendance backend.
//!
//! - `/api/health` liveness probe
//! - `/api/qr/...` session issuing, scanning and reports
//! - `/ws/notifications` live attendance notifications

use axum::{Router, middleware::from_fn};
use util::state::AppState;

pub mod middleware;
pub mod response;
pub mod routes;
pub mod ws;

/// Full application router with state applied.
pub fn app(app_state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::routes())
        .nest("/ws", ws::ws_routes())
        .layer(from_fn(middleware::log_request))
        .with_state(app_state)
}
