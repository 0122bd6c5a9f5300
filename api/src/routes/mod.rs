//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness probe
//! - `/qr` → QR session issuing, scanning and attendance reports

use axum::Router;
use util::state::AppState;

use crate::routes::{health::health_routes, qr::qr_routes};

pub mod health;
pub mod qr;

/// Builds every `/api` route. State is applied by the caller.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest("/qr", qr_routes())
}
