//! # Web API Route Definitions

use axum::routing::{get, post};
use axum::Router;

use crate::web::handlers;
use crate::web::state::AppState;

/// Order routes, guarded by the function key when one is configured
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders/enqueue", post(handlers::orders::enqueue_order))
        .route("/api/orders", get(handlers::orders::list_orders))
}

/// Anonymous routes: ping and the health probes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ping", get(handlers::health::ping))
        .route("/health", get(handlers::health::basic_health))
        .route("/ready", get(handlers::health::readiness_probe))
}
