//! # Web API Module
//!
//! Axum HTTP front end of the relay.
//!
//! | Route | Auth | Purpose |
//! |-------|------|---------|
//! | `POST /api/orders/enqueue` | function key | publish an order to stage 1 |
//! | `GET /api/orders` | function key | list orders |
//! | `GET /api/ping` | none | `OK` |
//! | `GET /health` | none | liveness |
//! | `GET /ready` | none | table and queue reachability |

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::http::StatusCode;
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use errors::{ApiError, ApiResult};
pub use state::AppState;

/// Build the router with all routes and middleware
pub fn create_app(app_state: AppState) -> Router {
    let request_timeout = app_state.config.request_timeout();

    let protected_routes = routes::order_routes().layer(axum::middleware::from_fn_with_state(
        app_state.clone(),
        middleware::auth::require_function_key,
    ));

    Router::new()
        .merge(routes::health_routes())
        .merge(protected_routes)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
