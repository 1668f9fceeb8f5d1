//! # Function Key Middleware
//!
//! Guards the order routes with a shared key when `web.function_key` is set.
//! The key is accepted in the `x-functions-key` header or the `code` query
//! parameter.
//!
//! This is a single shared key, not per-caller authentication. It keeps
//! casual callers out; anything stronger belongs in front of the service.

use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::web::errors::ApiError;
use crate::web::state::AppState;

pub const FUNCTION_KEY_HEADER: &str = "x-functions-key";
pub const FUNCTION_KEY_QUERY: &str = "code";

pub async fn require_function_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.auth_enabled() {
        return Ok(next.run(request).await);
    }
    let expected = state.config.function_key.as_deref().unwrap_or_default();

    let from_header = request
        .headers()
        .get(FUNCTION_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let from_query = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(params)| params.get(FUNCTION_KEY_QUERY).cloned());

    let presented = [from_header, from_query];
    if presented
        .iter()
        .flatten()
        .any(|key| keys_match(key.as_bytes(), expected.as_bytes()))
    {
        debug!(path = %request.uri().path(), "Function key accepted");
        return Ok(next.run(request).await);
    }

    warn!(path = %request.uri().path(), "Rejected request without valid function key");
    Err(ApiError::Unauthorized)
}

/// Compare without short-circuiting on the first differing byte.
/// Only the length can leak through timing.
fn keys_match(presented: &[u8], expected: &[u8]) -> bool {
    if presented.len() != expected.len() {
        return false;
    }
    presented
        .iter()
        .zip(expected)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
