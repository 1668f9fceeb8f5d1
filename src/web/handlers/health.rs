//! # Health Check Handlers
//!
//! Liveness, readiness and ping endpoints. None of them require the
//! function key.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

use crate::web::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: String,
    pub checks: BTreeMap<String, HealthCheck>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: Option<String>,
    pub duration_ms: u64,
}

impl HealthCheck {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>, started: Instant) -> Self {
        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(()) => Self {
                status: "healthy".to_string(),
                message: None,
                duration_ms,
            },
            Err(e) => Self {
                status: "unhealthy".to_string(),
                message: Some(e.to_string()),
                duration_ms,
            },
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Liveness: GET /health
pub async fn basic_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Readiness: GET /ready
///
/// Checks the order table and both stage queues.
pub async fn readiness_probe(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let mut checks = BTreeMap::new();

    let started = Instant::now();
    checks.insert(
        format!("table:{}", state.store.store_type()),
        HealthCheck::from_result(state.store.health_check().await, started),
    );

    for queue_name in [&state.queues.orders, &state.queues.orders_finalize] {
        let started = Instant::now();
        let result = state.queue.queue_metrics(queue_name).await.map(|metrics| {
            debug!(
                queue = %queue_name,
                visible = metrics.visible_messages,
                archived = metrics.archived_messages,
                "Queue metrics"
            );
        });
        checks.insert(
            format!("queue:{queue_name}"),
            HealthCheck::from_result(result, started),
        );
    }

    let ready = checks.values().all(HealthCheck::is_healthy);
    if !ready {
        warn!(checks = ?checks.keys().collect::<Vec<_>>(), "Readiness check failed");
    }

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            status: if ready { "ready" } else { "not_ready" }.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            checks,
        }),
    )
}

/// GET /api/ping
pub async fn ping() -> &'static str {
    "OK"
}
