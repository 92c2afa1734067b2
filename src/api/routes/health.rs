//! Health Routes
//!
//! Health check endpoints for monitoring and container probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (database reachable)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{AgeIndexHealth, HealthResponse};
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Returns 200 once the database answers. An empty age index does not make
/// the service unready; age queries answer 503 on their own.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if check_database_health(&state) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database_ok = check_database_health(&state);

    let snapshot = state.age.snapshot().await;
    let report = snapshot.report.as_ref();
    let age_index = AgeIndexHealth {
        loaded: !snapshot.index.is_empty(),
        rows: snapshot.index.len(),
        source: state.age.source().display().to_string(),
        loaded_at: report.map(|r| r.loaded_at),
        error: report.and_then(|r| r.error.clone()),
    };

    let overall_status = match (database_ok, age_index.loaded) {
        (true, true) => "healthy",
        (false, false) => "unhealthy",
        _ => "degraded",
    };

    Json(HealthResponse {
        status: overall_status.to_string(),
        database: if database_ok { "ok" } else { "error" }.to_string(),
        age_index,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn check_database_health(state: &AppState) -> bool {
    match state.store.ping() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    }
}
