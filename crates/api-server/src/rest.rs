//! Operational endpoints: health, readiness and liveness probes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use wifinet_store::Repository;

/// Shared state for the operational handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub node_id: String,
    pub start_time: Instant,
}

/// GET /health: Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let dataset = state.repo.snapshot();
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        store: state.repo.backend_name(),
        customers: dataset.customers.len(),
        bills: dataset.bills.len(),
    })
}

/// GET /ready: Readiness probe.
/// Returns 200 once the backing document can be read again.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.repo.refresh().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET /live: Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
    pub store: &'static str,
    pub customers: usize,
    pub bills: usize,
}
