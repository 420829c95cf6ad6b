//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::notification::DispatcherStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub store: StoreHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct StoreHealthResponse {
    pub backend: String,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub dispatcher: DispatcherStatsSnapshot,
    pub policy: PolicyStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreakerResponse>,
}

#[derive(Debug, Serialize)]
pub struct PolicyStats {
    pub max_concurrency: usize,
    pub deadline_ms: Option<u64>,
    pub prune_status_codes: Vec<u16>,
}

#[derive(Debug, Serialize)]
pub struct CircuitBreakerResponse {
    pub state: String,
    pub failure_count: u32,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let available = state.store.is_available();
    let status = if available { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store: StoreHealthResponse {
            backend: state.store.backend().to_string(),
            available,
        },
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let policy = state.dispatcher.policy();

    let circuit_breaker = state
        .store_circuit_breaker
        .as_ref()
        .map(|cb| CircuitBreakerResponse {
            state: cb.state().as_str().to_string(),
            failure_count: cb.failure_count(),
        });

    Json(StatsResponse {
        dispatcher: state.dispatcher.stats(),
        policy: PolicyStats {
            max_concurrency: policy.max_concurrency,
            deadline_ms: policy.deadline.map(|d| d.as_millis() as u64),
            prune_status_codes: policy.prune_status_codes.clone(),
        },
        circuit_breaker,
    })
}
