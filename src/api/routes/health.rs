use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub index_loaded: bool,
    pub records: usize,
    pub generation: bool,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Ready once a non-empty index is loaded; generation is reported but optional.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let records = state
        .retrieval
        .as_ref()
        .map_or(0, |service| service.index().len());
    let is_ready = records > 0;

    let response = ReadinessResponse {
        status: if is_ready { "ready" } else { "not_ready" }.into(),
        index_loaded: is_ready,
        records,
        generation: state.rag_client.is_some(),
    };

    let status = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
