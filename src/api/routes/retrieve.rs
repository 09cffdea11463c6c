use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RetrieveRequest {
    pub question: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HitResponse {
    pub id: u64,
    pub filename: String,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
    pub context: String,
    pub hits: Vec<HitResponse>,
}

pub async fn retrieve_handler(
    State(state): State<AppState>,
    Json(request): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>, StatusCode> {
    let Some(service) = &state.retrieval else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    if request.question.trim().is_empty() || request.top_k == Some(0) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let retrieval = service
        .retrieve(&request.question, request.top_k)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "retrieval failed");
            StatusCode::BAD_GATEWAY
        })?;

    let top_k = request.top_k.unwrap_or(service.config().top_k);
    let hits = retrieval
        .ranked
        .iter()
        .take(top_k)
        .filter_map(|hit| {
            service.index().get(hit.row).map(|record| HitResponse {
                id: record.id,
                filename: record.filename.clone(),
                text: record.text.clone(),
                score: hit.score,
            })
        })
        .collect();

    Ok(Json(RetrieveResponse {
        context: retrieval.context,
        hits,
    }))
}
