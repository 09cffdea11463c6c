use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::application::AskError;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct AskErrorResponse {
    pub error: String,
}

type AskFailure = (StatusCode, Json<AskErrorResponse>);

fn failure(status: StatusCode, message: impl Into<String>) -> AskFailure {
    (
        status,
        Json(AskErrorResponse {
            error: message.into(),
        }),
    )
}

fn status_for(err: &AskError) -> StatusCode {
    match err {
        AskError::IndexEmpty => StatusCode::SERVICE_UNAVAILABLE,
        AskError::Embedding(_) => StatusCode::BAD_GATEWAY,
        AskError::NoRelevantContext => StatusCode::NOT_FOUND,
        AskError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AskFailure> {
    let Some(client) = &state.rag_client else {
        return Err(failure(
            StatusCode::SERVICE_UNAVAILABLE,
            "no generation engine attached",
        ));
    };
    if request.question.trim().is_empty() || request.top_k == Some(0) {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "question must not be empty and top_k must be positive",
        ));
    }

    let mut client = client.lock().await;
    match client.ask(&request.question, request.top_k, None).await {
        Ok(answer) => Ok(Json(AskResponse { answer })),
        Err(e) => {
            tracing::error!(error = %e, "ask failed");
            Err(failure(status_for(&e), e.to_string()))
        }
    }
}
