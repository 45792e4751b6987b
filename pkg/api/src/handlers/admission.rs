use axum::{
    Json,
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use pkg_admission::ResourceKind;

use crate::AppState;
use crate::review::{Phase, ReviewRequest, review};

pub async fn mutate(
    State(state): State<AppState>,
    AxumPath(kind): AxumPath<String>,
    Json(request): Json<ReviewRequest>,
) -> impl IntoResponse {
    handle(state, &kind, Phase::Mutate, request).await
}

pub async fn validate(
    State(state): State<AppState>,
    AxumPath(kind): AxumPath<String>,
    Json(request): Json<ReviewRequest>,
) -> impl IntoResponse {
    handle(state, &kind, Phase::Validate, request).await
}

async fn handle(
    state: AppState,
    kind: &str,
    phase: Phase,
    request: ReviewRequest,
) -> axum::response::Response {
    let Some(kind) = ResourceKind::from_plural(kind) else {
        warn!("Admission request for unknown kind: {}", kind);
        return (StatusCode::NOT_FOUND, "Unknown resource kind").into_response();
    };
    let response = review(&state.admission, kind, phase, request).await;
    (StatusCode::OK, Json(response)).into_response()
}
