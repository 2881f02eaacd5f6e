//! Background job triggers and progress.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::{
    foundation::core::PackId,
    jobs::registry::{JobKind, JobStart},
    server::{
        error::{AppError, AppResult},
        response::DataResponse,
        state::AppState,
    },
};

#[derive(Debug, Default, serde::Deserialize)]
pub struct PackScope {
    #[serde(default)]
    pub pack_id: Option<PackId>,
}

fn accepted(start: JobStart) -> impl IntoResponse {
    let status = if start.started() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    (status, DataResponse::new(start))
}

/// POST /jobs/reapply
pub async fn reapply(
    State(state): State<AppState>,
    Json(scope): Json<PackScope>,
) -> AppResult<impl IntoResponse> {
    Ok(accepted(state.jobs.reapply_all(scope.pack_id).await?))
}

/// POST /jobs/apply-missing
pub async fn apply_missing(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(accepted(state.jobs.apply_missing().await?))
}

/// POST /packs/{id}/reapply
pub async fn reapply_pack(
    State(state): State<AppState>,
    Path(id): Path<PackId>,
) -> AppResult<impl IntoResponse> {
    state.workflow.registry().pack(id).await?;
    Ok(accepted(state.jobs.reapply_pack(id).await?))
}

/// GET /jobs/{kind}?pack_id=
pub async fn snapshot(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(scope): Query<PackScope>,
) -> AppResult<impl IntoResponse> {
    let kind: JobKind = kind.parse().map_err(AppError::BadRequest)?;
    Ok(DataResponse::new(state.jobs.snapshot(kind, scope.pack_id)))
}

/// GET /jobs
pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    DataResponse::new(state.jobs.jobs().snapshots())
}
