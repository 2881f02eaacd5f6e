//! Artwork status and approval workflow endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::{
    foundation::core::{PackId, SourceId, TemplateId},
    server::{error::AppResult, response::DataResponse, state::AppState},
    store::artworks::NewArtwork,
};

#[derive(Debug, Default, serde::Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub excluded_template_ids: Vec<TemplateId>,
    #[serde(default)]
    pub pack_id: Option<PackId>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ApproveBatchRequest {
    pub source_ids: Vec<SourceId>,
    #[serde(default)]
    pub pack_id: Option<PackId>,
}

/// POST /artworks
pub async fn create_artwork(
    State(state): State<AppState>,
    Json(input): Json<NewArtwork>,
) -> AppResult<impl IntoResponse> {
    let artwork = state.workflow.artworks().insert(input).await?;
    tracing::info!(source_id = %artwork.id, "artwork registered");
    Ok((StatusCode::CREATED, DataResponse::new(artwork)))
}

/// GET /artworks/{id}
pub async fn get_artwork(
    State(state): State<AppState>,
    Path(id): Path<SourceId>,
) -> AppResult<impl IntoResponse> {
    Ok(DataResponse::new(state.workflow.artworks().get(id).await?))
}

/// GET /artworks/{id}/mockups
pub async fn list_mockups(
    State(state): State<AppState>,
    Path(id): Path<SourceId>,
) -> AppResult<impl IntoResponse> {
    state.workflow.artworks().get(id).await?;
    Ok(DataResponse::new(state.workflow.mockups().get(id).await?))
}

/// POST /artworks/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<SourceId>,
    Json(input): Json<ApproveRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = state
        .workflow
        .approve(id, &input.excluded_template_ids, input.pack_id)
        .await?;
    Ok(DataResponse::new(outcome))
}

/// POST /artworks/{id}/decline
pub async fn decline(
    State(state): State<AppState>,
    Path(id): Path<SourceId>,
) -> AppResult<impl IntoResponse> {
    Ok(DataResponse::new(state.workflow.decline(id).await?))
}

/// POST /artworks/{id}/retry
pub async fn retry(
    State(state): State<AppState>,
    Path(id): Path<SourceId>,
) -> AppResult<impl IntoResponse> {
    Ok(DataResponse::new(state.workflow.retry(id).await?))
}

/// POST /artworks/approve-batch
pub async fn approve_batch(
    State(state): State<AppState>,
    Json(input): Json<ApproveBatchRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = state
        .workflow
        .approve_batch(&input.source_ids, input.pack_id)
        .await;
    Ok(DataResponse::new(outcome))
}
