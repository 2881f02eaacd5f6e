//! Template and pack CRUD.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::{
    foundation::core::{PackId, TemplateId},
    grade::preset::ColorGrade,
    registry::{
        pack::{NewPack, PackUpdate},
        template::TemplateSpec,
    },
    server::{error::AppResult, response::DataResponse, state::AppState},
};

#[derive(Debug, serde::Deserialize)]
pub struct CreateTemplate {
    #[serde(flatten)]
    pub spec: TemplateSpec,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub rank: u32,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, serde::Deserialize)]
pub struct Activation {
    pub active: bool,
    #[serde(default)]
    pub rank: Option<u32>,
}

/// GET /templates
pub async fn list_templates(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(DataResponse::new(state.workflow.registry().templates().await))
}

/// POST /templates
pub async fn create_template(
    State(state): State<AppState>,
    Json(input): Json<CreateTemplate>,
) -> AppResult<impl IntoResponse> {
    let template = state
        .workflow
        .registry()
        .create_template(&input.spec, input.active, input.rank)
        .await?;
    Ok((StatusCode::CREATED, DataResponse::new(template)))
}

/// GET /templates/{id}
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
) -> AppResult<impl IntoResponse> {
    Ok(DataResponse::new(state.workflow.registry().template(id).await?))
}

/// PUT /templates/{id}
///
/// A geometry change reapplies the packs containing the template in the background.
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
    Json(spec): Json<TemplateSpec>,
) -> AppResult<impl IntoResponse> {
    Ok(DataResponse::new(state.jobs.update_template(id, &spec).await?))
}

/// PUT /templates/{id}/activation
pub async fn set_activation(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
    Json(input): Json<Activation>,
) -> AppResult<impl IntoResponse> {
    let template = state
        .workflow
        .registry()
        .set_template_active(id, input.active, input.rank)
        .await?;
    Ok(DataResponse::new(template))
}

/// DELETE /templates/{id}
///
/// Reapplies the packs the template is removed from in the background.
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
) -> AppResult<impl IntoResponse> {
    Ok(DataResponse::new(state.jobs.delete_template(id).await?))
}

/// GET /packs
pub async fn list_packs(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(DataResponse::new(state.workflow.registry().packs().await))
}

/// POST /packs
pub async fn create_pack(
    State(state): State<AppState>,
    Json(input): Json<NewPack>,
) -> AppResult<impl IntoResponse> {
    let pack = state.workflow.registry().create_pack(input).await?;
    Ok((StatusCode::CREATED, DataResponse::new(pack)))
}

/// GET /packs/{id}
pub async fn get_pack(
    State(state): State<AppState>,
    Path(id): Path<PackId>,
) -> AppResult<impl IntoResponse> {
    Ok(DataResponse::new(state.workflow.registry().pack(id).await?))
}

/// PATCH /packs/{id}
///
/// Reapplies the pack to affected published artworks in the background.
pub async fn update_pack(
    State(state): State<AppState>,
    Path(id): Path<PackId>,
    Json(update): Json<PackUpdate>,
) -> AppResult<impl IntoResponse> {
    Ok(DataResponse::new(state.jobs.update_pack(id, update).await?))
}

/// DELETE /packs/{id}
pub async fn delete_pack(
    State(state): State<AppState>,
    Path(id): Path<PackId>,
) -> AppResult<impl IntoResponse> {
    state.workflow.registry().delete_pack(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /presets
pub async fn list_presets() -> impl IntoResponse {
    DataResponse::new(ColorGrade::preset_ids().collect::<Vec<_>>())
}
