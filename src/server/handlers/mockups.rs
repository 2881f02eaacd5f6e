//! Mockup serving and per-channel flags.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::{
    foundation::core::{Channel, MockupId},
    server::{
        error::{AppError, AppResult},
        response::DataResponse,
        state::AppState,
    },
};

#[derive(Debug, serde::Deserialize)]
pub struct InclusionRequest {
    pub included: bool,
}

/// GET /mockups/{id}/image
///
/// Raw encoded raster with its content type.
pub async fn image(
    State(state): State<AppState>,
    Path(id): Path<MockupId>,
) -> AppResult<impl IntoResponse> {
    let mockup = state.workflow.mockups().get_by_id(id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, mockup.mime),
            (header::CACHE_CONTROL, "private, max-age=300"),
        ],
        mockup.data.as_ref().clone(),
    ))
}

/// PUT /mockups/{id}/channels/{channel}
pub async fn set_channel(
    State(state): State<AppState>,
    Path((id, channel)): Path<(MockupId, String)>,
    Json(input): Json<InclusionRequest>,
) -> AppResult<impl IntoResponse> {
    let channel: Channel = channel.parse().map_err(AppError::BadRequest)?;
    let mockup = state
        .workflow
        .mockups()
        .set_channel_inclusion(id, channel, input.included)
        .await?;
    Ok(DataResponse::new(mockup))
}

/// POST /mockups/{id}/storefront-primary
pub async fn set_storefront_primary(
    State(state): State<AppState>,
    Path(id): Path<MockupId>,
) -> AppResult<impl IntoResponse> {
    let mockup = state.workflow.mockups().set_storefront_primary(id).await?;
    Ok(DataResponse::new(mockup))
}
