//! Derived artifact generation endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use decipher_core::{ArtifactKind, NotebookId};
use decipher_lifecycle::GenerationStart;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// Response after a generation request was accepted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub artifact: ArtifactKind,
    pub state: &'static str,
    pub already_in_progress: bool,
}

async fn generate(
    state: AppState,
    user: AuthUser,
    id: NotebookId,
    kind: ArtifactKind,
) -> ApiResult<(StatusCode, Json<GenerationResponse>)> {
    let start = state.controller.generate_artifact(id, &user.0, kind).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(GenerationResponse {
            artifact: kind,
            state: decipher_core::artifact::IN_PROGRESS_SENTINEL,
            already_in_progress: start == GenerationStart::AlreadyInProgress,
        }),
    ))
}

/// Start mindmap generation.
pub async fn generate_mindmap(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<NotebookId>,
) -> ApiResult<(StatusCode, Json<GenerationResponse>)> {
    generate(state, user, id, ArtifactKind::Mindmap).await
}

/// Start audio overview generation.
pub async fn generate_audio_overview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<NotebookId>,
) -> ApiResult<(StatusCode, Json<GenerationResponse>)> {
    generate(state, user, id, ArtifactKind::AudioOverview).await
}
