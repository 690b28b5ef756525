//! Worker write-back endpoints.
//!
//! The research worker reports terminal results here once a job it
//! acknowledged has finished. Guarded by [`InternalCaller`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use decipher_core::{ArtifactKind, ArtifactResolution, Faq, NotebookId, ProcessingStatus};
use serde::Deserialize;

use crate::auth::InternalCaller;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusReport {
    pub status: ProcessingStatus,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OutputReport {
    pub summary: String,
    #[serde(default)]
    pub faqs: Vec<Faq>,
}

pub async fn report_status(
    State(state): State<AppState>,
    _caller: InternalCaller,
    Path(id): Path<NotebookId>,
    Json(report): Json<StatusReport>,
) -> ApiResult<StatusCode> {
    state
        .controller
        .report_status(id, report.status, report.message)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn report_output(
    State(state): State<AppState>,
    _caller: InternalCaller,
    Path(id): Path<NotebookId>,
    Json(report): Json<OutputReport>,
) -> ApiResult<StatusCode> {
    state
        .controller
        .report_output(id, report.summary, report.faqs)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn report_artifact(
    State(state): State<AppState>,
    _caller: InternalCaller,
    Path((id, kind)): Path<(NotebookId, ArtifactKind)>,
    Json(resolution): Json<ArtifactResolution>,
) -> ApiResult<StatusCode> {
    state.controller.report_artifact(id, kind, resolution).await?;
    Ok(StatusCode::NO_CONTENT)
}
