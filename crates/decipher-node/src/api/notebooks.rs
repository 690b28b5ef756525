//! Notebook API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use decipher_core::notebook::{MSG_REQUEUED, MSG_SOURCES_UPDATED};
use decipher_core::{
    CreateNotebookRequest, NotebookDetails, NotebookId, NotebookSummary, Source,
    UpdateSourcesRequest,
};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// Response after replacing sources.
#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub sources: Vec<Source>,
    pub message: String,
}

/// Response after a retry was accepted.
#[derive(Debug, Serialize)]
pub struct RetryResponse {
    pub message: String,
}

/// List the caller's notebooks.
pub async fn list_notebooks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<NotebookSummary>>> {
    Ok(Json(state.controller.list_notebooks(&user).await?))
}

/// Create a notebook and queue research.
pub async fn create_notebook(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateNotebookRequest>,
) -> ApiResult<(StatusCode, Json<NotebookDetails>)> {
    let details = state.controller.create_notebook(&user, req).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// Read a notebook. This is what the status pollers fetch.
pub async fn get_notebook(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<NotebookId>,
) -> ApiResult<Json<NotebookDetails>> {
    Ok(Json(state.controller.get_notebook(id, &user).await?))
}

/// Delete a notebook.
pub async fn delete_notebook(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<NotebookId>,
) -> ApiResult<StatusCode> {
    state.controller.delete_notebook(id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace every source of a notebook.
pub async fn update_sources(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<NotebookId>,
    Json(req): Json<UpdateSourcesRequest>,
) -> ApiResult<Json<SourcesResponse>> {
    let sources = state.controller.update_sources(id, &user, req.sources).await?;
    Ok(Json(SourcesResponse {
        sources,
        message: MSG_SOURCES_UPDATED.to_string(),
    }))
}

/// Re-queue main processing.
pub async fn retry_notebook(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<NotebookId>,
) -> ApiResult<(StatusCode, Json<RetryResponse>)> {
    state.controller.retry_notebook(id, &user).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(RetryResponse {
            message: MSG_REQUEUED.to_string(),
        }),
    ))
}
