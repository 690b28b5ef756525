//! Chat endpoint.
//!
//! Every failure, authentication included, is answered with the
//! `{status: "error", response}` envelope the chat widget understands.

use axum::{
    extract::{FromRequestParts, Request, State},
    Json,
};
use decipher_core::{ChatRequest, DecipherError};

use crate::auth::AuthUser;
use crate::error::ChatError;
use crate::state::AppState;

const MAX_CHAT_BODY_BYTES: usize = 1024 * 1024;

/// Forward a chat turn about one of the caller's notebooks.
pub async fn chat(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<serde_json::Value>, ChatError> {
    let (mut parts, body) = request.into_parts();
    let AuthUser(user) = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .map_err(|rejection| ChatError(rejection.0))?;

    let bytes = axum::body::to_bytes(body, MAX_CHAT_BODY_BYTES)
        .await
        .map_err(|e| ChatError(DecipherError::validation(e.to_string())))?;
    let req: ChatRequest = serde_json::from_slice(&bytes)
        .map_err(|e| ChatError(DecipherError::validation(e.to_string())))?;

    let answer = state.controller.chat(&user, req).await?;
    Ok(Json(answer))
}
