//! Source document upload.

use axum::{
    extract::{Multipart, State},
    Json,
};
use decipher_core::DecipherError;
use serde::Serialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;
use crate::storage::{is_supported_type, upload_key, SUPPORTED_FILE_TYPES};

/// Where the uploaded file landed. `filePath` and `publicUrl` feed an UPLOAD source.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_path: String,
    pub filename: String,
    pub file_size: usize,
    pub file_type: String,
    pub public_url: String,
}

/// Accept a multipart `file` field and store it.
pub async fn upload_file(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let max_bytes = state.config.limits.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DecipherError::validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let file_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| DecipherError::validation(format!("could not read file: {e}")))?;

        if bytes.len() > max_bytes {
            return Err(DecipherError::validation(format!(
                "File size exceeds maximum limit of {}MB",
                max_bytes / (1024 * 1024)
            ))
            .into());
        }
        if !is_supported_type(&file_type) {
            let supported: Vec<&str> = SUPPORTED_FILE_TYPES.iter().map(|(_, ext)| *ext).collect();
            return Err(DecipherError::validation(format!(
                "Unsupported file type. Supported types: {}",
                supported.join(", ")
            ))
            .into());
        }

        let key = upload_key(&user, &filename);
        state.storage.put(&key, &bytes).await?;
        info!(owner = %user, key = %key, bytes = bytes.len(), "file uploaded");

        return Ok(Json(UploadResponse {
            success: true,
            public_url: state.storage.public_url(&key),
            file_path: key,
            filename,
            file_size: bytes.len(),
            file_type,
        }));
    }

    Err(DecipherError::validation("No file provided").into())
}
