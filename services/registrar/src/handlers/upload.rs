use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;

use crate::error::RegistrarError;
use crate::state::AppState;
use crate::usecase::upload::{UploadFilesUseCase, UploadedFile};

/// Multipart field carrying attachments.
pub const FILES_FIELD: &str = "files";

#[derive(Serialize)]
pub struct UploadResponse {
    pub files: Vec<String>,
}

// ── POST /upload ─────────────────────────────────────────────────────────────

pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, RegistrarError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RegistrarError::InvalidUpload(e.body_text()))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("file").to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| RegistrarError::InvalidUpload(e.body_text()))?;
        files.push(UploadedFile { file_name, bytes });
    }

    let usecase = UploadFilesUseCase {
        store: state.file_store(),
    };
    let files = usecase.execute(files).await?;
    Ok(Json(UploadResponse { files }))
}
