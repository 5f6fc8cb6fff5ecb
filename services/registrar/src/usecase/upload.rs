use bytes::Bytes;

use crate::domain::repository::FileStore;
use crate::error::RegistrarError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Persist attachments and return their public paths in upload order.
pub struct UploadFilesUseCase<F: FileStore> {
    pub store: F,
}

impl<F: FileStore> UploadFilesUseCase<F> {
    pub async fn execute(&self, files: Vec<UploadedFile>) -> Result<Vec<String>, RegistrarError> {
        if files.is_empty() {
            return Err(RegistrarError::NoFiles);
        }
        let mut paths = Vec::with_capacity(files.len());
        for file in files {
            match self.store.store(&file.file_name, file.bytes).await {
                Ok(path) => paths.push(path),
                Err(e) => {
                    // Files written before the failure are kept.
                    tracing::error!(
                        file_name = %file.file_name,
                        stored = ?paths,
                        error = ?e,
                        "upload failed part way"
                    );
                    return Err(e);
                }
            }
        }
        Ok(paths)
    }
}
