use std::path::PathBuf;

use anyhow::Context as _;
use bytes::Bytes;
use uuid::Uuid;

use crate::domain::repository::FileStore;
use crate::error::RegistrarError;

/// URL prefix under which stored files are served.
pub const UPLOAD_URL_PREFIX: &str = "/uploads";

/// Writes uploads into a local directory served at [`UPLOAD_URL_PREFIX`].
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    pub root: PathBuf,
}

impl FileStore for LocalFileStore {
    async fn store(&self, file_name: &str, bytes: Bytes) -> Result<String, RegistrarError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create upload dir {}", self.root.display()))?;
        let stored_name = format!("{}-{}", Uuid::now_v7(), sanitize_file_name(file_name));
        let path = self.root.join(&stored_name);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("write upload {}", path.display()))?;
        Ok(format!("{UPLOAD_URL_PREFIX}/{stored_name}"))
    }
}

/// Reduce a client-supplied name to a single safe path component.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_owned()
    } else {
        cleaned.to_owned()
    }
}
