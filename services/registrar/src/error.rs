use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Registrar service error variants.
#[derive(Debug, thiserror::Error)]
pub enum RegistrarError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("missing data")]
    MissingData,
    #[error("invalid backup: {0}")]
    InvalidBackup(&'static str),
    #[error("unsupported backup version: {0}")]
    UnsupportedBackupVersion(String),
    #[error("no files uploaded")]
    NoFiles,
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
    #[error("username already exists")]
    UsernameTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("current password is incorrect")]
    IncorrectPassword,
    #[error("cannot remove the last admin")]
    LastAdmin,
    #[error("user not found")]
    UserNotFound,
    #[error("student not found")]
    StudentNotFound,
    #[error("restore stopped after {restored} of {total} students")]
    PartialRestore {
        restored: usize,
        total: usize,
        #[source]
        source: Box<RegistrarError>,
    },
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl RegistrarError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::MissingData => "MISSING_DATA",
            Self::InvalidBackup(_) => "INVALID_BACKUP",
            Self::UnsupportedBackupVersion(_) => "UNSUPPORTED_BACKUP_VERSION",
            Self::NoFiles => "NO_FILES",
            Self::InvalidUpload(_) => "INVALID_UPLOAD",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::IncorrectPassword => "INCORRECT_PASSWORD",
            Self::LastAdmin => "LAST_ADMIN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::StudentNotFound => "STUDENT_NOT_FOUND",
            Self::PartialRestore { .. } => "PARTIAL_RESTORE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_)
            | Self::MissingData
            | Self::InvalidBackup(_)
            | Self::UnsupportedBackupVersion(_)
            | Self::NoFiles
            | Self::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            Self::UsernameTaken | Self::LastAdmin => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::IncorrectPassword => StatusCode::UNAUTHORIZED,
            Self::UserNotFound | Self::StudentNotFound => StatusCode::NOT_FOUND,
            Self::PartialRestore { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Full cause chain, e.g. `internal error: insert student: connection reset`.
    fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

impl IntoResponse for RegistrarError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
            }
            Self::PartialRestore { .. } => {
                tracing::error!(error = %self.chain(), kind = "PARTIAL_RESTORE", "restore failed");
            }
            _ => {}
        }
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if cfg!(debug_assertions) && status.is_server_error() {
            body["detail"] = serde_json::Value::String(self.chain());
        }
        (status, axum::Json(body)).into_response()
    }
}
