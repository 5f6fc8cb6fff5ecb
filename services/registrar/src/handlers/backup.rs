use axum::{Json, extract::State};
use serde::Serialize;

use crate::domain::backup::{RestoreRequest, Snapshot};
use crate::error::RegistrarError;
use crate::state::AppState;
use crate::usecase::backup::{CreateBackupUseCase, RestoreBackupUseCase};

// ── GET /backup ──────────────────────────────────────────────────────────────

pub async fn create_backup(State(state): State<AppState>) -> Result<Json<Snapshot>, RegistrarError> {
    let usecase = CreateBackupUseCase {
        users: state.user_repo(),
        students: state.student_repo(),
    };
    Ok(Json(usecase.execute().await?))
}

// ── POST /restore ────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct RestoreResponse {
    pub message: &'static str,
    pub removed: u64,
    pub restored: usize,
}

pub async fn restore_backup(
    State(state): State<AppState>,
    Json(body): Json<RestoreRequest>,
) -> Result<Json<RestoreResponse>, RegistrarError> {
    let usecase = RestoreBackupUseCase {
        students: state.student_repo(),
        events: state.student_events.clone(),
    };
    let summary = usecase.execute(body).await?;
    Ok(Json(RestoreResponse {
        message: "database restored",
        removed: summary.removed,
        restored: summary.restored,
    }))
}
