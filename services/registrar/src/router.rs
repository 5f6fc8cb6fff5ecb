use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use registrar_core::health::healthz;
use registrar_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    auth::login,
    backup::{create_backup, restore_backup},
    health::readyz,
    student::{
        create_student, delete_student, get_student, list_students, student_stats,
        update_student,
    },
    upload::upload_files,
    user::{change_password, create_user, delete_user, list_users, update_user},
};
use crate::infra::file_store::UPLOAD_URL_PREFIX;
use crate::state::AppState;

/// Upper bound for one multipart upload request.
const UPLOAD_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Upper bound for a restore snapshot.
const RESTORE_BODY_LIMIT: usize = 64 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.file_store.root);
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Auth
        .route("/auth/login", post(login))
        // Users
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", put(update_user).delete(delete_user))
        .route("/users/{id}/password", put(change_password))
        // Students
        .route("/students", get(list_students).post(create_student))
        .route("/students/stats", get(student_stats))
        .route(
            "/students/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        // Backup
        .route("/backup", get(create_backup))
        .route(
            "/restore",
            post(restore_backup).layer(DefaultBodyLimit::max(RESTORE_BODY_LIMIT)),
        )
        // Attachments
        .route(
            "/upload",
            post(upload_files).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .nest_service(UPLOAD_URL_PREFIX, uploads)
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
