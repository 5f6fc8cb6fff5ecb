use sea_orm::DatabaseConnection;

use registrar_events::EventBus;

use crate::domain::types::StudentNotice;
use crate::infra::credential::BcryptCredentialStore;
use crate::infra::db::{DbStudentRepository, DbUserRepository};
use crate::infra::file_store::LocalFileStore;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub credentials: BcryptCredentialStore,
    pub file_store: LocalFileStore,
    /// Process-wide student change bus. Clones share subscribers.
    pub student_events: EventBus<StudentNotice>,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn student_repo(&self) -> DbStudentRepository {
        DbStudentRepository {
            db: self.db.clone(),
        }
    }

    pub fn credentials(&self) -> BcryptCredentialStore {
        self.credentials
    }

    pub fn file_store(&self) -> LocalFileStore {
        self.file_store.clone()
    }
}
