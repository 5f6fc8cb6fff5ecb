#![allow(async_fn_in_trait)]

use bytes::Bytes;
use chrono::{DateTime, Utc};

use registrar_domain::student::StudentCategory;

use crate::domain::types::{
    NewStudent, NewUser, Student, StudentFilter, StudentUpdate, UserChanges, UserRecord,
};
use crate::error::RegistrarError;

/// Repository for registrar accounts.
pub trait UserRepository: Send + Sync {
    /// All accounts ordered by id ascending.
    async fn list(&self) -> Result<Vec<UserRecord>, RegistrarError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, RegistrarError>;

    async fn find_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, RegistrarError>;

    /// Fails with `UsernameTaken` when the username is already stored.
    async fn create(&self, user: &NewUser) -> Result<UserRecord, RegistrarError>;

    /// Apply a partial profile update.
    ///
    /// Fails with `UserNotFound`, with `UsernameTaken`, or with `LastAdmin` when
    /// the change would demote the only remaining admin. The admin check and the
    /// write happen under one lock on the admin rows.
    async fn update(&self, id: i32, changes: &UserChanges) -> Result<UserRecord, RegistrarError>;

    /// Fails with `UserNotFound`, or with `LastAdmin` when `id` is the only admin.
    async fn delete(&self, id: i32) -> Result<(), RegistrarError>;

    /// Returns `false` when no such account exists.
    async fn set_password_hash(&self, id: i32, hash: &str) -> Result<bool, RegistrarError>;

    async fn touch_last_login(&self, id: i32, at: DateTime<Utc>) -> Result<(), RegistrarError>;
}

/// Repository for student records and their grades.
pub trait StudentRepository: Send + Sync {
    /// Matching students ordered by id descending, grades included.
    async fn list(&self, filter: &StudentFilter) -> Result<Vec<Student>, RegistrarError>;

    /// Every student ordered by id ascending, grades included.
    async fn list_all(&self) -> Result<Vec<Student>, RegistrarError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Student>, RegistrarError>;

    /// Insert a student and its grades atomically.
    async fn insert(&self, student: &NewStudent) -> Result<Student, RegistrarError>;

    /// Overwrite the scalar columns and, when supplied, replace the grade set in
    /// the same transaction. Returns `None` when the student does not exist.
    async fn update(
        &self,
        id: i32,
        update: &StudentUpdate,
    ) -> Result<Option<Student>, RegistrarError>;

    /// Delete a student with its grades. Returns `true` if a row was deleted.
    async fn delete(&self, id: i32) -> Result<bool, RegistrarError>;

    /// Delete every student and grade. Returns the removed student ids, ascending.
    async fn delete_all(&self) -> Result<Vec<i32>, RegistrarError>;

    async fn count_by_category(
        &self,
        owner_id: Option<i32>,
    ) -> Result<Vec<(StudentCategory, u64)>, RegistrarError>;

    /// Move the id generator past the highest stored id.
    async fn sync_id_sequence(&self) -> Result<(), RegistrarError>;
}

/// One-way password hashing.
pub trait CredentialStore: Send + Sync {
    async fn hash(&self, plaintext: &str) -> Result<String, RegistrarError>;

    async fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, RegistrarError>;
}

/// Persistent storage for uploaded attachments.
pub trait FileStore: Send + Sync {
    /// Store `bytes` under a unique name derived from `file_name` and return
    /// the public path it is served from.
    async fn store(&self, file_name: &str, bytes: Bytes) -> Result<String, RegistrarError>;
}
