use chrono::Utc;

use registrar_domain::user::UserRole;

use crate::domain::repository::{CredentialStore, UserRepository};
use crate::domain::types::{NewUser, UserProfile, stored_time};
use crate::error::RegistrarError;

pub const SEED_ADMIN_USERNAME: &str = "admin";
pub const SEED_ADMIN_EMAIL: &str = "admin@system.com";
pub const SEED_ADMIN_FULL_NAME: &str = "System Administrator";

/// Create the bootstrap admin account unless one named `admin` already exists.
pub struct EnsureAdminUseCase<R: UserRepository, C: CredentialStore> {
    pub repo: R,
    pub credentials: C,
}

impl<R: UserRepository, C: CredentialStore> EnsureAdminUseCase<R, C> {
    /// Returns the created profile, or `None` when nothing was written.
    pub async fn execute(&self, password: &str) -> Result<Option<UserProfile>, RegistrarError> {
        if password.is_empty() {
            return Err(RegistrarError::MissingField("password"));
        }
        if self
            .repo
            .find_by_username(SEED_ADMIN_USERNAME)
            .await?
            .is_some()
        {
            return Ok(None);
        }
        let password_hash = self.credentials.hash(password).await?;
        let created = self
            .repo
            .create(&NewUser {
                username: SEED_ADMIN_USERNAME.to_owned(),
                password_hash,
                role: UserRole::Admin,
                email: SEED_ADMIN_EMAIL.to_owned(),
                full_name: SEED_ADMIN_FULL_NAME.to_owned(),
                created_at: stored_time(Utc::now()),
            })
            .await;
        let admin = match created {
            Ok(admin) => admin,
            // Another instance seeded it first.
            Err(RegistrarError::UsernameTaken) => return Ok(None),
            Err(e) => return Err(e),
        };
        tracing::info!(user_id = admin.id, "seeded admin account");
        Ok(Some(admin.into()))
    }
}
