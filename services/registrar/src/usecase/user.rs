use chrono::Utc;

use registrar_domain::user::UserRole;

use crate::domain::repository::{CredentialStore, UserRepository};
use crate::domain::types::{NewUser, UserChanges, UserProfile, stored_time};
use crate::error::RegistrarError;

// ── ListUsers ────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> ListUsersUseCase<R> {
    pub async fn execute(&self) -> Result<Vec<UserProfile>, RegistrarError> {
        let users = self.repo.list().await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }
}

// ── CreateUser ───────────────────────────────────────────────────────────────

pub struct CreateUserInput {
    pub username: String,
    pub password: String,
    pub role: Option<UserRole>,
    pub email: String,
    pub full_name: String,
}

pub struct CreateUserUseCase<R: UserRepository, C: CredentialStore> {
    pub repo: R,
    pub credentials: C,
}

impl<R: UserRepository, C: CredentialStore> CreateUserUseCase<R, C> {
    pub async fn execute(&self, input: CreateUserInput) -> Result<UserProfile, RegistrarError> {
        if input.username.trim().is_empty() {
            return Err(RegistrarError::MissingField("username"));
        }
        if input.password.is_empty() {
            return Err(RegistrarError::MissingField("password"));
        }
        if self.repo.find_by_username(&input.username).await?.is_some() {
            return Err(RegistrarError::UsernameTaken);
        }
        let password_hash = self.credentials.hash(&input.password).await?;
        let user = self
            .repo
            .create(&NewUser {
                username: input.username,
                password_hash,
                role: input.role.unwrap_or_default(),
                email: input.email,
                full_name: input.full_name,
                created_at: stored_time(Utc::now()),
            })
            .await?;
        tracing::info!(user_id = user.id, role = user.role.as_str(), "user created");
        Ok(user.into())
    }
}

// ── UpdateUser ───────────────────────────────────────────────────────────────

pub struct UpdateUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> UpdateUserUseCase<R> {
    pub async fn execute(
        &self,
        user_id: i32,
        changes: UserChanges,
    ) -> Result<UserProfile, RegistrarError> {
        if changes.is_empty() {
            return Err(RegistrarError::MissingData);
        }
        if let Some(ref username) = changes.username {
            if username.trim().is_empty() {
                return Err(RegistrarError::MissingField("username"));
            }
            if let Some(owner) = self.repo.find_by_username(username).await? {
                if owner.id != user_id {
                    return Err(RegistrarError::UsernameTaken);
                }
            }
        }
        let user = self.repo.update(user_id, &changes).await?;
        Ok(user.into())
    }
}

// ── DeleteUser ───────────────────────────────────────────────────────────────

pub struct DeleteUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> DeleteUserUseCase<R> {
    pub async fn execute(&self, user_id: i32) -> Result<(), RegistrarError> {
        self.repo.delete(user_id).await?;
        tracing::info!(user_id, "user deleted");
        Ok(())
    }
}

// ── ChangePassword ───────────────────────────────────────────────────────────

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<R: UserRepository, C: CredentialStore> {
    pub repo: R,
    pub credentials: C,
}

impl<R: UserRepository, C: CredentialStore> ChangePasswordUseCase<R, C> {
    pub async fn execute(
        &self,
        user_id: i32,
        input: ChangePasswordInput,
    ) -> Result<(), RegistrarError> {
        if input.new_password.is_empty() {
            return Err(RegistrarError::MissingField("new_password"));
        }
        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(RegistrarError::UserNotFound)?;
        if !self
            .credentials
            .verify(&input.current_password, &user.password_hash)
            .await?
        {
            return Err(RegistrarError::IncorrectPassword);
        }
        let hash = self.credentials.hash(&input.new_password).await?;
        if !self.repo.set_password_hash(user_id, &hash).await? {
            return Err(RegistrarError::UserNotFound);
        }
        Ok(())
    }
}
