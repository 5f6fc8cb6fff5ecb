use chrono::Utc;

use crate::domain::repository::{CredentialStore, UserRepository};
use crate::domain::types::{UserProfile, stored_time};
use crate::error::RegistrarError;

pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Verify a username/password pair and stamp `last_login`.
pub struct LoginUseCase<R: UserRepository, C: CredentialStore> {
    pub repo: R,
    pub credentials: C,
}

impl<R: UserRepository, C: CredentialStore> LoginUseCase<R, C> {
    pub async fn execute(&self, input: LoginInput) -> Result<UserProfile, RegistrarError> {
        if input.username.is_empty() {
            return Err(RegistrarError::MissingField("username"));
        }
        if input.password.is_empty() {
            return Err(RegistrarError::MissingField("password"));
        }
        let Some(user) = self.repo.find_by_username(&input.username).await? else {
            tracing::info!("login rejected: unknown username");
            return Err(RegistrarError::InvalidCredentials);
        };
        if !self
            .credentials
            .verify(&input.password, &user.password_hash)
            .await?
        {
            tracing::info!(user_id = user.id, "login rejected: wrong password");
            return Err(RegistrarError::InvalidCredentials);
        }

        let mut profile = UserProfile::from(user);
        let now = stored_time(Utc::now());
        match self.repo.touch_last_login(profile.id, now).await {
            Ok(()) => profile.last_login = Some(now),
            Err(e) => tracing::warn!(user_id = profile.id, error = ?e, "failed to record last login"),
        }
        Ok(profile)
    }
}
