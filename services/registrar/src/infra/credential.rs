use anyhow::Context as _;

use crate::domain::repository::CredentialStore;
use crate::error::RegistrarError;

/// bcrypt hashing on tokio's blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct BcryptCredentialStore {
    pub cost: u32,
}

impl Default for BcryptCredentialStore {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl CredentialStore for BcryptCredentialStore {
    async fn hash(&self, plaintext: &str) -> Result<String, RegistrarError> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .context("join password hashing task")?
            .context("hash password")?;
        Ok(hash)
    }

    /// A stored value that is not a bcrypt hash never verifies.
    async fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, RegistrarError> {
        let plaintext = plaintext.to_owned();
        let hash = hash.to_owned();
        let result = tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &hash))
            .await
            .context("join password verification task")?;
        match result {
            Ok(matches) => Ok(matches),
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is unreadable");
                Ok(false)
            }
        }
    }
}
