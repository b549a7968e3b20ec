use async_trait::async_trait;

use crate::security::SecretString;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyDerivationError {
    #[error("password rejected by key store: {0}")]
    InvalidInput(String),
    #[error("no secret key available to protect")]
    MissingSecretKey,
    #[error("key derivation failed: {0}")]
    Failed(String),
}

/// Derives and persists wallet key material from a password.
#[async_trait]
pub trait KeyActionsPort: Send + Sync {
    /// Protect the wallet's secret key with `password`. Runs a
    /// memory-hard KDF, so expect it to take a while.
    async fn set_password(&self, password: &SecretString) -> Result<(), KeyDerivationError>;
}

