use async_trait::async_trait;

#[async_trait]
pub trait WalletStatePort: Send + Sync {
    /// Whether the wallet already holds password-protected key material.
    async fn has_secret_key(&self) -> bool;
}
