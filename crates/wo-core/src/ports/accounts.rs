use async_trait::async_trait;

use crate::account::Account;

#[async_trait]
pub trait AccountsPort: Send + Sync {
    /// Snapshot of the accounts decryptable with the current key material.
    ///
    /// Empty while the wallet is locked.
    async fn get_accounts(&self) -> Vec<Account>;
}
