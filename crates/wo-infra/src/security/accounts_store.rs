use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use wo_core::ports::AccountsPort;
use wo_core::Account;

use super::key_vault::{KeyVault, SecretKey};

const ADDRESS_CONTEXT: &str = "wallet-onboarding 2024 account address";

/// Accounts derived from the vault's secret key. Empty while locked.
pub struct VaultAccountsStore {
    vault: Arc<KeyVault>,
    account_count: usize,
}

impl VaultAccountsStore {
    pub fn new(vault: Arc<KeyVault>, account_count: usize) -> Self {
        Self {
            vault,
            account_count,
        }
    }
}

#[async_trait]
impl AccountsPort for VaultAccountsStore {
    async fn get_accounts(&self) -> Vec<Account> {
        let Some(secret) = self.vault.secret_key() else {
            debug!("vault locked, no accounts available");
            return Vec::new();
        };
        (0..self.account_count)
            .map(|index| Account {
                index,
                address: derive_address(&secret, index),
            })
            .collect()
    }
}

fn derive_address(secret: &SecretKey, index: usize) -> String {
    let mut hasher = blake3::Hasher::new_derive_key(ADDRESS_CONTEXT);
    hasher.update(&secret[..]);
    hasher.update(&(index as u64).to_le_bytes());
    let digest = hasher.finalize();
    format!("SP{}", hex::encode_upper(&digest.as_bytes()[..20]))
}
