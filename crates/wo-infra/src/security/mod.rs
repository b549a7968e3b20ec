mod accounts_store;
mod key_vault;

pub use accounts_store::VaultAccountsStore;
pub use key_vault::{KdfParams, KeyVault, SecretKey, VaultError, WrappedSecretKey};
