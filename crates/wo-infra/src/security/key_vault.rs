use std::sync::RwLock;

use argon2::Argon2;
use async_trait::async_trait;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{KeyInit, XChaCha20Poly1305, XNonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zeroize::Zeroizing;

use wo_core::ports::{KeyActionsPort, KeyDerivationError, WalletStatePort};
use wo_core::SecretString;

pub type SecretKey = Zeroizing<[u8; 32]>;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub mem_kib: u32,
    pub iters: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_kib: 19 * 1024,
            iters: 2,
            parallelism: 1,
        }
    }
}

/// Password-wrapped secret key as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedSecretKey {
    pub kdf: KdfParams,
    pub salt: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("invalid kdf parameters: {0}")]
    InvalidParameter(String),
    #[error("kdf failed")]
    KdfFailed,
    #[error("encryption failed")]
    EncryptFailed,
    #[error("wrong password")]
    WrongPassword,
    #[error("no wrapped secret key")]
    NotInitialized,
    #[error("key derivation task failed: {0}")]
    Task(String),
}

impl From<VaultError> for KeyDerivationError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::WrongPassword => KeyDerivationError::InvalidInput(err.to_string()),
            VaultError::NotInitialized => KeyDerivationError::MissingSecretKey,
            other => KeyDerivationError::Failed(other.to_string()),
        }
    }
}

/// Holds the wallet secret key and its password-wrapped form.
///
/// A fresh wallet starts with a generated secret key that is not yet
/// protected; `set_password` wraps it and leaves the vault unlocked.
pub struct KeyVault {
    kdf: KdfParams,
    unwrapped: RwLock<Option<SecretKey>>,
    wrapped: RwLock<Option<WrappedSecretKey>>,
}

impl KeyVault {
    /// Vault for a freshly generated wallet.
    pub fn generate(kdf: KdfParams) -> Self {
        let mut secret = Zeroizing::new([0u8; 32]);
        rand::rng().fill_bytes(&mut secret[..]);
        Self {
            kdf,
            unwrapped: RwLock::new(Some(secret)),
            wrapped: RwLock::new(None),
        }
    }

    /// Vault restored from persisted key material, locked.
    pub fn from_wrapped(wrapped: WrappedSecretKey) -> Self {
        Self {
            kdf: wrapped.kdf,
            unwrapped: RwLock::new(None),
            wrapped: RwLock::new(Some(wrapped)),
        }
    }

    /// Vault with no key material at all.
    pub fn empty(kdf: KdfParams) -> Self {
        Self {
            kdf,
            unwrapped: RwLock::new(None),
            wrapped: RwLock::new(None),
        }
    }

    /// Copy of the unlocked secret key, if any.
    pub fn secret_key(&self) -> Option<SecretKey> {
        read(&self.unwrapped).clone()
    }

    pub fn wrapped_secret_key(&self) -> Option<WrappedSecretKey> {
        read(&self.wrapped).clone()
    }

    pub fn is_unlocked(&self) -> bool {
        read(&self.unwrapped).is_some()
    }

    pub async fn unlock(&self, password: &SecretString) -> Result<(), VaultError> {
        let wrapped = self.wrapped_secret_key().ok_or(VaultError::NotInitialized)?;
        let password = Zeroizing::new(password.expose().as_bytes().to_vec());
        let secret = tokio::task::spawn_blocking(move || unwrap_secret(&password, &wrapped))
            .await
            .map_err(|err| VaultError::Task(err.to_string()))??;
        *write(&self.unwrapped) = Some(secret);
        info!("key vault unlocked");
        Ok(())
    }

    async fn wrap(&self, password: &SecretString) -> Result<(), VaultError> {
        let secret = self.secret_key().ok_or(VaultError::NotInitialized)?;
        let password = Zeroizing::new(password.expose().as_bytes().to_vec());
        let kdf = self.kdf;
        let wrapped = tokio::task::spawn_blocking(move || wrap_secret(&password, &secret, kdf))
            .await
            .map_err(|err| VaultError::Task(err.to_string()))??;
        *write(&self.wrapped) = Some(wrapped);
        Ok(())
    }
}

#[async_trait]
impl KeyActionsPort for KeyVault {
    async fn set_password(&self, password: &SecretString) -> Result<(), KeyDerivationError> {
        if password.is_blank() {
            return Err(KeyDerivationError::InvalidInput(
                "password is empty".to_string(),
            ));
        }
        self.wrap(password).await.map_err(|err| {
            warn!(error = %err, "wrapping secret key failed");
            KeyDerivationError::from(err)
        })?;
        info!("secret key protected with new password");
        Ok(())
    }
}

#[async_trait]
impl WalletStatePort for KeyVault {
    async fn has_secret_key(&self) -> bool {
        read(&self.wrapped).is_some()
    }
}

fn derive_kek(password: &[u8], salt: &[u8], kdf: KdfParams) -> Result<SecretKey, VaultError> {
    let params = argon2::Params::new(kdf.mem_kib, kdf.iters, kdf.parallelism, Some(32))
        .map_err(|_| VaultError::InvalidParameter(format!("{kdf:?}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut kek = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(password, salt, &mut kek[..])
        .map_err(|_| VaultError::KdfFailed)?;
    Ok(kek)
}

fn wrap_secret(
    password: &[u8],
    secret: &SecretKey,
    kdf: KdfParams,
) -> Result<WrappedSecretKey, VaultError> {
    let mut salt = vec![0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    let mut nonce = vec![0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);

    let kek = derive_kek(password, &salt, kdf)?;
    let cipher =
        XChaCha20Poly1305::new_from_slice(&kek[..]).map_err(|_| VaultError::EncryptFailed)?;
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), &secret[..])
        .map_err(|_| VaultError::EncryptFailed)?;

    Ok(WrappedSecretKey {
        kdf,
        salt,
        nonce,
        ciphertext,
    })
}

fn unwrap_secret(password: &[u8], wrapped: &WrappedSecretKey) -> Result<SecretKey, VaultError> {
    if wrapped.nonce.len() != NONCE_LEN {
        return Err(VaultError::WrongPassword);
    }
    let kek = derive_kek(password, &wrapped.salt, wrapped.kdf)?;
    let cipher =
        XChaCha20Poly1305::new_from_slice(&kek[..]).map_err(|_| VaultError::EncryptFailed)?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(XNonce::from_slice(&wrapped.nonce), wrapped.ciphertext.as_ref())
            .map_err(|_| VaultError::WrongPassword)?,
    );

    let mut secret = Zeroizing::new([0u8; 32]);
    if plaintext.len() != secret.len() {
        return Err(VaultError::WrongPassword);
    }
    secret.copy_from_slice(&plaintext);
    Ok(secret)
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
