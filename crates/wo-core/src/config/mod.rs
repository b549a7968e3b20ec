//! Application configuration domain model.
//!
//! Pure data: the binary's bootstrap loads it from TOML, missing keys fall
//! back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::password::{DEFAULT_MIN_CHARACTER_CLASSES, DEFAULT_MIN_LENGTH, DEFAULT_WEAK_PASSWORDS};

/// Debounce window applied to live password evaluation.
pub const DEFAULT_DEBOUNCE_MS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub password_policy: PasswordPolicyConfig,
    pub evaluator: EvaluatorConfig,
    pub resolver: ResolverConfig,
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicyConfig {
    pub min_length: usize,
    pub min_character_classes: usize,
    pub weak_passwords: Vec<String>,
}

impl Default for PasswordPolicyConfig {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            min_character_classes: DEFAULT_MIN_CHARACTER_CLASSES,
            weak_passwords: DEFAULT_WEAK_PASSWORDS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub debounce_ms: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Reject out-of-range account indexes with an error instead of
    /// cancelling the request. Defaults to on in debug builds.
    pub strict_account_index: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strict_account_index: cfg!(debug_assertions),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Number of accounts derived once the wallet is unlocked.
    pub account_count: usize,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self { account_count: 1 }
    }
}
