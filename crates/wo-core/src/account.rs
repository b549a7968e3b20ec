//! Wallet accounts offered to a connecting app.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub index: usize,
    pub address: String,
}

/// Ordered accounts available for the pending request.
///
/// Built once from freshly unlocked key material and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountSet {
    accounts: Vec<Account>,
}

impl AccountSet {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Account> {
        self.accounts.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }
}
