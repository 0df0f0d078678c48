//! Account and identity newtypes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ledger account identifier.
///
/// Opaque, ledger-specific address encoding. Unique per account and stable
/// for the account's lifetime; used as the key of every per-account cache.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountKey {
    key: String,
}

impl AccountKey {
    /// Create an account key from its ledger address encoding.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Get the address string.
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl From<&str> for AccountKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for AccountKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Session identity under which ledger calls are made.
///
/// Produced once per worker lifetime by [`crate::IdentityLoader`] and passed
/// to every gateway call. The contents are opaque to the sync core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    principal: String,
}

impl Identity {
    /// Create an identity from its principal encoding.
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
        }
    }

    /// Get the principal string.
    pub fn principal(&self) -> &str {
        &self.principal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_round_trips_address() {
        let key = AccountKey::from("d3e13d4777e22367532053190b6c6ccf57444a61337e996242b1abfb52cf92c8");
        assert_eq!(key.as_str(), key.to_string());
        assert_eq!(key, AccountKey::new(key.as_str().to_string()));
    }
}
