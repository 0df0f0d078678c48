//! Collaborator interfaces to the ledger and identity layers.
//!
//! The sync core never talks to the network itself. Hosts provide these
//! traits; the core treats them as black boxes whose failures surface as
//! [`GatewayError`]. Timeouts and transport retries are the implementor's
//! concern.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::account::{AccountKey, Identity};
use crate::ledger::{Certainty, TransactionId, TransactionPage};

/// Errors surfaced by gateway collaborators.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The transport failed to reach the ledger.
    #[error("transport failure: {reason}")]
    Transport {
        /// Reason for the failure.
        reason: String,
    },
    /// The ledger rejected the call.
    #[error("call rejected: {reason}")]
    Rejected {
        /// Rejection detail reported by the ledger.
        reason: String,
    },
    /// The response could not be decoded.
    #[error("invalid response: {reason}")]
    InvalidResponse {
        /// Decoding detail.
        reason: String,
    },
}

impl GatewayError {
    /// Transport failure with the given reason.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Rejection with the given reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Read access to a ledger and its transaction index.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Fetch balances for the given accounts at the requested certainty.
    ///
    /// The returned map covers every requested account the ledger knows;
    /// implementations fan out per-account calls in parallel.
    async fn fetch_balances(
        &self,
        identity: &Identity,
        accounts: &[AccountKey],
        certainty: Certainty,
    ) -> Result<HashMap<AccountKey, u64>, GatewayError>;

    /// Fetch the most recent transactions for one account (the tip),
    /// independent of any pagination position.
    async fn fetch_tip(
        &self,
        identity: &Identity,
        account: &AccountKey,
        max_results: usize,
    ) -> Result<TransactionPage, GatewayError>;

    /// Fetch up to `max_results` transactions with ids at or below `start`,
    /// newest first.
    ///
    /// `start` is included so a caller can resume from a stored cursor; the
    /// overlap is deduplicated downstream.
    async fn fetch_older_page(
        &self,
        identity: &Identity,
        account: &AccountKey,
        start: TransactionId,
        max_results: usize,
    ) -> Result<TransactionPage, GatewayError>;
}

/// Access to the session identity.
#[async_trait]
pub trait IdentityLoader: Send + Sync {
    /// Load the current session identity, if one is available.
    ///
    /// Called once per worker lifetime before the first tick; `None` means
    /// no session is established and the worker must not start.
    async fn load_identity(&self) -> Result<Option<Identity>, GatewayError>;
}
