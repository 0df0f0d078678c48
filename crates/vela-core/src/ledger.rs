//! Ledger value types: balances, transactions, fetch pages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Read certainty requested from the ledger.
///
/// Certified reads are verifiable against the network state root and
/// materially more expensive; uncertified query reads are fast and used for
/// optimistic updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Certainty {
    /// Cryptographically verifiable read.
    Certified,
    /// Fast, unverified query read.
    Uncertified,
}

impl Certainty {
    /// Whether this is a certified read.
    pub fn is_certified(self) -> bool {
        matches!(self, Self::Certified)
    }
}

/// Cached balance for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    /// Balance amount in the ledger's smallest unit.
    pub amount: u64,
    /// Whether the amount came from a certified read.
    pub certified: bool,
}

impl BalanceEntry {
    /// Entry backed by a certified read.
    pub fn certified(amount: u64) -> Self {
        Self {
            amount,
            certified: true,
        }
    }

    /// Entry backed by an uncertified query read.
    pub fn uncertified(amount: u64) -> Self {
        Self {
            amount,
            certified: false,
        }
    }
}

/// Ledger transaction index.
///
/// Strictly increasing with recency within one account's history.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// The raw index value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for TransactionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A ledger transaction, immutable once observed.
///
/// The payload is opaque to the sync core; only the id participates in
/// ordering and deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction index within the account's history.
    pub id: TransactionId,
    /// Ledger-specific transaction body.
    pub payload: serde_json::Value,
}

impl Transaction {
    /// Create a transaction from its id and opaque body.
    pub fn new(id: impl Into<TransactionId>, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

/// One fetched slice of an account's transaction history, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPage {
    /// Transactions in the slice, newest first.
    pub transactions: Vec<Transaction>,
    /// Lowest id covered by this slice, when the source reports one.
    pub oldest_tx_id: Option<TransactionId>,
}

impl TransactionPage {
    /// Page with no transactions and no cursor.
    pub fn empty() -> Self {
        Self {
            transactions: Vec::new(),
            oldest_tx_id: None,
        }
    }

    /// Highest transaction id on the page, if any.
    pub fn most_recent_id(&self) -> Option<TransactionId> {
        self.transactions.iter().map(|tx| tx.id).max()
    }
}
