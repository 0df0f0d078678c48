//! Vela-Testkit: test doubles for the sync crates
//!
//! A programmable in-memory ledger ([`MockLedgerGateway`]), a canned
//! identity source ([`StaticIdentityLoader`]), and small fixture helpers.
//! Dev-dependency only; nothing here ships.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use vela_core::{
    AccountKey, Certainty, GatewayError, Identity, IdentityLoader, LedgerGateway, Transaction,
    TransactionId, TransactionPage,
};

/// Build a fixture transaction with a deterministic payload.
pub fn tx(id: u64) -> Transaction {
    Transaction::new(id, serde_json::json!({ "memo": id }))
}

/// Build a fixture account key.
pub fn account(name: &str) -> AccountKey {
    AccountKey::from(name)
}

/// Which gateway call a scripted failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    /// `fetch_balances` with [`Certainty::Uncertified`].
    UncertifiedBalances,
    /// `fetch_balances` with [`Certainty::Certified`].
    CertifiedBalances,
    /// `fetch_tip`.
    Tip,
    /// `fetch_older_page`.
    OlderPage,
}

/// In-memory ledger with scriptable state, failure injection, and call
/// counters.
///
/// Tests mutate the ledger between ticks (`set_balance`,
/// `push_transaction`) and the mock serves whatever the current state is,
/// so streams see the same world a real gateway would show them.
#[derive(Debug, Default)]
pub struct MockLedgerGateway {
    balances: Mutex<HashMap<AccountKey, u64>>,
    certified_overrides: Mutex<HashMap<AccountKey, u64>>,
    transactions: Mutex<HashMap<AccountKey, Vec<Transaction>>>,
    failures: Mutex<HashMap<FetchKind, VecDeque<GatewayError>>>,
    uncertified_calls: AtomicUsize,
    certified_calls: AtomicUsize,
    tip_calls: AtomicUsize,
    older_page_calls: AtomicUsize,
}

impl MockLedgerGateway {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the balance served for `account`.
    ///
    /// Both certainties read this value unless a certified override is
    /// set.
    pub fn set_balance(&self, account: &AccountKey, amount: u64) {
        self.balances
            .lock()
            .unwrap()
            .insert(account.clone(), amount);
    }

    /// Make certified reads of `account` disagree with the query layer.
    pub fn set_certified_balance(&self, account: &AccountKey, amount: u64) {
        self.certified_overrides
            .lock()
            .unwrap()
            .insert(account.clone(), amount);
    }

    /// Append a transaction to `account`'s history.
    pub fn push_transaction(&self, account: &AccountKey, transaction: Transaction) {
        self.transactions
            .lock()
            .unwrap()
            .entry(account.clone())
            .or_default()
            .push(transaction);
    }

    /// Fail the next call of the given kind with `error`.
    ///
    /// Failures queue: injecting twice fails the next two calls.
    pub fn fail_next(&self, kind: FetchKind, error: GatewayError) {
        self.failures
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(error);
    }

    /// Number of uncertified balance fetches served or failed.
    pub fn uncertified_calls(&self) -> usize {
        self.uncertified_calls.load(Ordering::SeqCst)
    }

    /// Number of certified balance fetches served or failed.
    pub fn certified_calls(&self) -> usize {
        self.certified_calls.load(Ordering::SeqCst)
    }

    /// Number of tip fetches served or failed.
    pub fn tip_calls(&self) -> usize {
        self.tip_calls.load(Ordering::SeqCst)
    }

    /// Number of older-page fetches served or failed.
    pub fn older_page_calls(&self) -> usize {
        self.older_page_calls.load(Ordering::SeqCst)
    }

    fn take_failure(&self, kind: FetchKind) -> Option<GatewayError> {
        self.failures
            .lock()
            .unwrap()
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
    }

    /// `account`'s transactions newest first.
    fn sorted_history(&self, account: &AccountKey) -> Vec<Transaction> {
        let mut history = self
            .transactions
            .lock()
            .unwrap()
            .get(account)
            .cloned()
            .unwrap_or_default();
        history.sort_by(|a, b| b.id.cmp(&a.id));
        history
    }

    fn page_from(history: Vec<Transaction>, max_results: usize) -> TransactionPage {
        let transactions: Vec<Transaction> = history.into_iter().take(max_results).collect();
        let oldest_tx_id = transactions.iter().map(|tx| tx.id).min();
        TransactionPage {
            transactions,
            oldest_tx_id,
        }
    }
}

#[async_trait]
impl LedgerGateway for MockLedgerGateway {
    async fn fetch_balances(
        &self,
        _identity: &Identity,
        accounts: &[AccountKey],
        certainty: Certainty,
    ) -> Result<HashMap<AccountKey, u64>, GatewayError> {
        let kind = match certainty {
            Certainty::Certified => {
                self.certified_calls.fetch_add(1, Ordering::SeqCst);
                FetchKind::CertifiedBalances
            }
            Certainty::Uncertified => {
                self.uncertified_calls.fetch_add(1, Ordering::SeqCst);
                FetchKind::UncertifiedBalances
            }
        };
        if let Some(error) = self.take_failure(kind) {
            return Err(error);
        }

        let balances = self.balances.lock().unwrap();
        let overrides = self.certified_overrides.lock().unwrap();
        let mut result = HashMap::new();
        for account in accounts {
            let base = balances.get(account).copied();
            let amount = match certainty {
                Certainty::Certified => overrides.get(account).copied().or(base),
                Certainty::Uncertified => base,
            };
            if let Some(amount) = amount {
                result.insert(account.clone(), amount);
            }
        }
        Ok(result)
    }

    async fn fetch_tip(
        &self,
        _identity: &Identity,
        account: &AccountKey,
        max_results: usize,
    ) -> Result<TransactionPage, GatewayError> {
        self.tip_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_failure(FetchKind::Tip) {
            return Err(error);
        }
        Ok(Self::page_from(self.sorted_history(account), max_results))
    }

    async fn fetch_older_page(
        &self,
        _identity: &Identity,
        account: &AccountKey,
        start: TransactionId,
        max_results: usize,
    ) -> Result<TransactionPage, GatewayError> {
        self.older_page_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_failure(FetchKind::OlderPage) {
            return Err(error);
        }
        let history = self
            .sorted_history(account)
            .into_iter()
            .filter(|tx| tx.id <= start)
            .collect();
        Ok(Self::page_from(history, max_results))
    }
}

/// Identity loader returning a fixed, possibly absent, identity.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityLoader {
    identity: Option<Identity>,
}

impl StaticIdentityLoader {
    /// Loader with an established session for `principal`.
    pub fn session(principal: &str) -> Self {
        Self {
            identity: Some(Identity::new(principal)),
        }
    }

    /// Loader with no session: workers must refuse to start.
    pub fn none() -> Self {
        Self { identity: None }
    }

    /// The identity this loader serves, for building streams directly.
    pub fn identity(&self) -> Option<Identity> {
        self.identity.clone()
    }
}

#[async_trait]
impl IdentityLoader for StaticIdentityLoader {
    async fn load_identity(&self) -> Result<Option<Identity>, GatewayError> {
        Ok(self.identity.clone())
    }
}
