//! Per-account paginated transaction history.
//!
//! Supports "load older transactions" pagination, orthogonal to tip
//! polling. Pages from concurrent certified and uncertified loads may land
//! in any order; the merge converges to the same window regardless because
//! it deduplicates by id, takes the monotonic minimum for the cursor, and
//! ORs the completion flag.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use tracing::debug;

use vela_core::{AccountKey, Transaction, TransactionId};

/// Accumulated history window for one account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionWindow {
    transactions: BTreeMap<TransactionId, Transaction>,
    oldest_tx_id: Option<TransactionId>,
    completed: bool,
}

impl TransactionWindow {
    /// Transactions in the window, newest first.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions.values().rev().cloned().collect()
    }

    /// Number of distinct transactions in the window.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the window holds no transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Whether the window contains the given transaction id.
    pub fn contains(&self, id: TransactionId) -> bool {
        self.transactions.contains_key(&id)
    }

    /// Lower bound of contiguous history fetched so far.
    ///
    /// Only ever decreases or stays the same while the window lives.
    pub fn oldest_tx_id(&self) -> Option<TransactionId> {
        self.oldest_tx_id
    }

    /// Whether the full history down to genesis has been retrieved.
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

/// Store of per-account [`TransactionWindow`]s.
#[derive(Debug, Default)]
pub struct TransactionWindowStore {
    windows: RwLock<HashMap<AccountKey, TransactionWindow>>,
}

impl TransactionWindowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a fetched page into the account's window.
    ///
    /// A transaction already present is neither duplicated nor replaced.
    /// `page_oldest_id` lowers the cursor only; a missing or larger value
    /// leaves it unchanged. `completed` is sticky once true until the
    /// window is reset.
    pub fn add_transactions(
        &self,
        account: &AccountKey,
        page: Vec<Transaction>,
        page_oldest_id: Option<TransactionId>,
        completed: bool,
    ) {
        let mut windows = self.windows.write();
        let window = windows.entry(account.clone()).or_default();

        for tx in page {
            window.transactions.entry(tx.id).or_insert(tx);
        }

        if let Some(page_oldest) = page_oldest_id {
            window.oldest_tx_id = match window.oldest_tx_id {
                Some(current) if current <= page_oldest => Some(current),
                _ => Some(page_oldest),
            };
        }

        window.completed |= completed;
    }

    /// Copy of the account's window, if one exists.
    pub fn window(&self, account: &AccountKey) -> Option<TransactionWindow> {
        self.windows.read().get(account).cloned()
    }

    /// The account's pagination cursor, if one exists.
    pub fn oldest_tx_id(&self, account: &AccountKey) -> Option<TransactionId> {
        self.windows
            .read()
            .get(account)
            .and_then(TransactionWindow::oldest_tx_id)
    }

    /// Drop the account's entire window.
    ///
    /// Used when a full refetch is required, e.g. after a certified balance
    /// correction implies the cached history may be stale.
    pub fn reset_account(&self, account: &AccountKey) {
        if self.windows.write().remove(account).is_some() {
            debug!(%account, "dropped transaction window");
        }
    }

    /// Drop all windows.
    pub fn reset(&self) {
        self.windows.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tx(id: u64) -> Transaction {
        Transaction::new(id, serde_json::json!({ "memo": id }))
    }

    fn acct() -> AccountKey {
        AccountKey::from("acct")
    }

    #[test]
    fn overlapping_pages_dedupe_and_lower_cursor() {
        let store = TransactionWindowStore::new();
        let a = acct();

        store.add_transactions(&a, vec![tx(5)], Some(TransactionId(5)), false);
        store.add_transactions(&a, vec![tx(5), tx(4)], Some(TransactionId(4)), false);

        let window = store.window(&a).unwrap();
        assert_eq!(window.len(), 2);
        assert!(window.contains(TransactionId(4)));
        assert!(window.contains(TransactionId(5)));
        assert_eq!(window.oldest_tx_id(), Some(TransactionId(4)));
        assert!(!window.is_completed());
    }

    #[test]
    fn repeated_page_is_idempotent() {
        let store = TransactionWindowStore::new();
        let a = acct();
        let page = vec![tx(9), tx(8), tx(7)];

        store.add_transactions(&a, page.clone(), Some(TransactionId(7)), false);
        let once = store.window(&a).unwrap();
        store.add_transactions(&a, page, Some(TransactionId(7)), false);
        let twice = store.window(&a).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.len(), 3);
    }

    #[test]
    fn cursor_never_moves_forward() {
        let store = TransactionWindowStore::new();
        let a = acct();

        store.add_transactions(&a, vec![tx(4)], Some(TransactionId(4)), false);
        // A later page with no cursor leaves it alone.
        store.add_transactions(&a, vec![tx(3)], None, false);
        assert_eq!(store.oldest_tx_id(&a), Some(TransactionId(4)));
        // A larger cursor leaves it alone too.
        store.add_transactions(&a, vec![tx(8)], Some(TransactionId(8)), false);
        assert_eq!(store.oldest_tx_id(&a), Some(TransactionId(4)));

        store.add_transactions(&a, vec![tx(2)], Some(TransactionId(2)), false);
        assert_eq!(store.oldest_tx_id(&a), Some(TransactionId(2)));
    }

    #[test]
    fn completed_is_sticky_until_reset() {
        let store = TransactionWindowStore::new();
        let a = acct();

        store.add_transactions(&a, vec![tx(1)], Some(TransactionId(1)), true);
        // A late-arriving partial page cannot un-complete the window.
        store.add_transactions(&a, vec![tx(3)], Some(TransactionId(3)), false);
        assert!(store.window(&a).unwrap().is_completed());

        store.reset_account(&a);
        assert!(store.window(&a).is_none());
        store.add_transactions(&a, vec![tx(3)], Some(TransactionId(3)), false);
        assert!(!store.window(&a).unwrap().is_completed());
    }

    #[test]
    fn reset_account_leaves_other_accounts_alone() {
        let store = TransactionWindowStore::new();
        let a = AccountKey::from("a");
        let b = AccountKey::from("b");
        store.add_transactions(&a, vec![tx(1)], Some(TransactionId(1)), false);
        store.add_transactions(&b, vec![tx(2)], Some(TransactionId(2)), false);

        store.reset_account(&a);
        assert!(store.window(&a).is_none());
        assert!(store.window(&b).is_some());

        store.reset();
        assert!(store.window(&b).is_none());
    }

    proptest! {
        /// The merge converges to the same window under any arrival order.
        #[test]
        fn merge_is_order_independent(
            (pages, order) in proptest::collection::vec(
                (
                    proptest::collection::vec(0u64..40, 0..6),
                    proptest::option::of(0u64..40),
                    any::<bool>(),
                ),
                1..6,
            )
            .prop_flat_map(|pages| {
                let n = pages.len();
                (Just(pages), Just((0..n).collect::<Vec<usize>>()).prop_shuffle())
            })
        ) {
            let a = acct();
            let in_order = TransactionWindowStore::new();
            let shuffled = TransactionWindowStore::new();

            for (ids, oldest, completed) in &pages {
                let page = ids.iter().map(|&id| tx(id)).collect();
                in_order.add_transactions(&a, page, oldest.map(TransactionId), *completed);
            }
            for &i in &order {
                let (ids, oldest, completed) = &pages[i];
                let page = ids.iter().map(|&id| tx(id)).collect();
                shuffled.add_transactions(&a, page, oldest.map(TransactionId), *completed);
            }

            prop_assert_eq!(in_order.window(&a), shuffled.window(&a));
        }
    }
}
