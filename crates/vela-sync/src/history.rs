//! Backward pagination into the transaction window store.
//!
//! The tip stream answers "what is new"; this answers "load older
//! transactions". Each call fetches one page below the stored cursor and
//! merges it into the window, so concurrent or repeated loads converge by
//! the store's dedup and monotonic-cursor rules.

use std::sync::Arc;

use tracing::debug;

use vela_core::{AccountKey, Identity, LedgerGateway, SyncResult};
use vela_store::TransactionWindowStore;

/// Outcome of one pagination step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryProgress {
    /// Older transactions may remain below the cursor.
    HasMore,
    /// The window reaches genesis; further calls are no-ops.
    Complete,
}

/// Loads older transaction pages for accounts on demand.
pub struct HistoryLoader {
    gateway: Arc<dyn LedgerGateway>,
    store: Arc<TransactionWindowStore>,
    page_size: usize,
}

impl HistoryLoader {
    /// Create a loader fetching `page_size` transactions per step.
    ///
    /// `page_size` must be at least 2: the cursor fetch is inclusive, so a
    /// single-transaction page could never make progress.
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        store: Arc<TransactionWindowStore>,
        page_size: usize,
    ) -> Self {
        debug_assert!(page_size >= 2);
        Self {
            gateway,
            store,
            page_size,
        }
    }

    /// Fetch the next older page for `account` and merge it into the
    /// window.
    ///
    /// Resumes from the stored `oldest_tx_id` cursor; the first call for
    /// an account starts from the tip. A page shorter than requested means
    /// the history below the cursor is exhausted and marks the window
    /// completed.
    pub async fn load_older(
        &self,
        identity: &Identity,
        account: &AccountKey,
    ) -> SyncResult<HistoryProgress> {
        if self
            .store
            .window(account)
            .is_some_and(|window| window.is_completed())
        {
            return Ok(HistoryProgress::Complete);
        }

        let page = match self.store.oldest_tx_id(account) {
            Some(cursor) => {
                self.gateway
                    .fetch_older_page(identity, account, cursor, self.page_size)
                    .await?
            }
            None => {
                self.gateway
                    .fetch_tip(identity, account, self.page_size)
                    .await?
            }
        };

        let completed = page.transactions.len() < self.page_size;
        debug!(
            %account,
            fetched = page.transactions.len(),
            completed,
            "merging history page"
        );
        self.store
            .add_transactions(account, page.transactions, page.oldest_tx_id, completed);

        Ok(if completed {
            HistoryProgress::Complete
        } else {
            HistoryProgress::HasMore
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_core::TransactionId;
    use vela_testkit::{account, tx, MockLedgerGateway, StaticIdentityLoader};

    fn loader_for(
        mock: &Arc<MockLedgerGateway>,
        page_size: usize,
    ) -> (HistoryLoader, Arc<TransactionWindowStore>, Identity) {
        let store = Arc::new(TransactionWindowStore::new());
        let loader = HistoryLoader::new(mock.clone(), store.clone(), page_size);
        let identity = StaticIdentityLoader::session("p").identity().unwrap();
        (loader, store, identity)
    }

    #[tokio::test]
    async fn paginates_to_genesis_with_dedup() {
        let mock = Arc::new(MockLedgerGateway::new());
        let a = account("acct");
        for id in 1..=7 {
            mock.push_transaction(&a, tx(id));
        }
        let (loader, store, identity) = loader_for(&mock, 3);

        // Tip page: 7, 6, 5.
        assert_eq!(
            loader.load_older(&identity, &a).await.unwrap(),
            HistoryProgress::HasMore
        );
        assert_eq!(store.oldest_tx_id(&a), Some(TransactionId(5)));

        // Cursor page is inclusive: 5, 4, 3.
        assert_eq!(
            loader.load_older(&identity, &a).await.unwrap(),
            HistoryProgress::HasMore
        );
        // 3, 2, 1 is still a full page.
        assert_eq!(
            loader.load_older(&identity, &a).await.unwrap(),
            HistoryProgress::HasMore
        );
        // 1 alone: short page, genesis reached.
        assert_eq!(
            loader.load_older(&identity, &a).await.unwrap(),
            HistoryProgress::Complete
        );

        let window = store.window(&a).unwrap();
        assert_eq!(window.len(), 7);
        assert!(window.is_completed());
        assert_eq!(window.oldest_tx_id(), Some(TransactionId(1)));

        // Completed windows short-circuit without a fetch.
        let calls = mock.older_page_calls();
        assert_eq!(
            loader.load_older(&identity, &a).await.unwrap(),
            HistoryProgress::Complete
        );
        assert_eq!(mock.older_page_calls(), calls);
    }

    #[tokio::test]
    async fn reset_account_forces_a_full_refetch() {
        let mock = Arc::new(MockLedgerGateway::new());
        let a = account("acct");
        for id in 1..=2 {
            mock.push_transaction(&a, tx(id));
        }
        let (loader, store, identity) = loader_for(&mock, 3);

        assert_eq!(
            loader.load_older(&identity, &a).await.unwrap(),
            HistoryProgress::Complete
        );
        store.reset_account(&a);
        assert!(store.window(&a).is_none());

        assert_eq!(
            loader.load_older(&identity, &a).await.unwrap(),
            HistoryProgress::Complete
        );
        assert_eq!(store.window(&a).unwrap().len(), 2);
    }
}
