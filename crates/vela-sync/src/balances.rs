//! Balance sync stream.
//!
//! Keeps a set of account balances fresh at minimum cost. Certified reads
//! are materially more expensive than uncertified query reads, so each
//! tick polls uncertified first, diffs against the stream's private
//! snapshot, and pays for a certified round-trip only when a change is
//! plausible.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use vela_core::{
    AccountKey, BalanceEntry, Certainty, Identity, LedgerGateway, SyncError, SyncResult,
};
use vela_store::MutationOrderedStore;

use crate::messages::StreamEvent;

/// Polls balances for a set of tracked accounts.
///
/// The stream's snapshot is private diffing state, discarded with the
/// stream; the shared [`MutationOrderedStore`] is the only cache it
/// writes, always through the token protocol.
pub struct BalanceSyncStream {
    gateway: Arc<dyn LedgerGateway>,
    store: Arc<MutationOrderedStore<BalanceEntry>>,
    identity: Identity,
    accounts: Vec<AccountKey>,
    snapshot: HashMap<AccountKey, u64>,
    events: mpsc::Sender<StreamEvent>,
}

impl BalanceSyncStream {
    /// Create a stream tracking `accounts`.
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        store: Arc<MutationOrderedStore<BalanceEntry>>,
        identity: Identity,
        accounts: Vec<AccountKey>,
        events: mpsc::Sender<StreamEvent>,
    ) -> Self {
        Self {
            gateway,
            store,
            identity,
            accounts,
            snapshot: HashMap::new(),
            events,
        }
    }

    /// Run one poll tick.
    ///
    /// On a fetch failure the error propagates and the remainder of the
    /// tick is abandoned; commits are infallible and happen strictly
    /// between awaits, so no write phase is ever half-applied. The caller
    /// decides whether to retry (the balance worker always does).
    pub async fn tick(&mut self) -> SyncResult<()> {
        // Token acquired as the optimistic write operation begins, before
        // the fetch whose result it will commit.
        let token = self.store.acquire();
        let uncertified = self
            .gateway
            .fetch_balances(&self.identity, &self.accounts, Certainty::Uncertified)
            .await?;

        let baseline = self.snapshot.clone();
        let changed: Vec<(AccountKey, u64)> = self
            .accounts
            .iter()
            .filter_map(|account| {
                let amount = *uncertified.get(account)?;
                (baseline.get(account) != Some(&amount)).then(|| (account.clone(), amount))
            })
            .collect();

        if changed.is_empty() {
            trace!("balances unchanged; skipping certified fetch");
            return Ok(());
        }
        debug!(changed = changed.len(), "uncertified poll detected balance changes");

        let mut entries = Vec::with_capacity(changed.len());
        for (account, amount) in &changed {
            let entry = BalanceEntry::uncertified(*amount);
            self.store.commit(account, entry, token);
            self.snapshot.insert(account.clone(), *amount);
            entries.push((account.clone(), entry));
        }
        self.send(StreamEvent::Balances { entries }).await?;

        // Certified confirmation covers *all* tracked accounts, not just
        // the changed ones, to pick up any corrections. Its later token is
        // what lets it supersede the optimistic write above even if a
        // straggling uncertified commit were still in flight.
        let token = self.store.acquire();
        let certified = self
            .gateway
            .fetch_balances(&self.identity, &self.accounts, Certainty::Certified)
            .await?;

        let mut confirmed = Vec::new();
        for account in &self.accounts {
            let Some(&amount) = certified.get(account) else {
                continue;
            };
            let entry = BalanceEntry::certified(amount);
            self.store.commit(account, entry, token);
            self.snapshot.insert(account.clone(), amount);
            if baseline.get(account) != Some(&amount) {
                confirmed.push((account.clone(), entry));
            }
        }
        if !confirmed.is_empty() {
            self.send(StreamEvent::Balances { entries: confirmed }).await?;
        }
        Ok(())
    }

    async fn send(&self, event: StreamEvent) -> SyncResult<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| SyncError::ChannelClosed)
    }
}
