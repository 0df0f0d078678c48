//! Worker-to-host event protocol.
//!
//! Workers send only deltas; the host already owns the authoritative
//! stores and needs no full-state dumps. The enum is a closed sum so that
//! adding a message kind is a compile-time-checked change at every
//! consumer `match`.

use vela_core::{AccountKey, BalanceEntry, SyncError, Transaction, TransactionId};

/// One message per tick from a sync stream to its host.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Balance delta: the accounts whose value changed this tick.
    ///
    /// Emitted twice on a changed tick: once with uncertified entries
    /// after the optimistic write, once with certified entries after the
    /// confirming fetch.
    Balances {
        /// Changed accounts with their new balance entries.
        entries: Vec<(AccountKey, BalanceEntry)>,
    },

    /// Newly observed tip transactions for the wallet account.
    Wallet {
        /// Transactions not previously seen by the stream, newest first.
        new_transactions: Vec<Transaction>,
        /// Highest id on the fetched tip page.
        most_recent_id: TransactionId,
        /// Lowest id covered by the tip page, when the source reports one.
        oldest_tx_id: Option<TransactionId>,
    },

    /// A tick failed. The host decides on presentation; the stream's own
    /// retry-or-stop policy has already been applied.
    Failed {
        /// The failure.
        error: SyncError,
    },
}
