//! Vela-Store: shared caches for account-state synchronization
//!
//! Two stores back the sync streams:
//!
//! - [`MutationOrderedStore`] is a keyed cache whose writers present
//!   acquisition-ordered tokens, so an out-of-order network completion can
//!   never clobber a fresher value.
//! - [`TransactionWindowStore`] holds per-account backward-paginated
//!   transaction history with dedup-by-id and a monotonically shrinking
//!   oldest-id cursor.
//!
//! Both are safe under interleaved access from concurrent tasks because
//! correctness is enforced by token/id comparison inside a short lock
//! section, never by mutual exclusion held across awaits.
//!
//! Stores are not ambient globals. [`SessionStores`] is the owning context:
//! constructed at session start, injected into streams, reset at logout.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod mutation;
pub mod window;

pub use mutation::{MutationOrderedStore, MutationToken};
pub use window::{TransactionWindow, TransactionWindowStore};

use std::sync::Arc;

use vela_core::BalanceEntry;

/// Owning context for the session's cache domains.
///
/// One instance per session. Streams receive cloned [`Arc`] handles to the
/// individual stores; nothing else may write to them.
#[derive(Debug, Clone, Default)]
pub struct SessionStores {
    /// Per-account balances, written by the balance sync stream.
    pub balances: Arc<MutationOrderedStore<BalanceEntry>>,
    /// Per-account paginated transaction history.
    pub transactions: Arc<TransactionWindowStore>,
}

impl SessionStores {
    /// Create empty stores for a new session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all cached state, e.g. at logout.
    ///
    /// Bumps the balance store generation so commits from operations begun
    /// before the reset are silently fenced off.
    pub fn reset(&self) {
        self.balances.reset();
        self.transactions.reset();
    }
}
