//! Keyed cache with acquisition-ordered write arbitration.
//!
//! Balance and account-detail reads arrive from independently timed
//! sources: fast uncertified polls, slower certified fetches, successive
//! poll ticks. Completion order says nothing about freshness, so writers
//! acquire a [`MutationToken`] when they *begin* their async operation and
//! present it at commit time; the store applies a commit only if no
//! later-acquired write already landed for that key.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::trace;

use vela_core::AccountKey;

/// Ordering marker for one asynchronous write operation.
///
/// Strictly increasing in acquisition order within a store generation.
/// Tokens from before a [`MutationOrderedStore::reset`] carry a stale
/// generation and are permanently fenced off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationToken {
    generation: u64,
    seq: u64,
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    seq: u64,
}

#[derive(Debug)]
struct Inner<V> {
    generation: u64,
    next_seq: u64,
    entries: HashMap<AccountKey, Slot<V>>,
}

/// Keyed cache whose writes are arbitrated by acquisition order.
///
/// Any number of tasks may hold tokens concurrently; the compare-and-store
/// in [`commit`](Self::commit) runs under a write guard that is never held
/// across an await, which makes the `(generation, seq)` check atomic under
/// a parallel runtime.
#[derive(Debug)]
pub struct MutationOrderedStore<V> {
    inner: RwLock<Inner<V>>,
}

impl<V> Default for MutationOrderedStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MutationOrderedStore<V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                generation: 0,
                next_seq: 0,
                entries: HashMap::new(),
            }),
        }
    }

    /// Acquire a write token.
    ///
    /// Call this when the asynchronous operation *begins*, before the
    /// fetch whose result will be committed, not when the result arrives.
    pub fn acquire(&self) -> MutationToken {
        let mut inner = self.inner.write();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        MutationToken {
            generation: inner.generation,
            seq,
        }
    }

    /// Apply `value` to `key` iff `token` is not older than the last token
    /// that committed to that key and the store generation still matches.
    ///
    /// Returns whether the write was applied. A rejected commit is a
    /// defined no-op, not a failure: the value it carried was computed from
    /// a staler view than what the store already holds. Ties (a re-commit
    /// under the same token) favor the newest attempt.
    pub fn commit(&self, key: &AccountKey, value: V, token: MutationToken) -> bool {
        let mut inner = self.inner.write();
        if token.generation != inner.generation {
            trace!(%key, "dropping commit acquired before store reset");
            return false;
        }
        if let Some(slot) = inner.entries.get(key) {
            if slot.seq > token.seq {
                trace!(%key, "skipping commit superseded by a newer write");
                return false;
            }
        }
        inner.entries.insert(
            key.clone(),
            Slot {
                value,
                seq: token.seq,
            },
        );
        true
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Clear all entries and invalidate every outstanding token.
    ///
    /// Commits presenting a pre-reset token are silently dropped from then
    /// on; callers racing a reset need no coordination.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.generation += 1;
    }
}

impl<V: Clone> MutationOrderedStore<V> {
    /// Current value for `key`, if any.
    pub fn get(&self, key: &AccountKey) -> Option<V> {
        self.inner.read().entries.get(key).map(|slot| slot.value.clone())
    }

    /// Copy of all current entries.
    pub fn snapshot(&self) -> HashMap<AccountKey, V> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|(key, slot)| (key.clone(), slot.value.clone()))
            .collect()
    }
}
