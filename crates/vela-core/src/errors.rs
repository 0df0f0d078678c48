//! Stream-level error taxonomy.
//!
//! Only genuine failures live here. A commit that loses the token-ordering
//! race and a commit fenced off by a store reset are defined no-ops, not
//! errors; they are reported as a `bool` from the store's `commit` and are
//! never logged as failures.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Result alias used throughout the sync crates.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised by sync streams and workers.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// A gateway collaborator call failed.
    ///
    /// Transient for the balance stream (the next tick retries); fatal for
    /// the tip transaction stream (it stops its own timer).
    #[error("ledger fetch failed: {source}")]
    Fetch {
        /// The underlying gateway failure.
        #[from]
        source: GatewayError,
    },

    /// No session identity was available when the worker started.
    #[error("no identity available for sync")]
    MissingIdentity,

    /// The host dropped its event receiver; the stream has nobody to
    /// report to and stops.
    #[error("event channel closed by host")]
    ChannelClosed,
}
