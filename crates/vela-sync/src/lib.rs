//! Vela-Sync: background synchronization streams for account state
//!
//! This crate keeps the caches in `vela-store` fresh:
//!
//! - [`RecurringJob`] runs a unit of work on a fixed interval in its own
//!   task, with structurally non-overlapping execution and cooperative
//!   stop.
//! - [`BalanceSyncStream`] polls uncertified balances for a set of
//!   accounts and escalates to a certified fetch only when a change is
//!   detected.
//! - [`TipTransactionStream`] polls the most recent transactions for one
//!   account and emits only the ones not seen before.
//! - [`BalanceSyncWorker`] / [`WalletSyncWorker`] wrap the streams in a
//!   host-facing lifecycle; deltas flow back over a typed [`StreamEvent`]
//!   channel.
//! - [`HistoryLoader`] pages backward into the transaction window
//!   store, resuming from the stored oldest-id cursor.
//!
//! The streams hold no shared state of their own beyond a private
//! last-seen snapshot used for diffing; every cache mutation goes through
//! the stores' write protocols.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod balances;
pub mod config;
pub mod history;
pub mod messages;
pub mod scheduler;
pub mod tip;
pub mod worker;

pub use balances::BalanceSyncStream;
pub use config::SyncConfig;
pub use history::{HistoryLoader, HistoryProgress};
pub use messages::StreamEvent;
pub use scheduler::RecurringJob;
pub use tip::TipTransactionStream;
pub use worker::{BalanceSyncWorker, WalletSyncWorker, WorkerState};

// Re-export the error types streams surface, for host convenience.
pub use vela_core::{SyncError, SyncResult};
