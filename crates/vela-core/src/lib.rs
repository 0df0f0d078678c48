//! Vela-Core: foundational types for account-state synchronization
//!
//! This crate defines the data model and collaborator interfaces shared by
//! the vela sync crates:
//!
//! - Account and identity newtypes ([`AccountKey`], [`Identity`])
//! - Ledger value types ([`BalanceEntry`], [`Transaction`],
//!   [`TransactionPage`])
//! - The collaborator traits a host must implement ([`LedgerGateway`],
//!   [`IdentityLoader`])
//! - The error taxonomy ([`GatewayError`], [`SyncError`])
//!
//! The crate is intentionally free of runtime or storage concerns; stores
//! live in `vela-store` and streams in `vela-sync`.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod account;
pub mod errors;
pub mod gateway;
pub mod ledger;

pub use account::{AccountKey, Identity};
pub use errors::{SyncError, SyncResult};
pub use gateway::{GatewayError, IdentityLoader, LedgerGateway};
pub use ledger::{BalanceEntry, Certainty, Transaction, TransactionId, TransactionPage};
