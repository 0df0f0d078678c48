//! Host-facing worker lifecycle around the sync streams.
//!
//! Each worker owns one stream running on a [`RecurringJob`] task. The
//! host starts and stops workers with direct async calls and receives
//! deltas over a typed [`StreamEvent`] channel; the workers apply the
//! per-stream failure policies: the balance worker retries by default,
//! the wallet worker fails closed.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};

use vela_core::{
    AccountKey, BalanceEntry, IdentityLoader, Identity, LedgerGateway, SyncError, SyncResult,
};
use vela_store::MutationOrderedStore;

use crate::balances::BalanceSyncStream;
use crate::config::SyncConfig;
use crate::messages::StreamEvent;
use crate::scheduler::RecurringJob;
use crate::tip::TipTransactionStream;

/// Lifecycle state of a sync worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Worker not yet started, or stopped.
    Stopped,
    /// Worker loading its identity and building its stream.
    Starting,
    /// Worker ticking.
    Running,
    /// Worker shutting down.
    Stopping,
}

/// Load the session identity once per worker lifetime.
///
/// Shared start prerequisite for both workers; a missing identity is a
/// start error, not something to retry on a timer.
async fn load_identity(loader: &Arc<dyn IdentityLoader>) -> SyncResult<Identity> {
    match loader.load_identity().await {
        Ok(Some(identity)) => Ok(identity),
        Ok(None) => Err(SyncError::MissingIdentity),
        Err(source) => Err(source.into()),
    }
}

/// Background worker keeping a set of account balances fresh.
#[derive(Clone)]
pub struct BalanceSyncWorker {
    config: SyncConfig,
    gateway: Arc<dyn LedgerGateway>,
    store: Arc<MutationOrderedStore<BalanceEntry>>,
    identity: Arc<dyn IdentityLoader>,
    events: mpsc::Sender<StreamEvent>,
    job: Arc<RwLock<Option<RecurringJob>>>,
    state: Arc<RwLock<WorkerState>>,
}

impl BalanceSyncWorker {
    /// Create a stopped worker.
    pub fn new(
        config: SyncConfig,
        gateway: Arc<dyn LedgerGateway>,
        store: Arc<MutationOrderedStore<BalanceEntry>>,
        identity: Arc<dyn IdentityLoader>,
        events: mpsc::Sender<StreamEvent>,
    ) -> Self {
        Self {
            config,
            gateway,
            store,
            identity,
            events,
            job: Arc::new(RwLock::new(None)),
            state: Arc::new(RwLock::new(WorkerState::Stopped)),
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Whether the worker is ticking.
    pub async fn is_running(&self) -> bool {
        *self.state.read().await == WorkerState::Running
    }

    /// Start polling balances for `accounts` at the configured interval.
    ///
    /// Loads the identity once before the first tick. Starting a running
    /// worker is a no-op.
    pub async fn start(&self, accounts: Vec<AccountKey>) -> SyncResult<()> {
        if *self.state.read().await == WorkerState::Running {
            return Ok(());
        }
        *self.state.write().await = WorkerState::Starting;

        let identity = match load_identity(&self.identity).await {
            Ok(identity) => identity,
            Err(error) => {
                *self.state.write().await = WorkerState::Stopped;
                return Err(error);
            }
        };

        let stream = Arc::new(Mutex::new(BalanceSyncStream::new(
            self.gateway.clone(),
            self.store.clone(),
            identity,
            accounts,
            self.events.clone(),
        )));
        let events = self.events.clone();
        let job = RecurringJob::spawn(self.config.balance_poll_interval, move || {
            let stream = stream.clone();
            let events = events.clone();
            async move {
                match stream.lock().await.tick().await {
                    Ok(()) => true,
                    Err(SyncError::ChannelClosed) => {
                        debug!("balance sync host went away; stopping");
                        false
                    }
                    Err(error) => {
                        // Uncertified polls are cheap and idempotent:
                        // retry next tick.
                        warn!(%error, "balance sync tick failed; retrying next interval");
                        events.send(StreamEvent::Failed { error }).await.is_ok()
                    }
                }
            }
        });

        *self.job.write().await = Some(job);
        *self.state.write().await = WorkerState::Running;
        info!("balance sync worker started");
        Ok(())
    }

    /// Stop polling.
    ///
    /// Cancels future ticks only; an in-flight tick completes and its
    /// writes still pass the store's staleness checks.
    pub async fn stop(&self) {
        if *self.state.read().await == WorkerState::Stopped {
            return;
        }
        *self.state.write().await = WorkerState::Stopping;
        if let Some(job) = self.job.write().await.take() {
            job.shutdown().await;
        }
        *self.state.write().await = WorkerState::Stopped;
        info!("balance sync worker stopped");
    }
}

/// Background worker watching one account's tip transactions.
#[derive(Clone)]
pub struct WalletSyncWorker {
    config: SyncConfig,
    gateway: Arc<dyn LedgerGateway>,
    identity: Arc<dyn IdentityLoader>,
    events: mpsc::Sender<StreamEvent>,
    job: Arc<RwLock<Option<RecurringJob>>>,
    state: Arc<RwLock<WorkerState>>,
}

impl WalletSyncWorker {
    /// Create a stopped worker.
    pub fn new(
        config: SyncConfig,
        gateway: Arc<dyn LedgerGateway>,
        identity: Arc<dyn IdentityLoader>,
        events: mpsc::Sender<StreamEvent>,
    ) -> Self {
        Self {
            config,
            gateway,
            identity,
            events,
            job: Arc::new(RwLock::new(None)),
            state: Arc::new(RwLock::new(WorkerState::Stopped)),
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Whether the worker is ticking.
    pub async fn is_running(&self) -> bool {
        *self.state.read().await == WorkerState::Running
    }

    /// Start polling the tip of `account` at the configured interval.
    pub async fn start(&self, account: AccountKey) -> SyncResult<()> {
        if *self.state.read().await == WorkerState::Running {
            return Ok(());
        }
        *self.state.write().await = WorkerState::Starting;

        let identity = match load_identity(&self.identity).await {
            Ok(identity) => identity,
            Err(error) => {
                *self.state.write().await = WorkerState::Stopped;
                return Err(error);
            }
        };

        let stream = Arc::new(Mutex::new(TipTransactionStream::new(
            self.gateway.clone(),
            identity,
            account,
            self.config.tip_page_size,
            self.events.clone(),
        )));
        let events = self.events.clone();
        let state = self.state.clone();
        let job = RecurringJob::spawn(self.config.tip_poll_interval, move || {
            let stream = stream.clone();
            let events = events.clone();
            let state = state.clone();
            async move {
                match stream.lock().await.tick().await {
                    Ok(()) => true,
                    Err(error) => {
                        // A persistent failure here risks silently missing
                        // or duplicating tip transactions on retry: fail
                        // closed and wait for an explicit restart.
                        warn!(%error, "wallet sync tick failed; stopping stream");
                        if !matches!(error, SyncError::ChannelClosed) {
                            let _ = events.send(StreamEvent::Failed { error }).await;
                        }
                        *state.write().await = WorkerState::Stopped;
                        false
                    }
                }
            }
        });

        *self.job.write().await = Some(job);
        *self.state.write().await = WorkerState::Running;
        info!("wallet sync worker started");
        Ok(())
    }

    /// Stop polling. Cooperative, like [`BalanceSyncWorker::stop`].
    pub async fn stop(&self) {
        if *self.state.read().await == WorkerState::Stopped {
            return;
        }
        *self.state.write().await = WorkerState::Stopping;
        if let Some(job) = self.job.write().await.take() {
            job.shutdown().await;
        }
        *self.state.write().await = WorkerState::Stopped;
        info!("wallet sync worker stopped");
    }
}
