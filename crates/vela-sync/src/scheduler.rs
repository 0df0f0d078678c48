//! Recurring job scheduler.
//!
//! Each job runs in its own spawned task, isolated from the host: a
//! long-running tick never blocks anything but itself. The loop runs the
//! job once immediately, awaits it, then sleeps the interval measured from
//! settle rather than wall-clock fixed-rate, so non-overlapping execution is a
//! structural property of the scheduler, not an opt-in guard each stream
//! must remember.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Handle to a periodically running job.
///
/// Created by [`spawn`](Self::spawn), stopped by [`stop`](Self::stop) or
/// [`shutdown`](Self::shutdown). Dropping the handle also signals the job
/// to stop at its next tick boundary.
#[derive(Debug)]
pub struct RecurringJob {
    interval: Duration,
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl RecurringJob {
    /// Spawn `job` on its own task: run once immediately, then re-run
    /// `interval` after each invocation settles.
    ///
    /// The job returns `true` to keep running and `false` to stop the loop
    /// from inside; that is how a stream applies its own failure policy.
    /// The scheduler itself never stops on error; a panic in `job` ends
    /// the task like any tokio task.
    pub fn spawn<F, Fut>(interval: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            loop {
                if *shutdown_rx.borrow() {
                    break;
                }

                // No new invocation can begin until this one resolves.
                if !job().await {
                    debug!("recurring job stopped itself");
                    break;
                }

                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });
        Self {
            interval,
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// The configured interval between invocations.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Cancel future invocations.
    ///
    /// Cooperative, not preemptive: an in-flight invocation completes and
    /// its writes still flow through the staleness-checked store paths.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Whether the job's task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop and wait for the job's task to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for RecurringJob {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
