//! Sync configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the sync streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Interval between balance poll ticks, measured from tick settle.
    pub balance_poll_interval: Duration,

    /// Interval between tip transaction poll ticks.
    pub tip_poll_interval: Duration,

    /// Number of transactions requested per tip poll.
    pub tip_page_size: usize,

    /// Number of transactions requested per history page.
    pub history_page_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            balance_poll_interval: Duration::from_secs(10),
            tip_poll_interval: Duration::from_secs(10),
            tip_page_size: 20,
            history_page_size: 100,
        }
    }
}

impl SyncConfig {
    /// Config for testing (short intervals, small pages).
    pub fn for_testing() -> Self {
        Self {
            balance_poll_interval: Duration::from_millis(20),
            tip_poll_interval: Duration::from_millis(20),
            tip_page_size: 5,
            history_page_size: 3,
        }
    }
}
