use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, instrument};

use super::engine::RelayEngine;

/// Configuration for the cleanup task
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupConfig {
    /// How often to run the cleanup task
    pub cleanup_interval: Duration,
    /// How long a room must be inactive before it is closed
    pub inactivity_threshold: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(30 * 60), // 30 minutes
            inactivity_threshold: Duration::from_secs(24 * 60 * 60), // 24 hours
        }
    }
}

/// Starts the background cleanup task that periodically closes abandoned rooms.
///
/// Covers hosts that vanished without a disconnect ever reaching the relay.
#[instrument(skip(engine))]
pub async fn start_cleanup_task(engine: Arc<RelayEngine>, config: CleanupConfig) {
    info!(
        cleanup_interval_secs = config.cleanup_interval.as_secs(),
        inactivity_threshold_secs = config.inactivity_threshold.as_secs(),
        "Starting room cleanup background task"
    );

    let mut cleanup_interval = interval(config.cleanup_interval);

    loop {
        cleanup_interval.tick().await;
        run_cleanup(&engine, &config).await;
    }
}

async fn run_cleanup(engine: &RelayEngine, config: &CleanupConfig) -> usize {
    let reclaimed = engine.reclaim_rooms(config.inactivity_threshold).await;
    if reclaimed > 0 {
        info!(reclaimed = reclaimed, "Room cleanup completed");
    }
    reclaimed
}
