//! DetectionScheduler processor.
//!
//! Runs a detection cycle immediately, then again `interval` after each
//! cycle *completes*, so cycles can never overlap regardless of how long the
//! per-address work takes. A cycle in progress is never interrupted; a
//! shutdown requested meanwhile is honored once it returns.

use crate::processors::detector::{CheckOutcome, NewAddressDetector};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Default pause between two detection cycles.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

pub struct DetectionScheduler {
    detector: Arc<NewAddressDetector>,
    interval: Duration,
}

impl DetectionScheduler {
    pub fn new(detector: Arc<NewAddressDetector>, interval: Duration) -> Self {
        Self { detector, interval }
    }

    /// Run until `shutdown_rx` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "DetectionScheduler started"
        );

        loop {
            if *shutdown_rx.borrow_and_update() {
                break;
            }

            match self.detector.check().await {
                CheckOutcome::Completed { new_addresses } => debug!(
                    new_addresses = new_addresses.len(),
                    "Detection cycle completed"
                ),
                outcome => debug!(?outcome, "Detection cycle ended early"),
            }

            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("DetectionScheduler received shutdown signal");
                        break;
                    }
                }

                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("DetectionScheduler shutdown complete");
    }
}
