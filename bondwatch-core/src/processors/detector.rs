//! NewAddressDetector processor.
//!
//! One detection cycle:
//! 1. Fetch the registry entries (contract order, oldest first)
//! 2. Keep the `window_size` most recent ones, newest first
//! 3. Classify every entry whose address is absent from the stored snapshot
//!    as new
//! 4. Persist the new window *before* any notification is attempted
//! 5. For each new entry, in window order: alert the operator, and when the
//!    first token matches the keyword wait for the initial swap and buy
//!
//! Cycles never overlap: a `check` issued while another one runs returns
//! immediately.

use crate::chain::{PurchaseExecutor, RegistrySource};
use crate::config::KeywordStore;
use crate::entities::{AddressSnapshotStore, BondingAddress};
use crate::events::Alert;
use crate::processors::dispatcher::NotificationDispatcher;
use crate::processors::swap_wait::{SwapWaitSession, SwapWaitState, SwapWaiter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// Default number of most recent entries compared per cycle.
pub const DEFAULT_WINDOW_SIZE: usize = 3;

/// Result of one `check` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Another cycle was running; nothing was done.
    AlreadyRunning,
    /// The registry could not be read; the cycle was skipped.
    FetchFailed,
    /// The new window could not be stored; nothing was processed.
    PersistFailed,
    Completed { new_addresses: Vec<BondingAddress> },
}

/// Collaborators and settings of the detector.
pub struct DetectorParts {
    pub registry: Arc<dyn RegistrySource>,
    pub snapshots: AddressSnapshotStore,
    pub keyword: KeywordStore,
    pub dispatcher: NotificationDispatcher,
    pub swap_waiter: SwapWaiter,
    pub purchaser: Arc<dyn PurchaseExecutor>,
    pub window_size: usize,
    pub swap_wait_max_attempts: u32,
}

/// Diffs the registry against the stored window and acts on new entries.
pub struct NewAddressDetector {
    parts: DetectorParts,
    running: AtomicBool,
}

/// Clears the running flag when a cycle ends, however it ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl NewAddressDetector {
    pub fn new(parts: DetectorParts) -> Self {
        Self {
            parts,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one detection cycle.
    pub async fn check(&self) -> CheckOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Detection cycle already running, skipping");
            return CheckOutcome::AlreadyRunning;
        }
        let _guard = RunningGuard(&self.running);

        let entries = match self.parts.registry.fetch_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "Failed to fetch registry entries");
                return CheckOutcome::FetchFailed;
            }
        };

        let window = latest_window(entries, self.parts.window_size);
        let stored = self.parts.snapshots.load().await;
        let fresh = new_addresses(&window, &stored);

        debug!(
            window = window.len(),
            stored = stored.len(),
            new = fresh.len(),
            "Compared registry window with stored snapshot"
        );

        if let Err(e) = self.parts.snapshots.save(&window).await {
            error!(error = %e, "Failed to persist address snapshot");
            return CheckOutcome::PersistFailed;
        }

        if fresh.is_empty() {
            debug!("No new bonding addresses");
        }
        for entry in &fresh {
            self.process_new_address(entry).await;
        }

        CheckOutcome::Completed {
            new_addresses: fresh,
        }
    }

    /// Alert on `entry` and run the keyword-gated purchase flow.
    ///
    /// Every failure is logged and swallowed.
    async fn process_new_address(&self, entry: &BondingAddress) {
        info!(
            address = %entry.address,
            first_token = %entry.first_token_id,
            second_token = %entry.second_token_id,
            "New bonding address detected"
        );

        if let Err(e) = self
            .parts
            .dispatcher
            .notify(&Alert::NewBondingAddress(entry.clone()))
            .await
        {
            warn!(address = %entry.address, error = %e, "New address alert not delivered");
        }

        if !self.parts.keyword.matches(&entry.first_token_id).await {
            return;
        }
        let keyword = self.parts.keyword.keyword().await;
        info!(
            address = %entry.address,
            token = %entry.first_token_id,
            keyword = %keyword,
            "Token matches keyword, waiting for initial swap"
        );

        let session = self
            .parts
            .swap_waiter
            .run(SwapWaitSession::new(
                entry.address.as_str(),
                entry.first_token_id.as_str(),
                self.parts.swap_wait_max_attempts,
            ))
            .await;

        let alert = match session.state() {
            SwapWaitState::Found => self.purchase(entry).await,
            _ => Alert::SwapWaitTimedOut {
                pair: entry.clone(),
                attempts: session.attempts,
            },
        };

        if let Err(e) = self.parts.dispatcher.notify(&alert).await {
            warn!(address = %entry.address, error = %e, "Purchase outcome alert not delivered");
        }
    }

    async fn purchase(&self, entry: &BondingAddress) -> Alert {
        match self
            .parts
            .purchaser
            .purchase(&entry.address, &entry.first_token_id)
            .await
        {
            Ok(explorer_url) => {
                info!(address = %entry.address, url = %explorer_url, "Purchase submitted");
                Alert::PurchaseSucceeded {
                    pair: entry.clone(),
                    explorer_url,
                }
            }
            Err(e) => {
                error!(address = %entry.address, error = %e, "Purchase failed");
                Alert::PurchaseFailed {
                    pair: entry.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// The `size` most recent entries of a registry listing, newest first.
pub fn latest_window(mut entries: Vec<BondingAddress>, size: usize) -> Vec<BondingAddress> {
    entries.reverse();
    entries.truncate(size);
    entries
}

/// Entries of `window` whose address is absent from `stored`, in window
/// order.
pub fn new_addresses(window: &[BondingAddress], stored: &[BondingAddress]) -> Vec<BondingAddress> {
    window
        .iter()
        .filter(|entry| !stored.iter().any(|known| known.same_address(entry)))
        .cloned()
        .collect()
}
