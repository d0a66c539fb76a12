//! Swap-wait state machine.
//!
//! Before buying into a new pair the watcher waits for its first trade. The
//! wait polls the transaction-count probe at a fixed interval until either a
//! qualifying transaction shows up (`Found`) or the attempt budget runs out
//! (`Exhausted`). A failed probe counts as an attempt with no result; it
//! never ends the wait early.

use crate::chain::SwapProbe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default attempt budget (30 minutes at the default interval).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Delay between two probe attempts.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapWaitState {
    Polling,
    Found,
    Exhausted,
}

/// One wait for the initial swap of a pair. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapWaitSession {
    pub receiver_address: String,
    pub token_id: String,
    pub attempts: u32,
    pub max_attempts: u32,
    state: SwapWaitState,
}

impl SwapWaitSession {
    pub fn new(
        receiver_address: impl Into<String>,
        token_id: impl Into<String>,
        max_attempts: u32,
    ) -> Self {
        let state = if max_attempts == 0 {
            SwapWaitState::Exhausted
        } else {
            SwapWaitState::Polling
        };
        Self {
            receiver_address: receiver_address.into(),
            token_id: token_id.into(),
            attempts: 0,
            max_attempts,
            state,
        }
    }

    pub fn state(&self) -> SwapWaitState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state != SwapWaitState::Polling
    }

    /// Apply the outcome of one probe attempt; `None` is a failed probe.
    pub fn record_attempt(&mut self, count: Option<u64>) -> SwapWaitState {
        if self.is_terminal() {
            return self.state;
        }
        self.attempts += 1;
        self.state = match count {
            Some(count) if count > 0 => SwapWaitState::Found,
            _ if self.attempts >= self.max_attempts => SwapWaitState::Exhausted,
            _ => SwapWaitState::Polling,
        };
        self.state
    }
}

/// Runs swap-wait sessions against a probe.
#[derive(Clone)]
pub struct SwapWaiter {
    probe: Arc<dyn SwapProbe>,
    interval: Duration,
}

impl SwapWaiter {
    pub fn new(probe: Arc<dyn SwapProbe>) -> Self {
        Self::with_interval(probe, POLL_INTERVAL)
    }

    pub fn with_interval(probe: Arc<dyn SwapProbe>, interval: Duration) -> Self {
        Self { probe, interval }
    }

    /// Wait for the first successful initial swap to `receiver` carrying
    /// `token_id`. Returns `true` once one is seen, `false` after
    /// `max_attempts` attempts without one.
    pub async fn wait_for_event(&self, receiver: &str, token_id: &str, max_attempts: u32) -> bool {
        self.run(SwapWaitSession::new(receiver, token_id, max_attempts))
            .await
            .state()
            == SwapWaitState::Found
    }

    /// Drive `session` to a terminal state and return it.
    pub async fn run(&self, mut session: SwapWaitSession) -> SwapWaitSession {
        while !session.is_terminal() {
            let count = match self
                .probe
                .initial_swap_count(&session.receiver_address, &session.token_id)
                .await
            {
                Ok(count) => Some(count),
                Err(e) => {
                    warn!(
                        receiver = %session.receiver_address,
                        token = %session.token_id,
                        attempt = session.attempts + 1,
                        error = %e,
                        "Swap probe failed"
                    );
                    None
                }
            };

            match session.record_attempt(count) {
                SwapWaitState::Found => info!(
                    receiver = %session.receiver_address,
                    token = %session.token_id,
                    attempts = session.attempts,
                    "Initial swap detected"
                ),
                SwapWaitState::Exhausted => warn!(
                    receiver = %session.receiver_address,
                    token = %session.token_id,
                    attempts = session.attempts,
                    "No initial swap within attempt budget"
                ),
                SwapWaitState::Polling => {
                    debug!(
                        receiver = %session.receiver_address,
                        attempt = session.attempts,
                        max_attempts = session.max_attempts,
                        "Initial swap not seen yet"
                    );
                    tokio::time::sleep(self.interval).await;
                }
            }
        }
        session
    }
}
