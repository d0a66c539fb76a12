//! Process health and graceful shutdown.
//!
//! [`HealthController`] owns the single [`TransportHealth`] record, the
//! shutdown flag and the shared [`CircuitBreaker`]. The reconnection
//! supervisor mutates the health record through it; the liveness timestamp
//! is only ever advanced by successful receipts from the transport.

use super::circuit_breaker::CircuitBreaker;
use crate::events::TransportEventReceiver;
use crate::transport::ChatTransport;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Upper bound on how long stopping the transport may take during shutdown.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport bookkeeping shared by the supervisor and the health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportHealth {
    pub reconnect_attempts: u32,
    pub active_connections: u32,
    pub last_successful_poll: Instant,
}

/// Serializable view of the process health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub shutting_down: bool,
    pub breaker_open: bool,
    pub failure_count: u32,
    pub seconds_since_last_receipt: u64,
    pub reconnect_attempts: u32,
    pub active_connections: u32,
}

struct HealthControllerInner {
    breaker: CircuitBreaker,
    transport: Arc<dyn ChatTransport>,
    health: Mutex<TransportHealth>,
    shutdown_tx: watch::Sender<bool>,
    max_reconnect_attempts: u32,
    shutdown_timeout: Duration,
}

/// Readiness flag and bounded shutdown sequence for the chat transport.
pub struct HealthController {
    inner: Arc<HealthControllerInner>,
}

impl Clone for HealthController {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl HealthController {
    /// Create a controller.
    ///
    /// The liveness window starts counting at construction, giving the
    /// transport one breaker cooldown to report its first receipt.
    ///
    /// # Arguments
    ///
    /// * `breaker` - The breaker shared with the notification dispatcher
    /// * `transport` - The transport stopped on shutdown
    /// * `max_reconnect_attempts` - Cap after which the process is degraded
    pub fn new(
        breaker: CircuitBreaker,
        transport: Arc<dyn ChatTransport>,
        max_reconnect_attempts: u32,
    ) -> Self {
        Self::with_shutdown_timeout(breaker, transport, max_reconnect_attempts, SHUTDOWN_TIMEOUT)
    }

    pub fn with_shutdown_timeout(
        breaker: CircuitBreaker,
        transport: Arc<dyn ChatTransport>,
        max_reconnect_attempts: u32,
        shutdown_timeout: Duration,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(HealthControllerInner {
                breaker,
                transport,
                health: Mutex::new(TransportHealth {
                    reconnect_attempts: 0,
                    active_connections: 0,
                    last_successful_poll: Instant::now(),
                }),
                shutdown_tx,
                max_reconnect_attempts,
                shutdown_timeout,
            }),
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.inner.breaker
    }

    pub fn transport(&self) -> &Arc<dyn ChatTransport> {
        &self.inner.transport
    }

    pub fn max_reconnect_attempts(&self) -> u32 {
        self.inner.max_reconnect_attempts
    }

    pub fn transport_health(&self) -> TransportHealth {
        *self.lock_health()
    }

    /// Healthy means: breaker closed, a receipt within the breaker's reset
    /// window, and reconnection not exhausted.
    pub fn is_healthy(&self) -> bool {
        let breaker_open = self.inner.breaker.check_state();
        let health = self.transport_health();
        !breaker_open && self.is_live(&health) && !self.is_exhausted(&health)
    }

    pub fn status(&self) -> HealthStatus {
        let breaker_open = self.inner.breaker.check_state();
        let breaker = self.inner.breaker.state();
        let health = self.transport_health();
        HealthStatus {
            healthy: !breaker_open && self.is_live(&health) && !self.is_exhausted(&health),
            shutting_down: self.is_shutting_down(),
            breaker_open,
            failure_count: breaker.failure_count,
            seconds_since_last_receipt: health.last_successful_poll.elapsed().as_secs(),
            reconnect_attempts: health.reconnect_attempts,
            active_connections: health.active_connections,
        }
    }

    /// Advance the liveness timestamp.
    pub fn record_receipt(&self) {
        self.lock_health().last_successful_poll = Instant::now();
    }

    /// Record that the transport was started successfully.
    pub fn mark_connected(&self) {
        self.lock_health().active_connections = 1;
    }

    /// Claim one reconnect attempt.
    ///
    /// Returns the attempt number, or `None` once the cap is reached.
    pub fn begin_reconnect_attempt(&self) -> Option<u32> {
        let mut health = self.lock_health();
        if health.reconnect_attempts >= self.inner.max_reconnect_attempts {
            return None;
        }
        health.reconnect_attempts += 1;
        Some(health.reconnect_attempts)
    }

    /// A stop/start cycle succeeded: clear the attempt counter and the
    /// breaker.
    pub fn reconnect_succeeded(&self) {
        {
            let mut health = self.lock_health();
            health.reconnect_attempts = 0;
            health.active_connections = 1;
        }
        self.inner.breaker.reset();
    }

    /// A stop/start cycle failed; the attempt stays counted.
    pub fn reconnect_failed(&self) {
        self.lock_health().active_connections = 0;
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.inner.shutdown_tx.borrow()
    }

    /// A receiver that flips to `true` when shutdown begins.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.inner.shutdown_tx.subscribe()
    }

    /// Stop the process cleanly.
    ///
    /// The shutdown flag is raised before anything else so concurrent sends
    /// observe it. Stopping the transport is bounded by the shutdown
    /// timeout. Calls after the first are no-ops.
    pub async fn graceful_shutdown(&self) {
        if self.inner.shutdown_tx.send_replace(true) {
            debug!("Shutdown already in progress");
            return;
        }
        info!("Graceful shutdown started");

        match tokio::time::timeout(
            self.inner.shutdown_timeout,
            self.inner.transport.stop_polling(),
        )
        .await
        {
            Ok(Ok(())) => info!("Chat transport stopped"),
            Ok(Err(e)) => error!(error = %e, "Failed to stop chat transport"),
            Err(_) => error!(
                timeout_secs = self.inner.shutdown_timeout.as_secs(),
                "Timed out stopping chat transport"
            ),
        }

        self.lock_health().active_connections = 0;
        self.inner.breaker.clear_listeners();
        info!("Graceful shutdown complete");
    }

    /// Consume transport events and advance the liveness timestamp on every
    /// successful receipt, until shutdown or until the channel closes.
    pub async fn track_liveness(self, mut events: TransportEventReceiver) {
        let mut shutdown_rx = self.shutdown_receiver();
        if *shutdown_rx.borrow() {
            return;
        }

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    debug!("Liveness tracker received shutdown signal");
                    break;
                }

                event = events.recv() => match event {
                    Ok(event) if event.is_receipt() => self.record_receipt(),
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Liveness tracker lagged behind transport events");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    }

    fn is_live(&self, health: &TransportHealth) -> bool {
        health.last_successful_poll.elapsed() <= self.inner.breaker.reset_time()
    }

    fn is_exhausted(&self, health: &TransportHealth) -> bool {
        health.reconnect_attempts >= self.inner.max_reconnect_attempts
    }

    fn lock_health(&self) -> MutexGuard<'_, TransportHealth> {
        self.inner
            .health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
