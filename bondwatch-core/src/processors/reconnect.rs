//! ReconnectSupervisor processor.
//!
//! The ReconnectSupervisor is responsible for:
//! - Receiving transport-level error events (`PollingError`, `Error`)
//! - Restarting the transport (stop, then start) after a fixed delay
//! - Capping restarts at `MAX_RECONNECT_ATTEMPTS` until the next success
//! - Resetting the attempt counter and the circuit breaker on success
//!
//! Per-message send failures never reach this processor; they are the
//! breaker's business.

use crate::events::{TransportEvent, TransportEventReceiver};
use crate::reliability::HealthController;
use kanau::processor::Processor;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Restart attempts allowed before the process is left degraded.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Fixed delay before each restart.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// What the supervisor did about one transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectOutcome {
    Reconnected { attempt: u32 },
    Failed { attempt: u32 },
    /// The attempt cap is reached; nothing is tried until a restart.
    CapReached,
    ShuttingDown,
}

/// Restarts the chat transport on transport errors.
pub struct ReconnectSupervisor {
    health: HealthController,
    delay: Duration,
}

impl ReconnectSupervisor {
    pub fn new(health: HealthController) -> Self {
        Self::with_delay(health, RECONNECT_DELAY)
    }

    pub fn with_delay(health: HealthController, delay: Duration) -> Self {
        Self { health, delay }
    }

    /// Consume transport events until shutdown or until the channel closes.
    pub async fn run(self, mut events: TransportEventReceiver) {
        let mut shutdown_rx: watch::Receiver<bool> = self.health.shutdown_receiver();
        if *shutdown_rx.borrow_and_update() {
            return;
        }
        info!("ReconnectSupervisor started");

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("ReconnectSupervisor received shutdown signal");
                        break;
                    }
                }

                event = events.recv() => match event {
                    Ok(event) => {
                        let Ok(outcome) = self.process(event).await;
                        if matches!(outcome, Some(ReconnectOutcome::Reconnected { .. })) {
                            drain_stale(&mut events);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "ReconnectSupervisor lagged behind transport events");
                    }
                    Err(RecvError::Closed) => {
                        info!("Transport event channel closed");
                        break;
                    }
                },
            }
        }

        info!("ReconnectSupervisor shutdown complete");
    }

    /// React to one transport error.
    pub async fn handle_transport_error(&self, reason: &str) -> ReconnectOutcome {
        if self.health.is_shutting_down() {
            return ReconnectOutcome::ShuttingDown;
        }

        let Some(attempt) = self.health.begin_reconnect_attempt() else {
            warn!(
                max_attempts = self.health.max_reconnect_attempts(),
                reason, "Reconnect attempts exhausted, manual restart required"
            );
            return ReconnectOutcome::CapReached;
        };

        warn!(
            attempt,
            max_attempts = self.health.max_reconnect_attempts(),
            delay_secs = self.delay.as_secs(),
            reason,
            "Transport error, reconnecting"
        );
        tokio::time::sleep(self.delay).await;

        if self.health.is_shutting_down() {
            return ReconnectOutcome::ShuttingDown;
        }

        let transport = self.health.transport();
        if let Err(e) = transport.stop_polling().await {
            debug!(error = %e, "Stopping transport before reconnect failed");
        }
        match transport.start_polling().await {
            Ok(()) => {
                info!(attempt, "Transport reconnected");
                self.health.reconnect_succeeded();
                ReconnectOutcome::Reconnected { attempt }
            }
            Err(e) => {
                error!(attempt, error = %e, "Reconnect attempt failed");
                self.health.reconnect_failed();
                ReconnectOutcome::Failed { attempt }
            }
        }
    }
}

impl Processor<TransportEvent> for ReconnectSupervisor {
    type Output = Option<ReconnectOutcome>;
    type Error = Infallible;

    async fn process(&self, event: TransportEvent) -> Result<Option<ReconnectOutcome>, Infallible> {
        let Some(reason) = event.transport_error() else {
            return Ok(None);
        };
        Ok(Some(self.handle_transport_error(reason).await))
    }
}

/// Drop events queued while the old poller was still running.
fn drain_stale(events: &mut TransportEventReceiver) {
    loop {
        match events.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::transport_event_channel;
    use crate::reliability::{CircuitBreaker, MAX_FAILURES};
    use crate::testing::FakeTransport;
    use crate::transport::ChatTransport;
    use std::sync::Arc;
    use tokio::time::Instant;

    fn setup() -> (Arc<FakeTransport>, HealthController, ReconnectSupervisor) {
        let transport = Arc::new(FakeTransport::default());
        let health = HealthController::new(
            CircuitBreaker::new(),
            Arc::clone(&transport) as Arc<dyn ChatTransport>,
            MAX_RECONNECT_ATTEMPTS,
        );
        let supervisor = ReconnectSupervisor::new(health.clone());
        (transport, health, supervisor)
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_after_fixed_delay() {
        let (transport, health, supervisor) = setup();
        for _ in 0..MAX_FAILURES {
            health.breaker().record_failure();
        }

        let started = Instant::now();
        let outcome = supervisor.handle_transport_error("socket hang up").await;

        assert_eq!(outcome, ReconnectOutcome::Reconnected { attempt: 1 });
        assert_eq!(started.elapsed(), RECONNECT_DELAY);
        assert_eq!(transport.stop_calls(), 1);
        assert_eq!(transport.start_calls(), 1);
        assert_eq!(health.transport_health().reconnect_attempts, 0);
        assert!(!health.breaker().check_state());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_attempts_stop_at_cap() {
        let (transport, health, supervisor) = setup();
        transport.fail_next_starts(u32::MAX);

        for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
            assert_eq!(
                supervisor.handle_transport_error("timeout").await,
                ReconnectOutcome::Failed { attempt }
            );
        }
        assert_eq!(
            supervisor.handle_transport_error("timeout").await,
            ReconnectOutcome::CapReached
        );
        assert_eq!(transport.start_calls(), MAX_RECONNECT_ATTEMPTS);
        assert!(!health.is_healthy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_attempt_counter() {
        let (transport, health, supervisor) = setup();
        transport.fail_next_starts(2);

        supervisor.handle_transport_error("e").await;
        supervisor.handle_transport_error("e").await;
        assert_eq!(health.transport_health().reconnect_attempts, 2);

        assert_eq!(
            supervisor.handle_transport_error("e").await,
            ReconnectOutcome::Reconnected { attempt: 3 }
        );
        assert_eq!(health.transport_health().reconnect_attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_reconnect_during_shutdown() {
        let (transport, health, supervisor) = setup();
        health.graceful_shutdown().await;

        assert_eq!(
            supervisor.handle_transport_error("e").await,
            ReconnectOutcome::ShuttingDown
        );
        assert_eq!(transport.start_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_transport_errors_trigger() {
        let (transport, _health, supervisor) = setup();
        assert_eq!(supervisor.process(TransportEvent::Polled).await.unwrap(), None);
        assert_eq!(
            supervisor
                .process(TransportEvent::Error("Conflict".into()))
                .await
                .unwrap(),
            Some(ReconnectOutcome::Reconnected { attempt: 1 })
        );
        assert_eq!(transport.start_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_until_shutdown() {
        let (transport, health, supervisor) = setup();
        let (events, _) = transport_event_channel();
        let task = tokio::spawn(supervisor.run(events.subscribe()));

        events.send(TransportEvent::PollingError("reset".into())).unwrap();
        tokio::time::sleep(RECONNECT_DELAY + Duration::from_secs(1)).await;
        assert_eq!(transport.start_calls(), 1);

        health.graceful_shutdown().await;
        task.await.unwrap();
    }
}
