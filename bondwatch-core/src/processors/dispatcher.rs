//! NotificationDispatcher processor.
//!
//! The NotificationDispatcher is responsible for:
//! - Skipping sends while the process shuts down or the breaker is open
//! - Rendering an `Alert` with its fixed template
//! - Sending it to the operator chat within `SEND_TIMEOUT`
//! - Feeding the send outcome back into the circuit breaker

use crate::events::Alert;
use crate::reliability::HealthController;
use crate::transport::{ChatTransport, TransportError};
use kanau::processor::Processor;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound on one outbound send.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised by a send attempt that was not suppressed.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    #[error("send failed: {0}")]
    Transport(#[from] TransportError),
}

/// What happened to an alert that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    SuppressedShutdown,
    SuppressedBreakerOpen,
}

/// Sends alerts to the operator chat through the guarded channel.
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn ChatTransport>,
    health: HealthController,
    chat_id: i64,
    send_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(health: HealthController, chat_id: i64) -> Self {
        Self::with_timeout(health, chat_id, SEND_TIMEOUT)
    }

    pub fn with_timeout(health: HealthController, chat_id: i64, send_timeout: Duration) -> Self {
        Self {
            transport: Arc::clone(health.transport()),
            health,
            chat_id,
            send_timeout,
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    /// Deliver `alert`.
    ///
    /// Suppression (shutdown, open breaker) is not an error. A timeout or a
    /// transport failure is recorded on the breaker and returned.
    pub async fn notify(&self, alert: &Alert) -> Result<Delivery, NotifyError> {
        if self.health.is_shutting_down() {
            debug!("Shutting down, alert suppressed");
            return Ok(Delivery::SuppressedShutdown);
        }

        let breaker = self.health.breaker();
        if breaker.check_state() {
            debug!("Circuit breaker open, alert suppressed");
            return Ok(Delivery::SuppressedBreakerOpen);
        }

        let text = alert.render();
        let result = match tokio::time::timeout(
            self.send_timeout,
            self.transport.send_message(self.chat_id, &text),
        )
        .await
        {
            Ok(Ok(())) => Ok(Delivery::Sent),
            Ok(Err(e)) => Err(NotifyError::Transport(e)),
            Err(_) => Err(NotifyError::Timeout(self.send_timeout)),
        };

        match &result {
            Ok(_) => breaker.reset(),
            Err(e) => {
                warn!(chat_id = self.chat_id, error = %e, "Failed to send alert");
                breaker.record_failure();
            }
        }
        result
    }
}

impl Processor<Alert> for NotificationDispatcher {
    type Output = Delivery;
    type Error = NotifyError;

    async fn process(&self, alert: Alert) -> Result<Delivery, NotifyError> {
        self.notify(&alert).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reliability::{CircuitBreaker, MAX_FAILURES};
    use crate::testing::{FakeTransport, entry};

    fn setup() -> (Arc<FakeTransport>, HealthController, NotificationDispatcher) {
        let transport = Arc::new(FakeTransport::default());
        let health = HealthController::new(
            CircuitBreaker::new(),
            Arc::clone(&transport) as Arc<dyn ChatTransport>,
            5,
        );
        let dispatcher = NotificationDispatcher::new(health.clone(), 42);
        (transport, health, dispatcher)
    }

    fn alert() -> Alert {
        Alert::NewBondingAddress(entry("E"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sends_rendered_alert() {
        let (transport, _health, dispatcher) = setup();
        let delivery = dispatcher.process(alert()).await.unwrap();
        assert_eq!(delivery, Delivery::Sent);
        assert_eq!(transport.sent(), vec![(42, alert().render())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_open_breaker_then_suppress() {
        let (transport, health, dispatcher) = setup();
        transport.fail_sends(true);

        for _ in 0..MAX_FAILURES {
            assert!(matches!(
                dispatcher.notify(&alert()).await,
                Err(NotifyError::Transport(_))
            ));
        }
        assert!(health.breaker().check_state());

        transport.fail_sends(false);
        assert_eq!(
            dispatcher.notify(&alert()).await.unwrap(),
            Delivery::SuppressedBreakerOpen
        );
        assert!(transport.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let (transport, health, dispatcher) = setup();
        transport.set_send_delay(SEND_TIMEOUT + Duration::from_secs(1));

        let err = dispatcher.notify(&alert()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Timeout(t) if t == SEND_TIMEOUT));
        assert_eq!(health.breaker().state().failure_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_clears_failure_count() {
        let (transport, health, dispatcher) = setup();
        transport.fail_sends(true);
        let _ = dispatcher.notify(&alert()).await;
        let _ = dispatcher.notify(&alert()).await;
        assert_eq!(health.breaker().state().failure_count, 2);

        transport.fail_sends(false);
        dispatcher.notify(&alert()).await.unwrap();
        assert_eq!(health.breaker().state().failure_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_takes_precedence() {
        let (transport, health, dispatcher) = setup();
        for _ in 0..MAX_FAILURES {
            health.breaker().record_failure();
        }
        health.graceful_shutdown().await;

        assert_eq!(
            dispatcher.notify(&alert()).await.unwrap(),
            Delivery::SuppressedShutdown
        );
        assert!(transport.sent().is_empty());
        // Suppression is not a failure.
        assert_eq!(health.breaker().state().failure_count, MAX_FAILURES);
    }
}
