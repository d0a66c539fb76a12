//! Chat transport: the bidirectional channel to the operator.
//!
//! [`ChatTransport`] is the seam used by the dispatcher, the reconnection
//! supervisor and the shutdown path. [`TelegramTransport`] implements it on
//! top of the Bot API with a long-polling task that publishes
//! [`TransportEvent`]s on a broadcast channel.

use crate::events::{IncomingMessage, TransportEvent, TransportEventSender};
use async_trait::async_trait;
use bondwatch_sdk::client::{ClientError, TelegramClient};
use bondwatch_sdk::objects::telegram::Update;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Errors surfaced by a chat transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("chat api error: {0}")]
    Client(#[from] ClientError),

    #[error("poller task failed: {0}")]
    Poller(String),
}

/// Identity reported by the `getMe` probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: i64,
    pub username: Option<String>,
}

/// Outbound sends plus control of the inbound poller.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    /// Start receiving updates. Returns once the transport has confirmed it
    /// can reach the chat service.
    async fn start_polling(&self) -> Result<(), TransportError>;

    /// Stop receiving updates. Calling it while stopped is a no-op.
    async fn stop_polling(&self) -> Result<(), TransportError>;

    async fn get_me(&self) -> Result<BotIdentity, TransportError>;
}

struct PollerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

struct TelegramTransportInner {
    client: TelegramClient,
    events: TransportEventSender,
    poll_timeout_secs: u64,
    error_backoff: Duration,
    /// Next `getUpdates` offset, 0 until the first update is seen.
    offset: AtomicI64,
    poller: Mutex<Option<PollerHandle>>,
}

/// Telegram Bot API transport with a restartable long-polling task.
pub struct TelegramTransport {
    inner: Arc<TelegramTransportInner>,
}

impl Clone for TelegramTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl TelegramTransport {
    pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(5);

    pub fn new(client: TelegramClient, events: TransportEventSender) -> Self {
        Self::with_timings(
            client,
            events,
            Self::DEFAULT_POLL_TIMEOUT_SECS,
            Self::DEFAULT_ERROR_BACKOFF,
        )
    }

    pub fn with_timings(
        client: TelegramClient,
        events: TransportEventSender,
        poll_timeout_secs: u64,
        error_backoff: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(TelegramTransportInner {
                client,
                events,
                poll_timeout_secs,
                error_backoff,
                offset: AtomicI64::new(0),
                poller: Mutex::new(None),
            }),
        }
    }

    pub fn is_polling(&self) -> bool {
        self.inner
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.task.is_finished())
    }

    fn spawn_poller(&self) {
        let mut slot = self
            .inner
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|handle| !handle.task.is_finished()) {
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(poll_loop(inner, stop_rx));
        *slot = Some(PollerHandle { stop_tx, task });
    }
}

async fn poll_loop(inner: Arc<TelegramTransportInner>, mut stop_rx: watch::Receiver<bool>) {
    info!("Telegram poller started");

    loop {
        let offset = match inner.offset.load(Ordering::Acquire) {
            0 => None,
            offset => Some(offset),
        };

        let result = tokio::select! {
            biased;

            _ = stop_rx.changed() => break,

            result = inner.client.get_updates(offset, inner.poll_timeout_secs) => result,
        };

        match result {
            Ok(updates) => {
                let _ = inner.events.send(TransportEvent::Polled);
                for update in updates {
                    handle_update(&inner, update);
                }
            }
            Err(e) => {
                let event = if e.is_fatal() {
                    warn!(error = %e, "Telegram polling hit a fatal error");
                    TransportEvent::Error(e.to_string())
                } else {
                    debug!(error = %e, "Telegram poll failed");
                    TransportEvent::PollingError(e.to_string())
                };
                let _ = inner.events.send(event);

                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = tokio::time::sleep(inner.error_backoff) => {}
                }
            }
        }
    }

    info!("Telegram poller stopped");
}

fn handle_update(inner: &TelegramTransportInner, update: Update) {
    inner
        .offset
        .fetch_max(update.update_id.saturating_add(1), Ordering::AcqRel);

    let Some(message) = update.message else {
        return;
    };
    let Some(text) = message.text else {
        return;
    };
    let event = TransportEvent::Message(IncomingMessage {
        chat_id: message.chat.id,
        text,
        from_username: message.from.and_then(|user| user.username),
    });
    let _ = inner.events.send(event);
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.inner.client.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn start_polling(&self) -> Result<(), TransportError> {
        self.spawn_poller();
        self.get_me().await.map(|_| ())
    }

    async fn stop_polling(&self) -> Result<(), TransportError> {
        let handle = self
            .inner
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(PollerHandle { stop_tx, task }) = handle else {
            return Ok(());
        };

        let _ = stop_tx.send(true);
        task.await
            .map_err(|e| TransportError::Poller(e.to_string()))
    }

    async fn get_me(&self) -> Result<BotIdentity, TransportError> {
        let user = self.inner.client.get_me().await?;
        Ok(BotIdentity {
            id: user.id,
            username: user.username,
        })
    }
}
