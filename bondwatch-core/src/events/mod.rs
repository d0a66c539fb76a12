//! Event types and channels.
//!
//! # Event Flow
//!
//! 1. The chat transport's poller emits `TransportEvent`s on a broadcast
//!    channel.
//! 2. `ReconnectSupervisor` reacts to transport errors, `HealthController`
//!    to successful receipts, the command handler to incoming messages.
//! 3. `NewAddressDetector` produces `Alert`s which the
//!    `NotificationDispatcher` delivers through the guarded channel.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, TransportEventReceiver, TransportEventSender, transport_event_channel,
};

pub use types::{Alert, IncomingMessage, TransportEvent};
