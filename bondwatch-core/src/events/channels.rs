//! Event channel factories and handles.

use super::types::TransportEvent;
use tokio::sync::broadcast;

/// Default buffer size for event channels.
///
/// Receivers that fall further behind than this observe `Lagged` and skip
/// ahead.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for TransportEvent events.
pub type TransportEventSender = broadcast::Sender<TransportEvent>;
/// Receiver handle for TransportEvent events.
pub type TransportEventReceiver = broadcast::Receiver<TransportEvent>;

/// Create a new TransportEvent channel.
///
/// Every consumer calls `subscribe()` on the returned sender to obtain its
/// own receiver; the initial receiver can be dropped.
pub fn transport_event_channel() -> (TransportEventSender, TransportEventReceiver) {
    broadcast::channel(DEFAULT_CHANNEL_BUFFER)
}
