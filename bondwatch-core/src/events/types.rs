//! Event type definitions.

use crate::entities::BondingAddress;

/// A text message received by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub text: String,
    pub from_username: Option<String>,
}

/// Signals emitted by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A poll round-trip completed successfully (possibly with no updates).
    Polled,
    /// An incoming text message.
    Message(IncomingMessage),
    /// A poll request failed; the poller keeps going.
    PollingError(String),
    /// The transport hit an error it cannot recover from on its own.
    Error(String),
}

impl TransportEvent {
    /// Successful receipt: proves the transport is alive.
    pub fn is_receipt(&self) -> bool {
        matches!(self, TransportEvent::Polled | TransportEvent::Message(_))
    }

    /// The reason of a transport-level failure, which should trigger
    /// reconnection. `None` for receipts.
    pub fn transport_error(&self) -> Option<&str> {
        match self {
            TransportEvent::PollingError(reason) | TransportEvent::Error(reason) => Some(reason),
            TransportEvent::Polled | TransportEvent::Message(_) => None,
        }
    }
}

/// Operator-facing notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// A bonding address not present in the last snapshot.
    NewBondingAddress(BondingAddress),
    /// The automatic purchase was submitted.
    PurchaseSucceeded {
        pair: BondingAddress,
        explorer_url: String,
    },
    /// The automatic purchase failed.
    PurchaseFailed {
        pair: BondingAddress,
        reason: String,
    },
    /// No initial swap appeared within the observation window.
    SwapWaitTimedOut {
        pair: BondingAddress,
        attempts: u32,
    },
}

impl Alert {
    /// Render the fixed message template for this alert.
    pub fn render(&self) -> String {
        match self {
            Alert::NewBondingAddress(entry) => format!(
                "🔔 New bonding address detected!\n\n\
                 First Token: {}\n\
                 Second Token: {}\n\
                 Address: {}",
                entry.first_token_id, entry.second_token_id, entry.address
            ),
            Alert::PurchaseSucceeded { pair, explorer_url } => format!(
                "✅ Bought {}\n\n\
                 Pair: {}\n\
                 Transaction: {}",
                pair.first_token_id, pair.address, explorer_url
            ),
            Alert::PurchaseFailed { pair, reason } => format!(
                "❌ Failed to buy {}\n\n\
                 Pair: {}\n\
                 Error: {}",
                pair.first_token_id, pair.address, reason
            ),
            Alert::SwapWaitTimedOut { pair, attempts } => format!(
                "⌛ No initial swap for {} after {} checks, purchase skipped\n\n\
                 Pair: {}",
                pair.first_token_id, attempts, pair.address
            ),
        }
    }
}
