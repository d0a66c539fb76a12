//! Test doubles for the binary's unit tests.

use async_trait::async_trait;
use bondwatch_core::transport::{BotIdentity, ChatTransport, TransportError};
use std::sync::Mutex;

/// Transport that records sends and always succeeds.
#[derive(Default)]
pub struct StubTransport {
    sent: Mutex<Vec<(i64, String)>>,
}

impl StubTransport {
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for StubTransport {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn start_polling(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn stop_polling(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn get_me(&self) -> Result<BotIdentity, TransportError> {
        Ok(BotIdentity {
            id: 1,
            username: Some("watch_bot".to_string()),
        })
    }
}
