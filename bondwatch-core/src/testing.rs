//! In-memory collaborators for unit tests.

use crate::chain::{PurchaseError, PurchaseExecutor, RegistrySource, SwapProbe};
use crate::entities::BondingAddress;
use crate::transport::{BotIdentity, ChatTransport, TransportError};
use async_trait::async_trait;
use bondwatch_sdk::client::ClientError;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

pub fn entry(name: &str) -> BondingAddress {
    BondingAddress {
        first_token_id: format!("{name}-000000"),
        second_token_id: "ONE-f9954f".to_string(),
        address: format!("erd1{}", name.to_lowercase()),
    }
}

fn api_error(code: u16) -> ClientError {
    ClientError::Telegram {
        code,
        description: "fake failure".to_string(),
    }
}

#[derive(Default)]
struct FakeTransportState {
    sent: Vec<(i64, String)>,
    fail_sends: bool,
    send_failures: u32,
    send_delay: Option<Duration>,
    stop_delay: Option<Duration>,
    start_failures: u32,
    start_calls: u32,
    stop_calls: u32,
}

#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<FakeTransportState>,
}

impl FakeTransport {
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.state.lock().unwrap().fail_sends = fail;
    }

    /// Fail only the next `count` sends.
    pub fn fail_next_sends(&self, count: u32) {
        self.state.lock().unwrap().send_failures = count;
    }

    pub fn set_send_delay(&self, delay: Duration) {
        self.state.lock().unwrap().send_delay = Some(delay);
    }

    pub fn set_stop_delay(&self, delay: Duration) {
        self.state.lock().unwrap().stop_delay = Some(delay);
    }

    pub fn fail_next_starts(&self, count: u32) {
        self.state.lock().unwrap().start_failures = count;
    }

    pub fn start_calls(&self) -> u32 {
        self.state.lock().unwrap().start_calls
    }

    pub fn stop_calls(&self) -> u32 {
        self.state.lock().unwrap().stop_calls
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let (delay, fail) = {
            let mut state = self.state.lock().unwrap();
            let countdown = state.send_failures > 0;
            if countdown {
                state.send_failures -= 1;
            }
            (state.send_delay, state.fail_sends || countdown)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(api_error(502).into());
        }
        self.state
            .lock()
            .unwrap()
            .sent
            .push((chat_id, text.to_string()));
        Ok(())
    }

    async fn start_polling(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.start_calls += 1;
        if state.start_failures > 0 {
            state.start_failures -= 1;
            return Err(api_error(502).into());
        }
        Ok(())
    }

    async fn stop_polling(&self) -> Result<(), TransportError> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.stop_calls += 1;
            state.stop_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn get_me(&self) -> Result<BotIdentity, TransportError> {
        Ok(BotIdentity {
            id: 1,
            username: Some("watch_bot".to_string()),
        })
    }
}

/// Probe answering from a script; `None` entries fail, an empty script
/// answers zero.
#[derive(Default)]
pub struct FakeSwapProbe {
    script: Mutex<VecDeque<Option<u64>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeSwapProbe {
    pub fn scripted(script: impl IntoIterator<Item = Option<u64>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwapProbe for FakeSwapProbe {
    async fn initial_swap_count(&self, receiver: &str, token_id: &str) -> Result<u64, ClientError> {
        self.calls
            .lock()
            .unwrap()
            .push((receiver.to_string(), token_id.to_string()));
        match self.script.lock().unwrap().pop_front() {
            Some(Some(count)) => Ok(count),
            Some(None) => Err(api_error(504)),
            None => Ok(0),
        }
    }
}

/// Registry returning a settable list; optionally blocks until released.
#[derive(Default)]
pub struct FakeRegistry {
    entries: Mutex<Option<Vec<BondingAddress>>>,
    gate: Mutex<Option<std::sync::Arc<Notify>>>,
    calls: Mutex<u32>,
}

impl FakeRegistry {
    pub fn with_entries(entries: Vec<BondingAddress>) -> Self {
        let registry = Self::default();
        registry.set_entries(entries);
        registry
    }

    pub fn set_entries(&self, entries: Vec<BondingAddress>) {
        *self.entries.lock().unwrap() = Some(entries);
    }

    pub fn fail(&self) {
        *self.entries.lock().unwrap() = None;
    }

    /// Block every fetch until the returned notifier is signalled.
    pub fn gate(&self) -> std::sync::Arc<Notify> {
        let notify = std::sync::Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(std::sync::Arc::clone(&notify));
        notify
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl RegistrySource for FakeRegistry {
    async fn fetch_entries(&self) -> Result<Vec<BondingAddress>, ClientError> {
        *self.calls.lock().unwrap() += 1;
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.entries.lock().unwrap().clone().ok_or_else(|| api_error(503))
    }
}

/// Purchaser that succeeds unless told to fail, for every pair or for
/// selected ones.
#[derive(Default)]
pub struct FakePurchaser {
    fail_all: bool,
    failing_pairs: Vec<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakePurchaser {
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn failing_for(pair_address: &str) -> Self {
        Self {
            failing_pairs: vec![pair_address.to_string()],
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PurchaseExecutor for FakePurchaser {
    async fn purchase(
        &self,
        pair_address: &str,
        token_to_receive: &str,
    ) -> Result<String, PurchaseError> {
        self.calls
            .lock()
            .unwrap()
            .push((pair_address.to_string(), token_to_receive.to_string()));
        if self.fail_all || self.failing_pairs.iter().any(|pair| pair == pair_address) {
            return Err(PurchaseError::TokenNotHeld("ONE-f9954f".to_string()));
        }
        Ok(format!("https://explorer.multiversx.com/transactions/{pair_address}"))
    }
}
