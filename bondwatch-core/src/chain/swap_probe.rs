//! Existence probe for the first trade on a freshly created pair.

use async_trait::async_trait;
use bondwatch_sdk::client::{ClientError, MultiversxClient};

/// Contract endpoint whose first successful call marks a pair as tradable.
pub const INITIAL_SWAP_FUNCTION: &str = "initialSwap";

#[async_trait]
pub trait SwapProbe: Send + Sync {
    /// Number of successful initial swaps sent to `receiver` carrying
    /// `token_id`.
    async fn initial_swap_count(&self, receiver: &str, token_id: &str) -> Result<u64, ClientError>;
}

#[derive(Debug, Clone)]
pub struct MultiversxSwapProbe {
    client: MultiversxClient,
}

impl MultiversxSwapProbe {
    pub fn new(client: MultiversxClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SwapProbe for MultiversxSwapProbe {
    async fn initial_swap_count(&self, receiver: &str, token_id: &str) -> Result<u64, ClientError> {
        self.client
            .transaction_count(receiver, token_id, INITIAL_SWAP_FUNCTION)
            .await
    }
}
