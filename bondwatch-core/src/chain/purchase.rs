//! Automatic purchase of a newly listed token.
//!
//! The purchase spends 98% of the wallet's balance of the configured default
//! token through the pair's `swap` endpoint, asking for at least one base
//! unit of the token to receive. The wallet is read from its PEM file on
//! every purchase, so a missing or broken file fails that purchase only.

use async_trait::async_trait;
use bondwatch_sdk::client::{ClientError, MultiversxClient};
use bondwatch_sdk::codec::{encode_biguint_hex, encode_str_hex, esdt_transfer_data};
use bondwatch_sdk::objects::transaction::{TRANSACTION_VERSION, Transaction};
use bondwatch_sdk::wallet::{PemWallet, WalletError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Pair endpoint called with the spent tokens.
const SWAP_FUNCTION: &str = "swap";

/// Minimum amount of the received token accepted by the swap.
const MIN_AMOUNT_TO_RECEIVE: u128 = 1;

/// Share of the balance spent, in percent.
const SPEND_PERCENT: u128 = 98;

/// Errors that abort a purchase.
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("chain api error: {0}")]
    Client(#[from] ClientError),

    #[error("Token {0} not found in wallet")]
    TokenNotHeld(String),

    #[error("invalid balance {balance:?} for token {token}")]
    InvalidBalance { token: String, balance: String },

    #[error("Invalid amount calculated")]
    InvalidAmount,

    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),
}

/// Executes the buy for a newly detected pair.
#[async_trait]
pub trait PurchaseExecutor: Send + Sync {
    /// Buy `token_to_receive` on the pair at `pair_address`.
    ///
    /// Returns the explorer URL of the submitted transaction.
    async fn purchase(
        &self,
        pair_address: &str,
        token_to_receive: &str,
    ) -> Result<String, PurchaseError>;
}

/// Transaction parameters for purchases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseSettings {
    pub default_token: String,
    pub chain_id: String,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub explorer_url: String,
}

/// Signs with a PEM wallet and submits through the MultiversX API.
pub struct MultiversxPurchaser {
    client: MultiversxClient,
    pem_file: PathBuf,
    settings: PurchaseSettings,
}

impl MultiversxPurchaser {
    pub fn new(
        client: MultiversxClient,
        pem_file: impl Into<PathBuf>,
        settings: PurchaseSettings,
    ) -> Self {
        Self {
            client,
            pem_file: pem_file.into(),
            settings,
        }
    }

    pub fn pem_file(&self) -> &Path {
        &self.pem_file
    }

    async fn load_wallet(&self) -> Result<PemWallet, PurchaseError> {
        let pem = tokio::fs::read_to_string(&self.pem_file)
            .await
            .map_err(WalletError::Io)?;
        Ok(PemWallet::from_pem_str(&pem)?)
    }

    async fn spendable_amount(&self, wallet: &PemWallet) -> Result<u128, PurchaseError> {
        let tokens = self.client.account_tokens(wallet.address()).await?;
        let token = &self.settings.default_token;
        let held = tokens
            .into_iter()
            .find(|balance| &balance.identifier == token)
            .ok_or_else(|| PurchaseError::TokenNotHeld(token.clone()))?;
        let balance: u128 = held
            .balance
            .parse()
            .map_err(|_| PurchaseError::InvalidBalance {
                token: token.clone(),
                balance: held.balance.clone(),
            })?;

        match spend_amount(balance) {
            0 => Err(PurchaseError::InvalidAmount),
            amount => Ok(amount),
        }
    }

    fn explorer_link(&self, tx_hash: &str) -> String {
        format!(
            "{}/transactions/{tx_hash}",
            self.settings.explorer_url.trim_end_matches('/')
        )
    }
}

/// 98% of `balance`, truncated to whole base units.
pub fn spend_amount(balance: u128) -> u128 {
    balance / 100 * SPEND_PERCENT + balance % 100 * SPEND_PERCENT / 100
}

/// Call data for swapping `amount` of `token_to_send` into `token_to_receive`.
pub fn swap_call_data(token_to_send: &str, amount: u128, token_to_receive: &str) -> String {
    esdt_transfer_data(
        token_to_send,
        amount,
        SWAP_FUNCTION,
        &[
            encode_str_hex(token_to_receive),
            encode_biguint_hex(MIN_AMOUNT_TO_RECEIVE),
        ],
    )
}

#[async_trait]
impl PurchaseExecutor for MultiversxPurchaser {
    #[tracing::instrument(skip(self), err)]
    async fn purchase(
        &self,
        pair_address: &str,
        token_to_receive: &str,
    ) -> Result<String, PurchaseError> {
        let wallet = self.load_wallet().await?;
        let amount = self.spendable_amount(&wallet).await?;
        let sender = wallet.address();
        let account = self.client.account(sender).await?;

        info!(
            wallet = %sender,
            token = %self.settings.default_token,
            amount = %amount,
            "Submitting swap"
        );

        let mut tx = Transaction {
            nonce: account.nonce,
            value: "0".to_string(),
            receiver: pair_address.to_string(),
            sender: sender.to_bech32(),
            gas_price: self.settings.gas_price,
            gas_limit: self.settings.gas_limit,
            data: None,
            chain_id: self.settings.chain_id.clone(),
            version: TRANSACTION_VERSION,
            signature: None,
        };
        tx.set_data(&swap_call_data(
            &self.settings.default_token,
            amount,
            token_to_receive,
        ));
        wallet.sign_transaction(&mut tx)?;

        let sent = self.client.send_transaction(&tx).await?;
        Ok(self.explorer_link(&sent.tx_hash))
    }
}
