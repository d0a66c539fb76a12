//! Transactions as submitted to `POST /transactions`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Current transaction version for plain (non hash-signed) transactions.
pub const TRANSACTION_VERSION: u32 = 1;

/// A MultiversX transaction.
///
/// Field order is significant: the signing payload is this struct serialized
/// to JSON without the `signature` field, and the protocol expects
/// `nonce, value, receiver, sender, gasPrice, gasLimit, data, chainID,
/// version` in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub nonce: u64,
    pub value: String,
    pub receiver: String,
    pub sender: String,
    pub gas_price: u64,
    pub gas_limit: u64,
    /// Base64 of the call data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub version: u32,
    /// Hex Ed25519 signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Transaction {
    /// Set the call data from its plain text form (`func@arg@arg…`).
    pub fn set_data(&mut self, data: &str) {
        self.data = if data.is_empty() {
            None
        } else {
            Some(STANDARD.encode(data))
        };
    }
}

/// Response of `POST /transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResponse {
    pub tx_hash: String,
    #[serde(default)]
    pub status: Option<String>,
}
