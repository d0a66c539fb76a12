//! MultiversX public API objects.

use serde::{Deserialize, Serialize};

/// Body of `POST /query` (read-only smart contract call).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractQuery {
    pub sc_address: String,
    pub func_name: String,
    /// Hex-encoded arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Response of `POST /query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractQueryResponse {
    /// Base64-encoded return values. `null` when the view returns nothing.
    #[serde(default)]
    pub return_data: Option<Vec<String>>,
    #[serde(default)]
    pub return_code: Option<String>,
    #[serde(default)]
    pub return_message: Option<String>,
}

impl ContractQueryResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self.return_code.as_deref(), None | Some("ok"))
    }
}

/// One entry of `GET /accounts/{address}/tokens`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub identifier: String,
    /// Balance in base units, as a decimal string.
    pub balance: String,
    #[serde(default)]
    pub decimals: Option<u32>,
}

/// Subset of `GET /accounts/{address}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: String,
    pub nonce: u64,
    #[serde(default)]
    pub balance: String,
}
