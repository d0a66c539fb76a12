//! MultiversX public API client.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::{ClientError, parse_response};
use crate::address::Address;
use crate::codec::{BondingRecord, decode_bonding_records};
use crate::objects::chain::{AccountInfo, ContractQuery, ContractQueryResponse, TokenBalance};
use crate::objects::transaction::{SendTransactionResponse, Transaction};

/// Typed HTTP client for the MultiversX public API (`api.multiversx.com`).
#[derive(Debug, Clone)]
pub struct MultiversxClient {
    http: Client,
    base_url: Url,
}

impl MultiversxClient {
    pub const DEFAULT_BASE_URL: &str = "https://api.multiversx.com";
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);
    /// Page size used when listing account tokens.
    const TOKENS_PAGE_SIZE: &str = "500";

    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::builder()
                .timeout(Self::REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` (e.g. to configure a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /query` – run a read-only contract view and return the decoded
    /// (raw bytes) return values.
    pub async fn query_contract(
        &self,
        sc_address: &str,
        func_name: &str,
        args: Vec<String>,
    ) -> Result<Vec<Vec<u8>>, ClientError> {
        let url = self.base_url.join("/query")?;
        let body = ContractQuery {
            sc_address: sc_address.to_string(),
            func_name: func_name.to_string(),
            args,
        };

        let resp = self.http.post(url).json(&body).send().await?;
        let response: ContractQueryResponse = parse_response(resp).await?;
        if !response.is_ok() {
            return Err(ClientError::ContractQuery {
                code: response.return_code.unwrap_or_default(),
                message: response.return_message.unwrap_or_default(),
            });
        }

        response
            .return_data
            .unwrap_or_default()
            .iter()
            .map(|entry| STANDARD.decode(entry).map_err(ClientError::from))
            .collect()
    }

    /// Query the registry view and decode its bonding records, in contract
    /// order.
    pub async fn bonding_records(
        &self,
        sc_address: &str,
        func_name: &str,
    ) -> Result<Vec<BondingRecord>, ClientError> {
        let return_data = self.query_contract(sc_address, func_name, Vec::new()).await?;
        Ok(decode_bonding_records(&return_data)?)
    }

    /// `GET /transactions/count` – number of successful transactions to
    /// `receiver` carrying `token` and calling `function`.
    pub async fn transaction_count(
        &self,
        receiver: &str,
        token: &str,
        function: &str,
    ) -> Result<u64, ClientError> {
        let url = self.base_url.join("/transactions/count")?;
        let resp = self
            .http
            .get(url)
            .query(&[
                ("receiver", receiver),
                ("token", token),
                ("status", "success"),
                ("function", function),
            ])
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /accounts/{address}`.
    pub async fn account(&self, address: &Address) -> Result<AccountInfo, ClientError> {
        let url = self.base_url.join(&format!("/accounts/{address}"))?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// `GET /accounts/{address}/tokens` – fungible token balances.
    pub async fn account_tokens(&self, address: &Address) -> Result<Vec<TokenBalance>, ClientError> {
        let url = self.base_url.join(&format!("/accounts/{address}/tokens"))?;
        let resp = self
            .http
            .get(url)
            .query(&[("size", Self::TOKENS_PAGE_SIZE)])
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /transactions` – broadcast a signed transaction.
    pub async fn send_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<SendTransactionResponse, ClientError> {
        let url = self.base_url.join("/transactions")?;
        let resp = self.http.post(url).json(tx).send().await?;
        parse_response(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::collections::HashMap;

    async fn spawn_fake(router: Router) -> MultiversxClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        MultiversxClient::new(Url::parse(&format!("http://{addr}")).unwrap())
    }

    fn encode_record(first: &str, second: &str, address: [u8; 32]) -> Vec<u8> {
        let mut out = Vec::new();
        for id in [first, second] {
            out.extend_from_slice(&(id.len() as u32).to_be_bytes());
            out.extend_from_slice(id.as_bytes());
        }
        out.extend_from_slice(&address);
        out
    }

    #[tokio::test]
    async fn test_bonding_records_from_query() {
        let router = Router::new().route(
            "/query",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["funcName"], "getAllBondingMetadata");
                assert_eq!(body["args"], json!([]));
                let entries = [
                    encode_record("A-111111", "ONE-f9954f", [1u8; 32]),
                    encode_record("B-222222", "ONE-f9954f", [2u8; 32]),
                ];
                Json(json!({
                    "returnData": entries.iter().map(|e| STANDARD.encode(e)).collect::<Vec<_>>(),
                    "returnCode": "ok",
                    "returnMessage": ""
                }))
            }),
        );
        let client = spawn_fake(router).await;

        let records = client
            .bonding_records("erd1contract", "getAllBondingMetadata")
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].first_token_id, "B-222222");
        assert_eq!(records[1].address, Address::from_bytes([2u8; 32]));
    }

    #[tokio::test]
    async fn test_query_error_code() {
        let router = Router::new().route(
            "/query",
            post(|| async {
                Json(json!({
                    "returnData": null,
                    "returnCode": "function not found",
                    "returnMessage": "invalid function"
                }))
            }),
        );
        let client = spawn_fake(router).await;

        let err = client
            .query_contract("erd1contract", "missing", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ContractQuery { code, .. } if code == "function not found"));
    }

    #[tokio::test]
    async fn test_transaction_count_query_params() {
        let router = Router::new().route(
            "/transactions/count",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let matches = params.get("receiver").map(String::as_str) == Some("erd1pair")
                    && params.get("token").map(String::as_str) == Some("TOMOON-abc")
                    && params.get("status").map(String::as_str) == Some("success")
                    && params.get("function").map(String::as_str) == Some("initialSwap");
                Json(if matches { 2 } else { 0 })
            }),
        );
        let client = spawn_fake(router).await;

        let count = client
            .transaction_count("erd1pair", "TOMOON-abc", "initialSwap")
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_account_endpoints() {
        let router = Router::new()
            .route(
                "/accounts/{address}",
                get(|Path(address): Path<String>| async move {
                    Json(json!({ "address": address, "nonce": 42, "balance": "0" }))
                }),
            )
            .route(
                "/accounts/{address}/tokens",
                get(|| async {
                    Json(json!([
                        { "identifier": "ONE-f9954f", "balance": "1000", "decimals": 18 },
                        { "identifier": "CAT-def456", "balance": "5" }
                    ]))
                }),
            );
        let client = spawn_fake(router).await;
        let address = Address::from_bytes([5u8; 32]);

        let account = client.account(&address).await.unwrap();
        assert_eq!(account.nonce, 42);
        assert_eq!(account.address, address.to_bech32());

        let tokens = client.account_tokens(&address).await.unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].balance, "1000");
        assert_eq!(tokens[1].decimals, None);
    }

    #[tokio::test]
    async fn test_send_transaction_and_api_error() {
        let router = Router::new()
            .route(
                "/transactions",
                post(|Json(tx): Json<Value>| async move {
                    if tx["signature"].is_null() {
                        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "unsigned" })));
                    }
                    (StatusCode::CREATED, Json(json!({ "txHash": "abc123", "status": "pending" })))
                }),
            );
        let client = spawn_fake(router).await;

        let mut tx = Transaction {
            nonce: 0,
            value: "0".to_string(),
            receiver: "erd1receiver".to_string(),
            sender: "erd1sender".to_string(),
            gas_price: 1_000_000_000,
            gas_limit: 100_000_000,
            data: None,
            chain_id: "1".to_string(),
            version: 1,
            signature: None,
        };
        let err = client.send_transaction(&tx).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status, .. } if status == StatusCode::BAD_REQUEST));

        tx.signature = Some("00".to_string());
        let sent = client.send_transaction(&tx).await.unwrap();
        assert_eq!(sent.tx_hash, "abc123");
    }
}
