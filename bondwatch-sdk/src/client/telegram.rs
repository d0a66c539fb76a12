//! Telegram Bot API client.
//!
//! Only the three methods the watcher needs: `getMe`, `getUpdates` (long
//! polling) and `sendMessage`.

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::ClientError;
use crate::objects::telegram::{
    GetUpdatesRequest, Message, SendMessageRequest, TelegramResponse, Update, User,
};

/// Typed HTTP client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TelegramClient {
    pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    /// Slack added on top of the long-polling timeout for `getUpdates`.
    const POLL_GRACE: Duration = Duration::from_secs(10);

    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// Replace the default `reqwest::Client` (e.g. to configure a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `getMe` – identity probe, also validates the token.
    pub async fn get_me(&self) -> Result<User, ClientError> {
        self.call("getMe", &serde_json::json!({}), Self::REQUEST_TIMEOUT)
            .await
    }

    /// `getUpdates` – long-poll for new messages after `offset`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, ClientError> {
        let body = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message"],
        };
        let timeout = Duration::from_secs(timeout_secs) + Self::POLL_GRACE;
        self.call("getUpdates", &body, timeout).await
    }

    /// `sendMessage` – plain text message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, ClientError> {
        let body = SendMessageRequest {
            chat_id,
            text,
            disable_web_page_preview: true,
        };
        self.call("sendMessage", &body, Self::REQUEST_TIMEOUT).await
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, ClientError> {
        let url = self.base_url.join(&format!("/bot{}/{method}", self.token))?;
        let resp = self
            .http
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            // The URL embeds the token; keep it out of logged errors.
            .map_err(|e| ClientError::Http(e.without_url()))?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| ClientError::Http(e.without_url()))?;
        match serde_json::from_slice::<TelegramResponse<T>>(&bytes) {
            Ok(TelegramResponse {
                ok: true,
                result: Some(result),
                ..
            }) => Ok(result),
            Ok(response) => Err(ClientError::Telegram {
                code: response.error_code.unwrap_or(status.as_u16()),
                description: response.description.unwrap_or_default(),
            }),
            Err(_) if !status.is_success() => Err(ClientError::Api {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            }),
            Err(e) => Err(ClientError::Json(e)),
        }
    }
}
