//! HTTP clients for the MultiversX public API and the Telegram Bot API.
//!
//! Gated behind the `client` cargo feature so crates that only need the
//! shared types and codecs do not pull in `reqwest`.

mod multiversx;
mod telegram;

pub use multiversx::MultiversxClient;
pub use telegram::TelegramClient;

use reqwest::StatusCode;

/// Errors produced by the HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// The Bot API answered with `ok: false`.
    #[error("telegram error {code}: {description}")]
    Telegram { code: u16, description: String },

    /// A smart contract view returned a non-`ok` code.
    #[error("contract query failed ({code}): {message}")]
    ContractQuery { code: String, message: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A base64 field could not be decoded.
    #[error("invalid base64 in response: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Contract return data did not match the expected layout.
    #[error("codec error: {0}")]
    Codec(#[from] crate::codec::CodecError),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Whether retrying the same request cannot succeed.
    ///
    /// Authentication failures and conflicts (another poller on the same bot
    /// token) are permanent until an operator intervenes.
    pub fn is_fatal(&self) -> bool {
        match self {
            ClientError::Telegram { code, .. } => matches!(code, 401 | 403 | 404 | 409),
            ClientError::Api { status, .. } => matches!(
                *status,
                StatusCode::UNAUTHORIZED
                    | StatusCode::FORBIDDEN
                    | StatusCode::NOT_FOUND
                    | StatusCode::CONFLICT
            ),
            ClientError::Url(_) => true,
            _ => false,
        }
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
