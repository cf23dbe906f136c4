//! HTTP client for the remote history endpoint

use crate::config::{HistoryConfig, HistoryMethod};
use crate::conversation::Conversation;
use crate::error::{ChatkeepError, Result};
use crate::storage::StoredConversation;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Header carrying the anonymous session id
pub const SESSION_HEADER: &str = "X-Session-Id";

/// Body sent with POST history requests
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    /// Anonymous session id of this device, if available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Conversation ids known to this device, newest first
    pub conversation_ids: Vec<String>,
}

/// Accepted response shapes: `{"conversations": [...]}` or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryPayload {
    Wrapped {
        conversations: Vec<StoredConversation>,
    },
    Bare(Vec<StoredConversation>),
}

/// Parse a history response body
///
/// Returns the reason as `Err` when the body is not one of the accepted
/// shapes or any element is malformed.
///
/// # Examples
///
/// ```
/// use chatkeep::sync::parse_history;
///
/// assert!(parse_history(br#"{"conversations": []}"#).unwrap().is_empty());
/// assert!(parse_history(b"[]").unwrap().is_empty());
/// assert!(parse_history(br#"{"items": []}"#).is_err());
/// ```
pub fn parse_history(body: &[u8]) -> std::result::Result<Vec<Conversation>, String> {
    let payload: HistoryPayload = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    let stored = match payload {
        HistoryPayload::Wrapped { conversations } => conversations,
        HistoryPayload::Bare(conversations) => conversations,
    };
    Ok(stored.into_iter().map(Conversation::from).collect())
}

/// Thin wrapper over `reqwest` for one configured endpoint
#[derive(Debug, Clone)]
pub struct HistoryClient {
    client: Client,
    url: Url,
    method: HistoryMethod,
}

impl HistoryClient {
    /// Creates a client for the configured endpoint
    ///
    /// Returns `Ok(None)` when no endpoint is configured.
    ///
    /// # Errors
    ///
    /// Returns `ChatkeepError::Config` if the URL does not parse and
    /// `ChatkeepError::Sync` if the HTTP client cannot be built
    pub fn from_config(config: &HistoryConfig) -> Result<Option<Self>> {
        let raw = match config.endpoint() {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let url = Url::parse(raw).map_err(|e| {
            ChatkeepError::Config(format!("Invalid history URL '{}': {}", raw, e))
        })?;

        let client = Client::builder()
            .user_agent(concat!("chatkeep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatkeepError::Sync(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!(
            "Initialized history client: url={}, method={}",
            url,
            config.method
        );

        Ok(Some(Self {
            client,
            url,
            method: config.method,
        }))
    }

    /// The endpoint URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The request method
    pub fn method(&self) -> HistoryMethod {
        self.method
    }

    /// Issue the history request and return the raw success body
    ///
    /// # Errors
    ///
    /// Returns `ChatkeepError::Http` on transport failure and
    /// `ChatkeepError::Sync` on a non-success status
    pub async fn fetch(&self, request: &HistoryRequest) -> Result<Vec<u8>> {
        // `json` already sets `Content-Type`; `header` would append a second one
        let mut builder = match self.method {
            HistoryMethod::Get => self
                .client
                .get(self.url.clone())
                .header(CONTENT_TYPE, "application/json"),
            HistoryMethod::Post => self.client.post(self.url.clone()).json(request),
        };
        if let Some(session_id) = &request.session_id {
            builder = builder.header(SESSION_HEADER, session_id);
        }

        tracing::debug!("Fetching remote history: {} {}", self.method, self.url);
        let response = builder.send().await.map_err(ChatkeepError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChatkeepError::Sync(format!(
                "History endpoint returned {}: {}",
                status, error_text
            ))
            .into());
        }

        let body = response.bytes().await.map_err(ChatkeepError::Http)?;
        Ok(body.to_vec())
    }

    /// Check that the endpoint answers
    ///
    /// Sends a `HEAD` request. A success status or `405 Method Not Allowed`
    /// both mean the endpoint is reachable.
    ///
    /// # Errors
    ///
    /// Returns `ChatkeepError::Http` on transport failure and
    /// `ChatkeepError::Sync` on any other status
    pub async fn probe(&self) -> Result<StatusCode> {
        let response = self
            .client
            .head(self.url.clone())
            .send()
            .await
            .map_err(ChatkeepError::Http)?;

        let status = response.status();
        if status.is_success() || status == StatusCode::METHOD_NOT_ALLOWED {
            Ok(status)
        } else {
            Err(ChatkeepError::Sync(format!("History endpoint returned {}", status)).into())
        }
    }
}
