//! A2A Transport Channel
//!
//! A [`Transport`] performs a single exchange with one peer: fetch its agent
//! card, or deliver one `message/send` request and classify what came back.
//! It never retries; resilience is layered on top by the caller.
//!
//! # Outcome classification
//!
//! | Observation | Error | Retryable |
//! |-------------|-------|-----------|
//! | 2xx with `result` | success | - |
//! | 2xx with `error` | `Protocol` (carries the RPC error) | No |
//! | 2xx with an unparseable body | `Protocol` | No |
//! | 401 / 403 | `Auth` | No |
//! | 404 | `NotFound` | No |
//! | 429 | `RateLimited` (with `Retry-After`) | Yes |
//! | 5xx | `Server` | Yes |
//! | other status | `Protocol` | No |
//! | connect failure / timeout | `Network` | Yes |
//!
//! # Example
//!
//! ```rust,ignore
//! use parley_a2a::{HttpTransport, Message, RpcRequest, Transport};
//!
//! let transport = HttpTransport::new("https://agent.example.com")?
//!     .with_api_key("X-API-Key", "sk-1234567890");
//!
//! let card = transport.fetch_card().await?;
//! let result = transport
//!     .call(&RpcRequest::message_send(Message::user("Hello")))
//!     .await?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::AuthConfig;
use crate::error::{A2aError, A2aResult};
use crate::types::{AgentCard, RpcRequest, RpcResponse, SendResult};

/// Default timeout for a single HTTP exchange
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Discovery path relative to the peer base address
pub const AGENT_CARD_PATH: &str = ".well-known/agent-card.json";

/// Call path relative to the peer base address
pub const MESSAGE_SEND_PATH: &str = "message/send";

/// Longest slice of an error body kept in error messages
const MAX_ERROR_BODY: usize = 512;

/// One request/response exchange with a single peer
#[async_trait]
pub trait Transport: Send + Sync {
    /// Base address of the peer
    fn endpoint(&self) -> &str;

    /// Fetch the peer's agent card from the discovery path
    async fn fetch_card(&self) -> A2aResult<AgentCard>;

    /// Deliver one RPC request and classify the outcome
    async fn call(&self, request: &RpcRequest) -> A2aResult<SendResult>;
}

impl std::fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("endpoint", &self.endpoint())
            .finish()
    }
}

/// HTTP transport built on `reqwest`
///
/// The client is `Clone`-able; clones share the underlying connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    /// Base URL of the peer, always ending in `/`
    base_url: Url,
    /// HTTP client
    http: Client,
    /// Per-request timeout configured on `http`
    timeout: Duration,
    /// Authentication configuration
    auth: Option<AuthConfig>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("has_auth", &self.auth.is_some())
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport for the peer at `base_url` with the default timeout
    pub fn new(base_url: impl AsRef<str>) -> A2aResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom per-request timeout
    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> A2aResult<Self> {
        let base_url = parse_base_url(base_url.as_ref())?;

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(format!("parley-a2a/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                A2aError::network(
                    base_url.as_str(),
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            base_url,
            http,
            timeout,
            auth: None,
        })
    }

    /// Create a transport with a custom HTTP client
    pub fn with_http_client(base_url: impl AsRef<str>, http: Client) -> A2aResult<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url.as_ref())?,
            http,
            timeout: DEFAULT_TIMEOUT,
            auth: None,
        })
    }

    /// Set authentication configuration
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set bearer token authentication
    pub fn with_bearer_token(self, token: impl Into<String>) -> Self {
        self.with_auth(AuthConfig::Bearer(token.into()))
    }

    /// Set API key authentication (header)
    pub fn with_api_key(self, header_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.with_auth(AuthConfig::ApiKeyHeader {
            name: header_name.into(),
            value: api_key.into(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a URL for a path relative to the peer base
    fn url_for(&self, path: &str) -> A2aResult<Url> {
        self.base_url.join(path).map_err(|source| A2aError::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
            source,
        })
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(auth) => auth.apply(builder),
            None => builder,
        }
    }

    fn send_error(&self, url: &Url, error: reqwest::Error) -> A2aError {
        if error.is_timeout() {
            A2aError::timeout(url.as_str(), self.timeout)
        } else {
            A2aError::network(url.as_str(), error.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn endpoint(&self) -> &str {
        self.base_url.as_str()
    }

    async fn fetch_card(&self) -> A2aResult<AgentCard> {
        let url = self.url_for(AGENT_CARD_PATH)?;

        debug!(url = %url, "Fetching agent card");

        let response = self
            .authorized(self.http.get(url.clone()))
            .send()
            .await
            .map_err(|e| self.send_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_for_status(&url, response).await);
        }

        let body = response.text().await.map_err(|e| self.send_error(&url, e))?;
        let card: AgentCard = serde_json::from_str(&body).map_err(|e| {
            A2aError::protocol(url.as_str(), format!("Failed to parse agent card: {}", e))
        })?;

        info!(
            agent_id = %card.id,
            name = %card.name,
            skills = card.skills.len(),
            "Fetched agent card"
        );

        Ok(card)
    }

    async fn call(&self, request: &RpcRequest) -> A2aResult<SendResult> {
        let url = self.url_for(MESSAGE_SEND_PATH)?;

        debug!(url = %url, request_id = %request.id, method = %request.method, "Sending RPC request");

        let response = self
            .authorized(self.http.post(url.clone()))
            .json(request)
            .send()
            .await
            .map_err(|e| self.send_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_for_status(&url, response).await);
        }

        let body = response.text().await.map_err(|e| self.send_error(&url, e))?;
        let envelope: RpcResponse = serde_json::from_str(&body).map_err(|e| {
            A2aError::protocol(url.as_str(), format!("Failed to parse response: {}", e))
        })?;

        if !envelope.correlates_with(&request.id) {
            warn!(
                url = %url,
                request_id = %request.id,
                response_id = ?envelope.id,
                "Response id does not match request id"
            );
        }

        match envelope.into_result() {
            Ok(result) => {
                debug!(
                    url = %url,
                    request_id = %request.id,
                    artifacts = result.artifacts.len(),
                    "RPC request succeeded"
                );
                Ok(result)
            }
            Err(rpc) => {
                warn!(url = %url, code = rpc.code, message = %rpc.message, "Peer returned RPC error");
                Err(A2aError::rpc(url.as_str(), rpc))
            }
        }
    }
}

/// Ensure the base URL ends with `/` so relative paths join beneath it
fn parse_base_url(raw: &str) -> A2aResult<Url> {
    let mut url = Url::parse(raw).map_err(|source| A2aError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Map a non-2xx response to its error kind
async fn error_for_status(url: &Url, response: reqwest::Response) -> A2aError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let body: String = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(MAX_ERROR_BODY)
        .collect();

    classify_status(url.as_str(), status, retry_after, body)
}

fn classify_status(
    endpoint: &str,
    status: StatusCode,
    retry_after: Option<Duration>,
    body: String,
) -> A2aError {
    let endpoint = endpoint.to_string();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => A2aError::Auth {
            endpoint,
            status: status.as_u16(),
        },
        StatusCode::NOT_FOUND => A2aError::NotFound { endpoint },
        StatusCode::TOO_MANY_REQUESTS => A2aError::RateLimited {
            endpoint,
            retry_after,
        },
        s if s.is_server_error() => A2aError::Server {
            endpoint,
            status: s.as_u16(),
            message: body,
        },
        s => A2aError::Protocol {
            endpoint,
            message: format!("unexpected HTTP {}: {}", s, body),
            rpc: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_transport_creation() {
        let transport = HttpTransport::new("https://agent.example.com").unwrap();
        assert_eq!(transport.endpoint(), "https://agent.example.com/");
    }

    #[test]
    fn test_url_building_keeps_base_path() {
        let transport = HttpTransport::new("https://gw.example.com/agents/legal").unwrap();

        let url = transport.url_for(MESSAGE_SEND_PATH).unwrap();
        assert_eq!(url.as_str(), "https://gw.example.com/agents/legal/message/send");

        let url = transport.url_for(AGENT_CARD_PATH).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gw.example.com/agents/legal/.well-known/agent-card.json"
        );
    }

    #[test]
    fn test_invalid_url() {
        let result = HttpTransport::new("not a valid url");
        assert!(matches!(result, Err(A2aError::InvalidUrl { .. })));
    }

    #[rstest]
    #[case(401, "AUTH_ERROR", false)]
    #[case(403, "AUTH_ERROR", false)]
    #[case(404, "NOT_FOUND", false)]
    #[case(429, "RATE_LIMITED", true)]
    #[case(500, "SERVER_ERROR", true)]
    #[case(503, "SERVER_ERROR", true)]
    #[case(400, "PROTOCOL_ERROR", false)]
    #[case(302, "PROTOCOL_ERROR", false)]
    fn test_status_classification(
        #[case] status: u16,
        #[case] code: &str,
        #[case] retryable: bool,
    ) {
        let status = StatusCode::from_u16(status).unwrap();
        let err = classify_status("https://a.example.com/", status, None, String::new());
        assert_eq!(err.error_code(), code);
        assert_eq!(err.is_retryable(), retryable);
    }
}
