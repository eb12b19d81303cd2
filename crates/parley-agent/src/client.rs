//! Resilient client for a single peer agent.
//!
//! A [`ResilientClient`] owns everything needed to call one peer safely:
//! the card cache, the peer's circuit breaker and the retry policy. A call
//! flows through them in this order:
//!
//! ```text
//! send ─▶ breaker.try_acquire ─▶ retry.run ─▶ timeout(transport.call) ─▶ peer
//!                 │                   │
//!                 └── CircuitOpen     └── final outcome ─▶ breaker (once)
//! ```
//!
//! The breaker sees only the final outcome of the retry loop, never the
//! individual attempts.

use parley_a2a::{
    A2aError, AgentCard, Artifact, AuthConfig, HttpTransport, Message, Part, RpcRequest,
    Transport,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::card_cache::AgentCardCache;
use crate::circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
use crate::config::ResilienceConfig;
use crate::error::{AgentError, AgentResult};
use crate::retry::RetryPolicy;

/// Client for one peer with card caching, retry and circuit breaking
#[derive(Debug)]
pub struct ResilientClient {
    transport: Arc<dyn Transport>,
    cards: AgentCardCache,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl ResilientClient {
    /// Create a client for the peer at `url` over HTTP
    pub fn connect(url: &str, config: &ResilienceConfig) -> AgentResult<Self> {
        let transport = HttpTransport::with_timeout(url, config.request_timeout)?;
        Ok(Self::with_transport(Arc::new(transport), config.clone()))
    }

    /// Create an HTTP client that authenticates the way the peer's card asks
    ///
    /// The card is fetched without credentials. If it declares a `security`
    /// scheme, `secret` is sent accordingly on every later request.
    pub async fn connect_with_secret(
        url: &str,
        secret: &str,
        config: &ResilienceConfig,
    ) -> AgentResult<Self> {
        let transport = HttpTransport::with_timeout(url, config.request_timeout)?;
        let card = transport
            .fetch_card()
            .await
            .map_err(|e| A2aError::discovery(url, e))?;

        let transport = match card
            .security
            .as_ref()
            .and_then(|scheme| AuthConfig::from_scheme(scheme, secret))
        {
            Some(auth) => transport.with_auth(auth),
            None => {
                debug!(endpoint = %url, "Peer declares no security scheme, sending no credentials");
                transport
            }
        };

        Ok(Self::with_transport(Arc::new(transport), config.clone()))
    }

    /// Create a client over an arbitrary transport
    pub fn with_transport(transport: Arc<dyn Transport>, config: ResilienceConfig) -> Self {
        let endpoint = transport.endpoint().to_string();
        Self {
            cards: AgentCardCache::new(Arc::clone(&transport), config.request_timeout),
            breaker: CircuitBreaker::new(endpoint, config.breaker),
            retry: RetryPolicy::new(config.retry),
            request_timeout: config.request_timeout,
            transport,
        }
    }

    /// Base address of the peer
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Get the peer's agent card, from cache unless `force_refresh` is set
    pub async fn get_card(&self, force_refresh: bool) -> AgentResult<Arc<AgentCard>> {
        Ok(self.cards.get(force_refresh).await?)
    }

    /// Send a text instruction, optionally followed by a JSON data part
    pub async fn send_message(
        &self,
        text: impl Into<String>,
        extra: Option<Value>,
    ) -> AgentResult<Vec<Artifact>> {
        let mut message = Message::user(text);
        if let Some(data) = extra {
            message = message.with_part(Part::json(data));
        }
        self.send(message, None).await
    }

    /// Send a message and return the artifacts the peer produced
    ///
    /// # Errors
    ///
    /// - `AgentError::CircuitOpen` if the breaker rejects the call; the peer
    ///   is not contacted.
    /// - `AgentError::Transport` with the final outcome of the retry loop.
    pub async fn send(
        &self,
        message: Message,
        metadata: Option<Value>,
    ) -> AgentResult<Vec<Artifact>> {
        let permit = self.breaker.try_acquire().map_err(|open| {
            warn!(
                endpoint = %open.endpoint,
                retry_in_ms = open.retry_in.as_millis() as u64,
                "Call rejected by open circuit"
            );
            AgentError::from(open)
        })?;

        let mut request = RpcRequest::message_send(message);
        if let Some(metadata) = metadata {
            request = request.with_metadata(metadata);
        }

        let endpoint = self.endpoint();
        let outcome = self
            .retry
            .run(endpoint, |attempt| {
                let request = &request;
                async move {
                    debug!(endpoint = %endpoint, request_id = %request.id, attempt, "Calling peer");
                    tokio::time::timeout(self.request_timeout, self.transport.call(request))
                        .await
                        .unwrap_or_else(|_| Err(A2aError::timeout(endpoint, self.request_timeout)))
                }
            })
            .await;

        match outcome {
            Ok(result) => {
                permit.record_success();
                Ok(result.artifacts)
            }
            Err(e) => {
                permit.record_failure();
                Err(e.into())
            }
        }
    }

    /// Whether the breaker would admit a call now
    pub fn is_available(&self) -> bool {
        self.breaker.is_call_permitted()
    }

    /// Current breaker state
    pub fn breaker_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Current breaker state and counters
    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }
}
