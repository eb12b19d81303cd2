//! A2A Protocol Error Types
//!
//! Every transport-level outcome other than success maps to one variant of
//! [`A2aError`]. Each variant records the peer endpoint that produced it.

use std::time::Duration;
use thiserror::Error;

use crate::types::RpcError;

/// Result type for A2A operations
pub type A2aResult<T> = Result<T, A2aError>;

/// Errors that can occur in A2A protocol operations
#[derive(Debug, Clone, Error)]
pub enum A2aError {
    /// Fetching or validating the agent card failed
    #[error("Agent card discovery failed for {endpoint}: {source}")]
    Discovery {
        endpoint: String,
        #[source]
        source: Box<A2aError>,
    },

    /// Agent card validation failed
    #[error("Invalid agent card from {endpoint}: {reason}")]
    InvalidAgentCard { endpoint: String, reason: String },

    /// The peer rejected our credentials
    #[error("Authentication rejected by {endpoint} (HTTP {status})")]
    Auth { endpoint: String, status: u16 },

    /// The peer does not serve the requested path
    #[error("Not found: {endpoint}")]
    NotFound { endpoint: String },

    /// The peer asked us to slow down
    #[error("Rate limited by {endpoint}{}", fmt_retry_after(.retry_after))]
    RateLimited {
        endpoint: String,
        retry_after: Option<Duration>,
    },

    /// The peer failed with a 5xx status
    #[error("Server error from {endpoint}: HTTP {status}: {message}")]
    Server {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Connection failure or timeout
    #[error("Network error talking to {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    /// Malformed response, unexpected status, or an RPC-level error payload
    #[error("Protocol error from {endpoint}: {message}")]
    Protocol {
        endpoint: String,
        message: String,
        rpc: Option<RpcError>,
    },

    /// The configured peer address could not be parsed
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

fn fmt_retry_after(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(": retry after {}s", d.as_secs()),
        None => String::new(),
    }
}

impl A2aError {
    /// Wrap a fetch or validation failure as a discovery error
    pub fn discovery(endpoint: impl Into<String>, source: A2aError) -> Self {
        Self::Discovery {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// Create an invalid agent card error
    pub fn invalid_agent_card(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAgentCard {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Create a network error
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a network error for a call that exceeded its deadline
    pub fn timeout(endpoint: impl Into<String>, after: Duration) -> Self {
        Self::network(
            endpoint,
            format!("request timed out after {}ms", after.as_millis()),
        )
    }

    /// Create a protocol error
    pub fn protocol(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            endpoint: endpoint.into(),
            message: message.into(),
            rpc: None,
        }
    }

    /// Create a protocol error from an RPC error payload
    pub fn rpc(endpoint: impl Into<String>, error: RpcError) -> Self {
        Self::Protocol {
            endpoint: endpoint.into(),
            message: format!("peer returned RPC error: {error}"),
            rpc: Some(error),
        }
    }

    /// Check if this error is retryable
    ///
    /// Only rate limiting, 5xx failures and network failures are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            A2aError::RateLimited { .. } | A2aError::Server { .. } | A2aError::Network { .. }
        )
    }

    /// Delay the peer asked for, if it sent one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            A2aError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Endpoint that produced the error, when known
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            A2aError::Discovery { endpoint, .. }
            | A2aError::InvalidAgentCard { endpoint, .. }
            | A2aError::Auth { endpoint, .. }
            | A2aError::NotFound { endpoint }
            | A2aError::RateLimited { endpoint, .. }
            | A2aError::Server { endpoint, .. }
            | A2aError::Network { endpoint, .. }
            | A2aError::Protocol { endpoint, .. } => Some(endpoint),
            A2aError::InvalidUrl { url, .. } => Some(url),
        }
    }

    /// Get the error code suitable for logging or reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            A2aError::Discovery { .. } => "DISCOVERY_ERROR",
            A2aError::InvalidAgentCard { .. } => "INVALID_AGENT_CARD",
            A2aError::Auth { .. } => "AUTH_ERROR",
            A2aError::NotFound { .. } => "NOT_FOUND",
            A2aError::RateLimited { .. } => "RATE_LIMITED",
            A2aError::Server { .. } => "SERVER_ERROR",
            A2aError::Network { .. } => "NETWORK_ERROR",
            A2aError::Protocol { .. } => "PROTOCOL_ERROR",
            A2aError::InvalidUrl { .. } => "INVALID_URL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_endpoint() {
        let err = A2aError::Server {
            endpoint: "https://a.example.com/".into(),
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "Server error from https://a.example.com/: HTTP 503: unavailable"
        );
        assert_eq!(err.endpoint(), Some("https://a.example.com/"));
    }

    #[test]
    fn test_error_retryable() {
        assert!(A2aError::network("e", "connection refused").is_retryable());
        assert!(A2aError::timeout("e", Duration::from_secs(30)).is_retryable());
        assert!(
            A2aError::RateLimited {
                endpoint: "e".into(),
                retry_after: None
            }
            .is_retryable()
        );

        assert!(!A2aError::Auth { endpoint: "e".into(), status: 401 }.is_retryable());
        assert!(!A2aError::NotFound { endpoint: "e".into() }.is_retryable());
        assert!(!A2aError::protocol("e", "garbage").is_retryable());
        assert!(!A2aError::discovery("e", A2aError::network("e", "down")).is_retryable());
    }

    #[test]
    fn test_retry_after() {
        let rate_limit = A2aError::RateLimited {
            endpoint: "e".into(),
            retry_after: Some(Duration::from_secs(60)),
        };
        assert_eq!(rate_limit.retry_after(), Some(Duration::from_secs(60)));
        assert_eq!(rate_limit.to_string(), "Rate limited by e: retry after 60s");

        assert_eq!(A2aError::network("e", "x").retry_after(), None);
    }

    #[test]
    fn test_rpc_error_is_protocol_error() {
        let err = A2aError::rpc("e", RpcError::new(RpcError::INTERNAL_ERROR, "boom"));
        assert_eq!(err.error_code(), "PROTOCOL_ERROR");
        assert!(matches!(err, A2aError::Protocol { rpc: Some(ref r), .. } if r.is_internal()));
    }
}
