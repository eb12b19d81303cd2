//! Error types for resilient calls and orchestration.

use parley_a2a::A2aError;
use std::time::Duration;
use thiserror::Error;

use crate::circuit_breaker::CircuitOpen;

/// Errors that can occur when calling agents or executing a plan.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The call reached the transport and failed there.
    #[error("{0}")]
    Transport(#[from] A2aError),

    /// The peer's circuit breaker rejected the call without contacting it.
    #[error("Circuit open for {endpoint}: retry in {}ms", .retry_in.as_millis())]
    CircuitOpen {
        endpoint: String,
        retry_in: Duration,
    },

    /// A plan could not be mapped onto a registered agent.
    #[error("Routing failed: {reason}")]
    Routing { reason: String },

    /// A step or branch of a plan failed.
    #[error("{topology} step {step} ({target}) failed: {source}")]
    Orchestration {
        topology: &'static str,
        step: usize,
        target: String,
        #[source]
        source: Box<AgentError>,
    },

    /// Execution was cancelled by the caller.
    #[error("Orchestration cancelled")]
    Cancelled,
}

impl AgentError {
    /// Create a routing error.
    pub fn routing(reason: impl Into<String>) -> Self {
        AgentError::Routing {
            reason: reason.into(),
        }
    }

    /// Wrap a step failure with its position in the plan.
    pub fn step_failed(
        topology: &'static str,
        step: usize,
        target: impl Into<String>,
        source: AgentError,
    ) -> Self {
        AgentError::Orchestration {
            topology,
            step,
            target: target.into(),
            source: Box::new(source),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Innermost error, following nested orchestration failures.
    pub fn root_cause(&self) -> &AgentError {
        match self {
            AgentError::Orchestration { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            AgentError::Transport(e) => e.error_code(),
            AgentError::CircuitOpen { .. } => "CIRCUIT_OPEN",
            AgentError::Routing { .. } => "ROUTING_ERROR",
            AgentError::Orchestration { .. } => "ORCHESTRATION_ERROR",
            AgentError::Cancelled => "CANCELLED",
        }
    }
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

impl From<CircuitOpen> for AgentError {
    fn from(open: CircuitOpen) -> Self {
        AgentError::CircuitOpen {
            endpoint: open.endpoint,
            retry_in: open.retry_in,
        }
    }
}
