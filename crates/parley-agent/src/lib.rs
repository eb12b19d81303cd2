//! # Parley Agent - Resilient calls and orchestration
//!
//! This crate turns single A2A exchanges into dependable multi-agent
//! workflows.
//!
//! ## Features
//!
//! - **Resilient Client**: card caching, bounded exponential-backoff retry,
//!   per-call timeouts and a per-peer circuit breaker
//! - **Agent Registry**: peers registered by endpoint, looked up by skill
//! - **Orchestration**: sequential, parallel, dynamic-routing and
//!   hierarchical plans executed over the registry
//! - **Configuration**: resilience settings from code or environment
//!
//! ## Example: Calling One Agent
//!
//! ```rust,ignore
//! use parley_agent::{ResilienceConfigBuilder, ResilientClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResilienceConfigBuilder::from_env()?.build()?;
//!     let client = ResilientClient::connect("https://legal.example.com", &config)?;
//!
//!     let card = client.get_card(false).await?;
//!     println!("Talking to {}", card.name);
//!
//!     let artifacts = client.send_message("Review this clause", None).await?;
//!     println!("{}", parley_a2a::artifacts_text(&artifacts));
//!     Ok(())
//! }
//! ```
//!
//! ## Example: Routing by Classification
//!
//! ```rust,ignore
//! use parley_agent::{
//!     AgentRegistry, Classifier, OrchestrationPlan, Orchestrator, RoutingTable, Task,
//! };
//! use std::sync::Arc;
//!
//! let mut registry = AgentRegistry::new();
//! registry.register_endpoint("https://classifier.example.com", &config).await?;
//! registry.register_endpoint("https://legal.example.com", &config).await?;
//! registry.register_endpoint("https://general.example.com", &config).await?;
//!
//! let plan = OrchestrationPlan::DynamicRouting(
//!     RoutingTable::new(Classifier::skill("classify"))
//!         .route("legal", "legal-review")
//!         .with_default("general"),
//! );
//!
//! let orchestrator = Orchestrator::new(Arc::new(registry));
//! let outcome = orchestrator.execute(&plan, &Task::new("Is this NDA enforceable?")).await?;
//! ```

pub mod card_cache;
pub mod circuit_breaker;
pub mod client;
pub mod config;
pub mod error;
pub mod orchestration;
pub mod registry;
pub mod retry;

pub use card_cache::AgentCardCache;
pub use circuit_breaker::{
    BreakerSnapshot, CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitOpen, CircuitState,
};
pub use client::ResilientClient;
pub use config::{ConfigError, ResilienceConfig, ResilienceConfigBuilder};
pub use error::{AgentError, AgentResult};
pub use orchestration::{
    Classifier, Delegate, DelegationNode, OrchestrationOutcome, OrchestrationPlan, Orchestrator,
    RouteDecision, RoutingTable, Step, StepRecord, Target, Task,
};
pub use registry::{AgentRegistry, RegisteredAgent};
pub use retry::{RetryConfig, RetryPolicy};

// Re-export the wire layer for convenience
pub use parley_a2a;
