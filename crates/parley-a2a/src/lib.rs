//! # Parley A2A - Agent-to-Agent wire layer
//!
//! This crate holds everything needed to talk to a single peer agent:
//!
//! - **Core Types**: agent cards, messages, parts, artifacts and the JSON-RPC
//!   envelopes that carry them
//! - **Errors**: the transport outcome taxonomy ([`A2aError`])
//! - **Transport**: the [`Transport`] seam and its `reqwest` implementation
//!   ([`HttpTransport`])
//! - **Testing**: a scripted [`testing::MockTransport`] (requires the
//!   `testing` feature)
//!
//! ## Protocol Overview
//!
//! 1. **Discovery**: `GET <peer>/.well-known/agent-card.json` returns an
//!    [`AgentCard`] listing the agent's skills
//! 2. **Call**: `POST <peer>/message/send` with an [`RpcRequest`] wrapping a
//!    [`Message`]
//! 3. **Response**: an [`RpcResponse`] carrying either artifacts or an error
//!
//! ## Example: Creating an Agent Card
//!
//! ```rust
//! use parley_a2a::{AgentCard, AgentSkill};
//!
//! let card = AgentCard::new("legal-agent", "Legal Agent", "https://legal.example.com")
//!     .with_description("Reviews contracts")
//!     .with_skill(
//!         AgentSkill::new("legal", "Legal review")
//!             .with_input("text/plain")
//!             .with_output("text/plain"),
//!     );
//!
//! assert!(card.validate().is_ok());
//! ```
//!
//! ## Example: Building a Request
//!
//! ```rust
//! use parley_a2a::{Message, Part, RpcRequest};
//!
//! let message = Message::user("Summarize this contract")
//!     .with_part(Part::json(serde_json::json!({"language": "en"})));
//! let request = RpcRequest::message_send(message);
//!
//! assert_eq!(request.method, "message/send");
//! ```

pub mod auth;
pub mod error;
pub mod transport;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use auth::AuthConfig;
pub use error::{A2aError, A2aResult};
pub use transport::{
    AGENT_CARD_PATH, DEFAULT_TIMEOUT, HttpTransport, MESSAGE_SEND_PATH, Transport,
};
pub use types::{
    AgentCapabilities, AgentCard, AgentSkill, ApiKeyLocation, Artifact, DataPart, JSON_MIME_TYPE,
    JSONRPC_VERSION, METHOD_MESSAGE_SEND, METHOD_MESSAGE_STREAM, Message, MessageSendParams,
    PROTOCOL_VERSION, Part, Role, RpcError, RpcPayload, RpcRequest, RpcResponse, SecurityScheme,
    SendResult, TextPart, artifacts_text,
};
