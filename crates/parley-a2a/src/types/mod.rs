//! A2A Protocol Core Types
//!
//! This module defines the data types exchanged between agents: the agent
//! card served for discovery, messages and their parts, the artifacts a call
//! produces, and the JSON-RPC envelopes that carry them.
//!
//! ## Module Structure
//!
//! - [`agent_card`] - Agent capability discovery
//! - [`message`] - Message and role types
//! - [`part`] - Content part types (text, data)
//! - [`artifact`] - Call results
//! - [`rpc`] - JSON-RPC request/response envelopes

mod agent_card;
mod artifact;
mod message;
mod part;
mod rpc;

pub use agent_card::{
    AgentCapabilities, AgentCard, AgentSkill, ApiKeyLocation, PROTOCOL_VERSION, SecurityScheme,
};
pub use artifact::{Artifact, artifacts_text};
pub use message::{Message, Role};
pub use part::{DataPart, JSON_MIME_TYPE, Part, TextPart};
pub use rpc::{
    JSONRPC_VERSION, METHOD_MESSAGE_SEND, METHOD_MESSAGE_STREAM, MessageSendParams, RpcError,
    RpcPayload, RpcRequest, RpcResponse, SendResult,
};
