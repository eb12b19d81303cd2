//! JSON-RPC request and response envelopes for the A2A protocol.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Artifact, Message};

/// JSON-RPC protocol version tag
pub const JSONRPC_VERSION: &str = "2.0";

/// Method name for a synchronous message exchange
pub const METHOD_MESSAGE_SEND: &str = "message/send";

/// Method name for the streaming variant (advertised, not spoken by this crate)
pub const METHOD_MESSAGE_STREAM: &str = "message/stream";

/// Request sent to `POST <peer>/message/send`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcRequest {
    /// Protocol version tag, always `"2.0"`
    pub jsonrpc: String,

    /// Correlation id echoed back by the peer
    pub id: String,

    /// Method name
    pub method: String,

    /// Call parameters
    pub params: MessageSendParams,
}

impl RpcRequest {
    /// Build a `message/send` request with a fresh correlation id
    pub fn message_send(message: Message) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Uuid::new_v4().to_string(),
            method: METHOD_MESSAGE_SEND.to_string(),
            params: MessageSendParams {
                message,
                metadata: None,
            },
        }
    }

    /// Attach extension data to the call parameters
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.params.metadata = Some(metadata);
        self
    }
}

/// Parameters of a `message/send` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSendParams {
    /// The message to deliver
    pub message: Message,

    /// Optional extension data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Successful result of a `message/send` call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    /// Artifacts produced by the peer, in order
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

/// Error object of a JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcError {
    /// Numeric error code
    pub code: i64,

    /// Human-readable message
    pub message: String,

    /// Optional structured detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    /// Invalid JSON was received by the peer
    pub const PARSE_ERROR: i64 = -32700;
    /// The request object was not valid
    pub const INVALID_REQUEST: i64 = -32600;
    /// The method does not exist
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid method parameters
    pub const INVALID_PARAMS: i64 = -32602;
    /// Internal or unexpected failure on the peer side
    pub const INTERNAL_ERROR: i64 = -32603;

    /// Create a new error object
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Add structured detail
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Whether the peer reported an internal failure
    pub fn is_internal(&self) -> bool {
        self.code == Self::INTERNAL_ERROR
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Outcome carried by a response: a result or an error, never both
#[derive(Debug, Clone, PartialEq)]
pub enum RpcPayload {
    Result(SendResult),
    Error(RpcError),
}

/// Response envelope returned by `message/send`
///
/// Deserialization rejects envelopes that carry both `result` and `error`,
/// or neither, so a value of this type always holds exactly one payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRpcResponse", into = "RawRpcResponse")]
pub struct RpcResponse {
    /// Correlation id (string, number, or null per JSON-RPC)
    pub id: Option<serde_json::Value>,

    /// The result or error
    pub payload: RpcPayload,
}

impl RpcResponse {
    /// Successful response with the given artifacts
    pub fn success(id: impl Into<String>, artifacts: Vec<Artifact>) -> Self {
        Self {
            id: Some(serde_json::Value::String(id.into())),
            payload: RpcPayload::Result(SendResult { artifacts }),
        }
    }

    /// Error response
    pub fn error(id: impl Into<String>, error: RpcError) -> Self {
        Self {
            id: Some(serde_json::Value::String(id.into())),
            payload: RpcPayload::Error(error),
        }
    }

    /// Whether the response id matches a request id
    pub fn correlates_with(&self, request_id: &str) -> bool {
        match &self.id {
            Some(serde_json::Value::String(id)) => id == request_id,
            _ => false,
        }
    }

    /// Split into the result or the error
    pub fn into_result(self) -> Result<SendResult, RpcError> {
        match self.payload {
            RpcPayload::Result(result) => Ok(result),
            RpcPayload::Error(error) => Err(error),
        }
    }
}

/// Wire shape of a response before the payload invariant is checked
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRpcResponse {
    jsonrpc: String,
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<SendResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

impl TryFrom<RawRpcResponse> for RpcResponse {
    type Error = String;

    fn try_from(raw: RawRpcResponse) -> Result<Self, Self::Error> {
        if raw.jsonrpc != JSONRPC_VERSION {
            return Err(format!("unsupported jsonrpc version '{}'", raw.jsonrpc));
        }
        let payload = match (raw.result, raw.error) {
            (Some(result), None) => RpcPayload::Result(result),
            (None, Some(error)) => RpcPayload::Error(error),
            (Some(_), Some(_)) => return Err("response carries both result and error".into()),
            (None, None) => return Err("response carries neither result nor error".into()),
        };
        Ok(Self {
            id: raw.id,
            payload,
        })
    }
}

impl From<RpcResponse> for RawRpcResponse {
    fn from(response: RpcResponse) -> Self {
        let (result, error) = match response.payload {
            RpcPayload::Result(r) => (Some(r), None),
            RpcPayload::Error(e) => (None, Some(e)),
        };
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: response.id,
            result,
            error,
        }
    }
}
