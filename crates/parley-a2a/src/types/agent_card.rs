//! Agent Card types for capability discovery in the A2A protocol.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

use crate::error::{A2aError, A2aResult};

/// Protocol version advertised by cards built with [`AgentCard::new`]
pub const PROTOCOL_VERSION: &str = "0.3";

/// Agent Card for capability discovery
///
/// The Agent Card is the JSON document an agent serves at
/// `/.well-known/agent-card.json`. Once fetched it is treated as immutable:
/// a refresh replaces the whole card rather than editing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Unique identifier for the agent
    pub id: String,

    /// Human-readable name of the agent
    pub name: String,

    /// Description of the agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Base address the agent accepts calls on
    pub endpoint: String,

    /// Protocol version spoken by the agent
    pub version: String,

    /// Agent capabilities
    #[serde(default)]
    pub capabilities: AgentCapabilities,

    /// How callers authenticate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityScheme>,

    /// Skills the agent can perform
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// Create a new agent card with required fields
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            endpoint: endpoint.into(),
            version: PROTOCOL_VERSION.to_string(),
            capabilities: AgentCapabilities::default(),
            security: None,
            skills: Vec::new(),
        }
    }

    /// Add a skill to the agent card
    pub fn with_skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the security scheme
    pub fn with_security(mut self, security: SecurityScheme) -> Self {
        self.security = Some(security);
        self
    }

    /// Enable streaming capability
    pub fn with_streaming(mut self) -> Self {
        self.capabilities.streaming = true;
        self
    }

    /// Enable push notifications
    pub fn with_push_notifications(mut self) -> Self {
        self.capabilities.push_notifications = true;
        self
    }

    /// Enable long-running operations
    pub fn with_long_running_operations(mut self) -> Self {
        self.capabilities.long_running_operations = true;
        self
    }

    /// Whether the agent advertises the given skill
    pub fn has_skill(&self, skill_id: &str) -> bool {
        self.skills.iter().any(|s| s.id == skill_id)
    }

    /// Look up an advertised skill
    pub fn skill(&self, skill_id: &str) -> Option<&AgentSkill> {
        self.skills.iter().find(|s| s.id == skill_id)
    }

    /// Check that the card is usable for routing calls
    ///
    /// # Errors
    ///
    /// Returns [`A2aError::InvalidAgentCard`] when the id or name is blank,
    /// the endpoint is not an absolute URL, or skill ids are blank or repeated.
    pub fn validate(&self) -> A2aResult<()> {
        if self.id.trim().is_empty() {
            return Err(A2aError::invalid_agent_card(&self.endpoint, "id is empty"));
        }
        if self.name.trim().is_empty() {
            return Err(A2aError::invalid_agent_card(&self.endpoint, "name is empty"));
        }
        if let Err(e) = Url::parse(&self.endpoint) {
            return Err(A2aError::invalid_agent_card(
                &self.endpoint,
                format!("endpoint is not a valid URL: {e}"),
            ));
        }

        let mut seen = HashSet::new();
        for skill in &self.skills {
            if skill.id.trim().is_empty() {
                return Err(A2aError::invalid_agent_card(
                    &self.endpoint,
                    "skill id is empty",
                ));
            }
            if !seen.insert(skill.id.as_str()) {
                return Err(A2aError::invalid_agent_card(
                    &self.endpoint,
                    format!("duplicate skill id '{}'", skill.id),
                ));
            }
        }

        Ok(())
    }
}

/// Agent capabilities
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// Whether the agent supports `message/stream`
    #[serde(default)]
    pub streaming: bool,

    /// Whether the agent supports push notifications
    #[serde(default)]
    pub push_notifications: bool,

    /// Whether the agent runs long-running operations
    #[serde(default)]
    pub long_running_operations: bool,
}

/// A skill that the agent can perform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    /// Unique identifier for the skill
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Description of what the skill does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Accepted input kinds (MIME types or free-form labels)
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Produced output kinds
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl AgentSkill {
    /// Create a new skill
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare an accepted input kind
    pub fn with_input(mut self, kind: impl Into<String>) -> Self {
        self.inputs.push(kind.into());
        self
    }

    /// Declare a produced output kind
    pub fn with_output(mut self, kind: impl Into<String>) -> Self {
        self.outputs.push(kind.into());
        self
    }
}

/// Security scheme for authentication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    /// Shared secret sent as an API key
    #[serde(rename = "apiKey")]
    ApiKey {
        /// Name of the header or query parameter
        name: String,
        /// Where the key is sent
        #[serde(rename = "in")]
        location: ApiKeyLocation,
    },

    /// HTTP authentication (bearer)
    #[serde(rename = "http")]
    Http {
        /// Authentication scheme, e.g. `bearer`
        scheme: String,
    },
}

impl SecurityScheme {
    /// API key sent in the named header
    pub fn api_key_header(name: impl Into<String>) -> Self {
        SecurityScheme::ApiKey {
            name: name.into(),
            location: ApiKeyLocation::Header,
        }
    }

    /// Bearer token in the `Authorization` header
    pub fn bearer() -> Self {
        SecurityScheme::Http {
            scheme: "bearer".to_string(),
        }
    }
}

/// Location of API key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
}
