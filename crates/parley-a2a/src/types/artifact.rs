//! Artifact types for the A2A protocol.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Part;
use super::part::joined_text;

/// A result unit returned from a call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Identifier for the artifact
    pub id: String,

    /// Content parts of the artifact
    pub parts: Vec<Part>,
}

impl Artifact {
    /// Create a new artifact with the given ID
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parts: Vec::new(),
        }
    }

    /// Create a new artifact with a generated UUID
    pub fn new_with_uuid() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Create a text artifact
    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(id).with_part(Part::text(content))
    }

    /// Create a JSON artifact
    pub fn json(id: impl Into<String>, data: serde_json::Value) -> Self {
        Self::new(id).with_part(Part::json(data))
    }

    /// Add a part to the artifact
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// All text parts joined with newlines
    pub fn text_content(&self) -> String {
        joined_text(&self.parts)
    }
}

/// Text of every artifact, in order, separated by blank lines
pub fn artifacts_text(artifacts: &[Artifact]) -> String {
    artifacts
        .iter()
        .map(Artifact::text_content)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
