//! Content part types for the A2A protocol.

use serde::{Deserialize, Serialize};

/// Media type used for structured extension data attached to a message
pub const JSON_MIME_TYPE: &str = "application/json";

/// A content part within a message or artifact
///
/// Parts form a closed set: free text or structured data tagged with a
/// MIME type. On the wire the variant is carried in the `kind` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Part {
    /// Text content
    #[serde(rename = "text")]
    Text(TextPart),

    /// Structured data
    #[serde(rename = "data")]
    Data(DataPart),
}

impl Part {
    /// Create a text part
    pub fn text(content: impl Into<String>) -> Self {
        Part::Text(TextPart {
            text: content.into(),
        })
    }

    /// Create a data part
    pub fn data(data: serde_json::Value, mime_type: impl Into<String>) -> Self {
        Part::Data(DataPart {
            mime_type: mime_type.into(),
            data,
        })
    }

    /// Create a JSON data part
    pub fn json(data: serde_json::Value) -> Self {
        Self::data(data, JSON_MIME_TYPE)
    }

    /// Get the text content if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(t) => Some(&t.text),
            Part::Data(_) => None,
        }
    }

    /// Get the structured payload if this is a data part
    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Part::Data(d) => Some(&d.data),
            Part::Text(_) => None,
        }
    }
}

/// Text content part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPart {
    /// The text content
    pub text: String,
}

/// Structured data part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPart {
    /// MIME type of the data (e.g., "application/json")
    pub mime_type: String,

    /// The structured data
    pub data: serde_json::Value,
}

/// Join the text parts of a sequence, in order, separated by newlines
pub(crate) fn joined_text<'a>(parts: impl IntoIterator<Item = &'a Part>) -> String {
    parts
        .into_iter()
        .filter_map(Part::as_text)
        .collect::<Vec<_>>()
        .join("\n")
}
