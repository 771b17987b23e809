//! # Gemini `generateContent` Data Primitives
//!
//! This module defines the request and response shapes exchanged with the
//! `generateContent` endpoint. Only the pieces an image edit needs are modelled:
//! contents made of text and inline-data parts going out, and candidates made of
//! the same parts coming back.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user
    User,
    /// Message from the model
    Model,
}

/// Content part that can be included in a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// Text content
    Text {
        /// The text content
        text: String,
        /// Whether this is a thought summary
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    /// Raw bytes with their media type
    InlineData {
        /// The blob data
        #[serde(rename = "inlineData")]
        inline_data: Blob,
        /// Set on draft images a thinking model emits before its answer
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    /// Any part shape this crate does not interpret (function calls, code execution, ...)
    Other(serde_json::Value),
}

impl Part {
    /// Create a plain text part
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            thought: None,
        }
    }

    /// Create an inline data part from base64 data
    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: Blob::new(mime_type, data),
            thought: None,
        }
    }

    /// Whether this part is marked as a thought rather than part of the answer
    pub fn is_thought(&self) -> bool {
        matches!(
            self,
            Part::Text {
                thought: Some(true),
                ..
            } | Part::InlineData {
                thought: Some(true),
                ..
            }
        )
    }

    /// Returns the blob if this part carries inline data
    pub fn as_inline_data(&self) -> Option<&Blob> {
        match self {
            Part::InlineData { inline_data, .. } => Some(inline_data),
            _ => None,
        }
    }
}

/// Blob for a message part
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// The MIME type of the data, empty when the service omitted it
    #[serde(default)]
    pub mime_type: String,
    /// Base64 encoded data
    pub data: String,
}

impl Blob {
    /// Create a new blob with mime type and data
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// Content of a message
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Parts of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
    /// Role of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Content {
    /// Create a content from a list of parts
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self {
            parts: Some(parts),
            role: None,
        }
    }

    /// Add a role to this content
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The conversation turns sent to the model
    pub contents: Vec<Content>,
}

/// Why the model stopped producing a candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    ProhibitedContent,
    ImageSafety,
    NoImage,
    #[serde(other)]
    Other,
}

/// A single response candidate
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The generated content
    #[serde(default)]
    pub content: Content,
    /// Why generation stopped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Position of the candidate in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
}

/// Feedback about the prompt, set when the prompt itself was blocked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

/// Response from `generateContent`
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// The candidates, possibly empty when the prompt was blocked
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl GenerationResponse {
    /// Concatenated text of the first candidate, excluding thought summaries
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.as_ref())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| match p {
                        Part::Text {
                            text,
                            thought: None | Some(false),
                        } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    /// The block reason reported for the prompt, if any
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}
