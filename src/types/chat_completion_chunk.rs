use serde::{Deserialize, Serialize};

/// One streamed chunk of a chat completion.
///
/// Only the fields the relay reads are modelled; everything else the service
/// sends is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    /// Identifier shared by all chunks of one completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Model that produced the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Incremental choices; usually exactly one.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,

    /// Token usage, typically only on the final chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ChunkUsage>,
}

/// A choice inside a streamed chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkChoice {
    /// Index of the choice.
    #[serde(default)]
    pub index: u32,

    /// New content for this choice.
    #[serde(default)]
    pub delta: ChunkDelta,

    /// Why generation stopped, on the last chunk of the choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// The incremental part of a choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkDelta {
    /// Role, sent on the first chunk only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Text fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Token accounting reported by the service.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkUsage {
    /// Tokens in the request.
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens generated so far.
    #[serde(default)]
    pub completion_tokens: u32,

    /// Sum of the two.
    #[serde(default)]
    pub total_tokens: u32,
}

impl ChatCompletionChunk {
    /// Create a chunk carrying a single text delta.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![ChunkChoice {
                delta: ChunkDelta {
                    content: Some(text.into()),
                    ..ChunkDelta::default()
                },
                ..ChunkChoice::default()
            }],
            ..Self::default()
        }
    }

    /// Returns the text of the first choice, if it carries any.
    ///
    /// Role-only deltas, empty strings, and chunks without choices yield
    /// `None`.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|text| !text.is_empty())
    }
}
