use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

/// Body of a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// Model identifier, e.g. `deepseek-ai/DeepSeek-R1-0528`.
    pub model: String,

    /// Ordered conversation, system message first.
    pub messages: Vec<ChatMessage>,

    /// Whether the response is streamed as server-sent events.
    pub stream: bool,

    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl ChatCompletionRequest {
    /// Create a new streaming request.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
            max_tokens,
        }
    }
}
