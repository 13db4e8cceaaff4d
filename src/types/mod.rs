// Public modules
pub mod chat_completion_chunk;
pub mod chat_completion_request;
pub mod chat_message;
pub mod gender;

// Re-exports
pub use chat_completion_chunk::{ChatCompletionChunk, ChunkChoice, ChunkDelta, ChunkUsage};
pub use chat_completion_request::ChatCompletionRequest;
pub use chat_message::{ChatMessage, Role};
pub use gender::{Gender, GenderParseError};
