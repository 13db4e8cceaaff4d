// Public modules
pub mod assets;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod relay;
pub mod render;
pub mod secrets;
pub mod session;
pub mod sse;
pub mod types;

#[cfg(test)]
mod testing;

// Re-exports
pub use assets::{Animation, AnimationSet};
pub use client::{ChatCompletion, ChunkStream, InferenceClient};
pub use client_logger::{ClientLogger, JsonlLogger};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use relay::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, Fragment, RelayOptions, RelayState, RelayStream};
pub use render::{PlainTextRenderer, Renderer};
pub use session::{Session, SessionStats, SessionStore};
pub use types::*;
