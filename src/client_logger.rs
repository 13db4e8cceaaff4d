//! Logging trait for inference client operations.
//!
//! This module provides the [`ClientLogger`] trait that captures every
//! request sent through the [`InferenceClient`](crate::InferenceClient), every
//! chunk decoded from a stream, and every failure, plus [`JsonlLogger`], which
//! appends them to a file as JSON lines.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use serde_json::json;

use crate::{ChatCompletionChunk, ChatCompletionRequest, Error, Result};

/// A trait for logging inference client operations.
///
/// Implementations must be cheap and must not fail; they are called inline
/// on the streaming path.
pub trait ClientLogger: Send + Sync {
    /// Log an outgoing chat-completion request.
    fn log_request(&self, request: &ChatCompletionRequest);

    /// Log one decoded streaming chunk.
    fn log_chunk(&self, chunk: &ChatCompletionChunk);

    /// Log a request or stream failure.
    fn log_error(&self, error: &Error);
}

/// A [`ClientLogger`] that writes one JSON object per line.
///
/// The API token never reaches the logger; requests are logged by body only.
pub struct JsonlLogger {
    writer: Mutex<BufWriter<File>>,
}

impl JsonlLogger {
    /// Opens `path` for appending, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .map_err(|err| Error::io("failed to open log file", err))?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn write_line(&self, value: serde_json::Value) {
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        // Logging must never interrupt a chat turn.
        let _ = writeln!(writer, "{value}");
        let _ = writer.flush();
    }
}

impl ClientLogger for JsonlLogger {
    fn log_request(&self, request: &ChatCompletionRequest) {
        self.write_line(json!({"kind": "request", "request": request}));
    }

    fn log_chunk(&self, chunk: &ChatCompletionChunk) {
        self.write_line(json!({"kind": "chunk", "chunk": chunk}));
    }

    fn log_error(&self, error: &Error) {
        self.write_line(json!({"kind": "error", "error": error.to_string()}));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatMessage;

    #[test]
    fn jsonl_logger_writes_lines() {
        let path = std::env::temp_dir().join(format!(
            "hfchat-client-logger-{}.jsonl",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let logger = JsonlLogger::open(&path).unwrap();
        logger.log_request(&ChatCompletionRequest::new(
            "test-model",
            vec![ChatMessage::user("Hello")],
            10,
        ));
        logger.log_chunk(&ChatCompletionChunk::from_text("Hi"));
        logger.log_error(&Error::connection("reset by peer", None));

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["kind"], "request");
        assert_eq!(lines[0]["request"]["model"], "test-model");
        assert_eq!(lines[1]["chunk"]["choices"][0]["delta"]["content"], "Hi");
        assert_eq!(lines[2]["error"], "Connection error: reset by peer");

        let _ = std::fs::remove_file(&path);
    }
}
