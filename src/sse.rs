//! Server-Sent Events (SSE) processing for streaming chat completions.
//!
//! The inference router streams `data: {json}` events separated by blank
//! lines and terminates with `data: [DONE]`.  This module turns the raw byte
//! stream into a stream of [`ChatCompletionChunk`]s.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::{STREAM_BYTES, STREAM_CHUNKS, STREAM_ERRORS};
use crate::{ChatCompletionChunk, Error, Result};

/// Marker payload that ends a stream.
const DONE_MARKER: &str = "[DONE]";

/// A decoded SSE event.
#[derive(Debug)]
enum SseEvent {
    Chunk(ChatCompletionChunk),
    Done,
    Skip,
}

struct SseState<S> {
    stream: S,
    buffer: Vec<u8>,
    eof: bool,
    // Set once anything has been yielded.
    seen: bool,
}

/// Process a stream of bytes into a stream of chat-completion chunks.
///
/// Events may be split across reads and reads may split multi-byte
/// characters; bytes are buffered until a full event is available.  A
/// transport error is yielded once and ends the stream, as does a body that
/// ends without producing a single event.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    let state = SseState {
        stream: byte_stream,
        buffer: Vec::new(),
        eof: false,
        seen: false,
    };

    stream::unfold(state, move |mut state| async move {
        loop {
            // First check if we have a complete event in the buffer
            if let Some(event) = extract_event(&mut state.buffer) {
                match event {
                    Ok(SseEvent::Chunk(chunk)) => {
                        STREAM_CHUNKS.click();
                        state.seen = true;
                        return Some((Ok(chunk), state));
                    }
                    Ok(SseEvent::Skip) => continue,
                    Ok(SseEvent::Done) => return None,
                    Err(e) => {
                        STREAM_ERRORS.click();
                        state.seen = true;
                        return Some((Err(e), state));
                    }
                }
            }
            if state.eof {
                if state.seen {
                    return None;
                }
                STREAM_ERRORS.click();
                state.seen = true;
                return Some((
                    Err(Error::streaming(
                        "response contained no server-sent events",
                        None,
                    )),
                    state,
                ));
            }

            // Read more data
            match state.stream.next().await {
                Some(Ok(bytes)) => {
                    STREAM_BYTES.count(bytes.len() as u64);
                    // CR only ever terminates lines in SSE; dropping it lets
                    // `\r\n\r\n` and `\n\n` share one delimiter.
                    state
                        .buffer
                        .extend(bytes.iter().copied().filter(|b| *b != b'\r'));
                }
                Some(Err(e)) => {
                    STREAM_ERRORS.click();
                    state.eof = true;
                    state.seen = true;
                    state.buffer.clear();
                    return Some((
                        Err(Error::streaming(
                            format!("Error in HTTP stream: {e}"),
                            Some(Box::new(e)),
                        )),
                        state,
                    ));
                }
                None => {
                    // End of stream; flush a final event that lacks its blank line.
                    if !state.buffer.iter().all(u8::is_ascii_whitespace) {
                        state.buffer.extend_from_slice(b"\n\n");
                    }
                    state.eof = true;
                }
            }
        }
    })
}

/// Removes one complete event from the front of `buffer` and decodes it.
fn extract_event(buffer: &mut Vec<u8>) -> Option<Result<SseEvent>> {
    let end = buffer.windows(2).position(|w| w == b"\n\n")?;
    let event: Vec<u8> = buffer.drain(..end + 2).collect();
    Some(parse_event(&event[..end]))
}

fn parse_event(event: &[u8]) -> Result<SseEvent> {
    let text = std::str::from_utf8(event)?;

    let mut data: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }
    if data.is_empty() {
        return bare_error(text).map_or(Ok(SseEvent::Skip), Err);
    }

    let data = data.join("\n");
    if data.trim() == DONE_MARKER {
        return Ok(SseEvent::Done);
    }
    parse_data(&data)
}

fn parse_data(data: &str) -> Result<SseEvent> {
    let value: serde_json::Value = serde_json::from_str(data).map_err(|e| {
        Error::serialization(
            format!("Failed to parse event JSON: {e}"),
            Some(Box::new(e)),
        )
    })?;

    if let Some((error_type, message)) = error_details(&value) {
        let error_type = error_type.unwrap_or_else(|| "stream_error".to_string());
        return Err(Error::api(500, Some(error_type), message, None));
    }

    serde_json::from_value::<ChatCompletionChunk>(value)
        .map(SseEvent::Chunk)
        .map_err(|e| {
            Error::serialization(
                format!("Failed to parse chunk: {e}"),
                Some(Box::new(e)),
            )
        })
}

/// Recognizes an error object sent as a plain JSON body instead of an event.
fn bare_error(text: &str) -> Option<Error> {
    let value: serde_json::Value = serde_json::from_str(text.trim()).ok()?;
    let (error_type, message) = error_details(&value)?;
    let error_type = error_type.unwrap_or_else(|| "stream_error".to_string());
    Some(Error::api(500, Some(error_type), message, None))
}

/// Extracts `(error_type, message)` from an error payload.
///
/// The router reports errors either as `{"error": "...", "error_type": "..."}`
/// or in the OpenAI shape `{"error": {"message": "...", "type": "..."}}`.
pub(crate) fn error_details(value: &serde_json::Value) -> Option<(Option<String>, String)> {
    let error = value.get("error")?;
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(String::from)
        .unwrap_or_else(|| error.to_string());
    let error_type = value
        .get("error_type")
        .or_else(|| error.get("type"))
        .and_then(|t| t.as_str())
        .map(String::from);
    Some((error_type, message))
}
