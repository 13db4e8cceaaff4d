//! Streaming response relay.
//!
//! A [`RelayStream`] carries one chat turn: it sends the conversation to the
//! inference service, forwards each text fragment as it arrives, and on
//! success commits the prompt and the full reply to the session history.
//!
//! ```text
//! Idle -> Requesting -> Streaming -> Completed
//!             |             |
//!             +-------------+-----> Failed
//! ```
//!
//! A failed turn yields exactly one [`Fragment::Error`] and leaves the
//! history untouched.  Dropping the stream before it terminates abandons the
//! request and likewise commits nothing.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::future::BoxFuture;
use futures::stream::{FusedStream, Stream};

use crate::client::ChunkStream;
use crate::error::{Error, Result};
use crate::observability::{
    RELAY_DURATION, RELAY_FAILURES, RELAY_FRAGMENTS, RELAY_TTFB, RELAY_TURNS,
};
use crate::types::ChatMessage;

/// Model requested when none is configured.
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-R1-0528";

/// Token budget per reply when none is configured.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Request parameters shared by every turn of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOptions {
    /// Model identifier sent with each request.
    pub model: String,
    /// Upper bound on generated tokens per reply.
    pub max_tokens: u32,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Observable state of a [`RelayStream`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RelayState {
    /// Created but not yet polled; no request has been sent.
    Idle,
    /// Waiting for the service to accept the request.
    Requesting,
    /// Receiving fragments.
    Streaming,
    /// The reply finished and was committed to history.
    Completed,
    /// The turn failed; history is unchanged.
    Failed,
}

impl RelayState {
    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RelayState::Completed | RelayState::Failed)
    }
}

/// A piece of output produced by a relay.
#[derive(Debug, Clone)]
pub enum Fragment {
    /// Incremental reply text.
    Text(String),
    /// The single marker yielded when a turn fails.
    Error(Error),
}

impl Fragment {
    /// Returns the reply text, or `None` for the error marker.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Fragment::Text(text) => Some(text),
            Fragment::Error(_) => None,
        }
    }

    /// Returns true for the error marker.
    pub fn is_error(&self) -> bool {
        matches!(self, Fragment::Error(_))
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Text(text) => write!(f, "{text}"),
            Fragment::Error(err) => write!(f, "⚠️ Error: {err}"),
        }
    }
}

enum Phase {
    Idle(BoxFuture<'static, Result<ChunkStream>>),
    Requesting(BoxFuture<'static, Result<ChunkStream>>),
    Streaming(ChunkStream),
    Completed,
    Failed,
}

/// The fragment stream of one chat turn.
///
/// Created by [`Session::relay`](crate::Session::relay).  The stream holds the
/// session's history mutably, so a session never has two turns in flight.
/// It is lazy (nothing is sent until the first poll), finite, and cannot be
/// restarted.
pub struct RelayStream<'a> {
    phase: Phase,
    prompt: String,
    accumulated: String,
    history: &'a mut Vec<ChatMessage>,
    started: Option<Instant>,
    fragments: u64,
}

impl<'a> RelayStream<'a> {
    pub(crate) fn new(
        request: BoxFuture<'static, Result<ChunkStream>>,
        prompt: String,
        history: &'a mut Vec<ChatMessage>,
    ) -> Self {
        Self {
            phase: Phase::Idle(request),
            prompt,
            accumulated: String::new(),
            history,
            started: None,
            fragments: 0,
        }
    }

    /// The current state of the turn.
    pub fn state(&self) -> RelayState {
        match self.phase {
            Phase::Idle(_) => RelayState::Idle,
            Phase::Requesting(_) => RelayState::Requesting,
            Phase::Streaming(_) => RelayState::Streaming,
            Phase::Completed => RelayState::Completed,
            Phase::Failed => RelayState::Failed,
        }
    }

    /// The prompt this turn answers.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The reply text yielded so far.
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    fn emit(&mut self, text: String) -> Fragment {
        if self.fragments == 0
            && let Some(started) = self.started
        {
            RELAY_TTFB.add(started.elapsed().as_secs_f64());
        }
        self.fragments += 1;
        RELAY_FRAGMENTS.click();
        self.accumulated.push_str(&text);
        Fragment::Text(text)
    }

    fn fail(&mut self, err: Error) -> Fragment {
        RELAY_FAILURES.click();
        self.record_duration();
        self.phase = Phase::Failed;
        Fragment::Error(err)
    }

    fn complete(&mut self) {
        self.record_duration();
        self.history.push(ChatMessage::user(self.prompt.clone()));
        self.history.push(ChatMessage::assistant(self.accumulated.clone()));
        self.phase = Phase::Completed;
    }

    fn record_duration(&self) {
        if let Some(started) = self.started {
            RELAY_DURATION.add(started.elapsed().as_secs_f64());
        }
    }
}

impl Stream for RelayStream<'_> {
    type Item = Fragment;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Fragment>> {
        let this = self.get_mut();
        loop {
            match &mut this.phase {
                Phase::Idle(_) => {
                    if let Phase::Idle(request) =
                        std::mem::replace(&mut this.phase, Phase::Failed)
                    {
                        this.phase = Phase::Requesting(request);
                    }
                    this.started = Some(Instant::now());
                    RELAY_TURNS.click();
                }
                Phase::Requesting(request) => match request.as_mut().poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Ok(chunks)) => this.phase = Phase::Streaming(chunks),
                    Poll::Ready(Err(err)) => return Poll::Ready(Some(this.fail(err))),
                },
                Phase::Streaming(chunks) => match chunks.as_mut().poll_next(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Some(Ok(chunk))) => {
                        if let Some(text) = chunk.text() {
                            let text = text.to_string();
                            return Poll::Ready(Some(this.emit(text)));
                        }
                    }
                    Poll::Ready(Some(Err(err))) => return Poll::Ready(Some(this.fail(err))),
                    Poll::Ready(None) => {
                        this.complete();
                        return Poll::Ready(None);
                    }
                },
                Phase::Completed | Phase::Failed => return Poll::Ready(None),
            }
        }
    }
}

impl FusedStream for RelayStream<'_> {
    fn is_terminated(&self) -> bool {
        self.state().is_terminal()
    }
}

impl fmt::Debug for RelayStream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayStream")
            .field("state", &self.state())
            .field("prompt", &self.prompt)
            .field("accumulated", &self.accumulated)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use futures::StreamExt;
    use tokio_test::{assert_pending, assert_ready};

    use crate::testing::ScriptedService;
    use crate::types::Role;
    use crate::{ChatCompletionChunk, Gender, Session};

    fn session(service: ScriptedService) -> Session<ScriptedService> {
        let mut session = Session::new(Arc::new(service), RelayOptions::default());
        session.set_gender(Gender::Male).unwrap();
        session
    }

    #[tokio::test]
    async fn fragments_concatenate_to_stored_reply() {
        let mut session = session(ScriptedService::replying(&["Hi", " there"]));

        let fragments: Vec<Fragment> = session.relay("Hello").collect().await;
        let rendered: String = fragments.iter().map(|f| f.to_string()).collect();
        assert_eq!(rendered, "Hi there");
        assert!(fragments.iter().all(|f| !f.is_error()));

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::user("Hello"));
        assert_eq!(messages[1], ChatMessage::assistant("Hi there"));
    }

    #[tokio::test]
    async fn request_failure_yields_one_error() {
        let mut session = session(ScriptedService::failing(Error::authentication(
            "Invalid credentials",
        )));

        let fragments: Vec<Fragment> = session.relay("Hello").collect().await;
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].is_error());
        assert_eq!(
            fragments[0].to_string(),
            "⚠️ Error: Authentication error: Invalid credentials"
        );
        assert_eq!(session.message_count(), 0);
    }

    #[tokio::test]
    async fn mid_stream_failure_discards_partial_reply() {
        let mut session = session(ScriptedService::with_chunks(vec![
            Ok(ChatCompletionChunk::from_text("Hi")),
            Err(Error::connection("connection reset", None)),
            Ok(ChatCompletionChunk::from_text(" never seen")),
        ]));

        let mut relay = session.relay("Hello");
        let first = relay.next().await.unwrap();
        assert_eq!(first.as_text(), Some("Hi"));
        assert_eq!(relay.state(), RelayState::Streaming);

        let second = relay.next().await.unwrap();
        assert!(second.is_error());
        assert_eq!(relay.state(), RelayState::Failed);
        assert_eq!(relay.accumulated(), "Hi");

        assert!(relay.next().await.is_none());
        assert!(relay.is_terminated());
        drop(relay);

        assert_eq!(session.message_count(), 0);
    }

    #[tokio::test]
    async fn chunks_without_text_are_skipped() {
        let mut role_only = ChatCompletionChunk::from_text("");
        role_only.choices[0].delta.role = Some("assistant".to_string());
        let mut session = session(ScriptedService::with_chunks(vec![
            Ok(role_only),
            Ok(ChatCompletionChunk::default()),
            Ok(ChatCompletionChunk::from_text("ok")),
        ]));

        let fragments: Vec<Fragment> = session.relay("ping").collect().await;
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].as_text(), Some("ok"));
        assert_eq!(session.messages()[1].content(), "ok");
    }

    #[tokio::test]
    async fn empty_reply_completes() {
        let mut session = session(ScriptedService::replying(&[]));

        let mut relay = session.relay("Hello");
        assert!(relay.next().await.is_none());
        assert_eq!(relay.state(), RelayState::Completed);
        drop(relay);

        assert_eq!(session.message_count(), 2);
        assert_eq!(session.messages()[1].content(), "");
    }

    #[tokio::test]
    async fn relay_is_lazy_and_tracks_state() {
        let service = ScriptedService::replying(&["a"]);
        let requests = service.requests();
        let mut session = session(service);

        let mut relay = session.relay("Hello");
        assert_eq!(relay.state(), RelayState::Idle);
        assert_eq!(relay.prompt(), "Hello");
        assert!(requests.lock().unwrap().is_empty());

        assert_eq!(relay.next().await.unwrap().as_text(), Some("a"));
        assert_eq!(relay.state(), RelayState::Streaming);
        assert_eq!(requests.lock().unwrap().len(), 1);

        assert!(relay.next().await.is_none());
        assert_eq!(relay.state(), RelayState::Completed);
        assert!(relay.next().await.is_none());
    }

    #[tokio::test]
    async fn pending_request_keeps_requesting_state() {
        let (service, release) = ScriptedService::gated(&["late"]);
        let mut session = session(service);

        let mut relay = tokio_test::task::spawn(session.relay("Hello"));
        assert_pending!(relay.poll_next());
        assert_eq!(relay.state(), RelayState::Requesting);

        release.send(()).unwrap();
        assert!(relay.is_woken());
        let fragment = assert_ready!(relay.poll_next());
        assert_eq!(fragment.unwrap().as_text(), Some("late"));
    }

    #[tokio::test]
    async fn dropped_relay_commits_nothing() {
        let mut session = session(ScriptedService::replying(&["Hi", " there"]));

        let mut relay = session.relay("Hello");
        assert_eq!(relay.next().await.unwrap().as_text(), Some("Hi"));
        drop(relay);

        assert_eq!(session.message_count(), 0);
    }

    #[tokio::test]
    async fn request_carries_system_history_and_prompt() {
        let service = ScriptedService::replying(&["first"]);
        service.push_reply(&["second"]);
        let requests = service.requests();
        let mut session = session(service);

        let _: Vec<Fragment> = session.relay("one").collect().await;
        let _: Vec<Fragment> = session.relay("two").collect().await;

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let second = &requests[1];
        assert_eq!(second.model, DEFAULT_MODEL);
        assert_eq!(second.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(second.stream);
        let roles: Vec<Role> = second.messages.iter().map(|m| m.role()).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(
            second.messages[0].content(),
            "Assistant talking to male user"
        );
        assert_eq!(second.messages[3].content(), "two");
    }

    #[test]
    fn fragment_display() {
        assert_eq!(Fragment::Text("Hi".to_string()).to_string(), "Hi");
        let marker = Fragment::Error(Error::timeout("Request timed out", None));
        assert_eq!(
            marker.to_string(),
            "⚠️ Error: Timeout error: Request timed out"
        );
        assert_eq!(marker.as_text(), None);
    }
}
