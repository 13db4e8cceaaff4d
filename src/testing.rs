//! Scripted inference service for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::stream;
use tokio::sync::oneshot;

use crate::client::{ChatCompletion, ChunkStream};
use crate::{ChatCompletionChunk, ChatCompletionRequest, Error, Result};

enum Script {
    Chunks(Vec<Result<ChatCompletionChunk>>),
    Fail(Error),
}

/// Answers each request with the next scripted reply and records requests.
pub(crate) struct ScriptedService {
    scripts: Mutex<VecDeque<Script>>,
    requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ScriptedService {
    fn new(script: Script) -> Self {
        Self {
            scripts: Mutex::new(VecDeque::from([script])),
            requests: Arc::new(Mutex::new(Vec::new())),
            gate: Mutex::new(None),
        }
    }

    fn text_chunks(fragments: &[&str]) -> Vec<Result<ChatCompletionChunk>> {
        fragments
            .iter()
            .map(|text| Ok(ChatCompletionChunk::from_text(*text)))
            .collect()
    }

    pub(crate) fn replying(fragments: &[&str]) -> Self {
        Self::new(Script::Chunks(Self::text_chunks(fragments)))
    }

    pub(crate) fn with_chunks(chunks: Vec<Result<ChatCompletionChunk>>) -> Self {
        Self::new(Script::Chunks(chunks))
    }

    pub(crate) fn failing(error: Error) -> Self {
        Self::new(Script::Fail(error))
    }

    /// A service whose first request blocks until the returned sender fires.
    pub(crate) fn gated(fragments: &[&str]) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let service = Self::replying(fragments);
        *service.gate.lock().unwrap() = Some(rx);
        (service, tx)
    }

    pub(crate) fn push_reply(&self, fragments: &[&str]) {
        self.scripts
            .lock()
            .unwrap()
            .push_back(Script::Chunks(Self::text_chunks(fragments)));
    }

    pub(crate) fn requests(&self) -> Arc<Mutex<Vec<ChatCompletionRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait::async_trait]
impl ChatCompletion for ScriptedService {
    async fn stream_chat(&self, request: ChatCompletionRequest) -> Result<ChunkStream> {
        self.requests.lock().unwrap().push(request);
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Chunks(Vec::new()));
        match script {
            Script::Chunks(chunks) => Ok(Box::pin(stream::iter(chunks))),
            Script::Fail(error) => Err(error),
        }
    }
}
