//! Per-user session state.
//!
//! A [`Session`] holds the selected gender, the conversation history, and a
//! shared handle to the inference service.  A [`SessionStore`] owns the
//! sessions of every connected user and creates them on first interaction.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::ChatCompletion;
use crate::error::{Error, Result};
use crate::relay::{RelayOptions, RelayStream};
use crate::types::{ChatCompletionRequest, ChatMessage, Gender, Role};

/// State for one user's interactive run.
///
/// The gender moves from unset to a fixed value at most once, and the history
/// only ever grows.
pub struct Session<C: ChatCompletion + ?Sized + 'static> {
    gender: Option<Gender>,
    messages: Vec<ChatMessage>,
    client: Arc<C>,
    options: RelayOptions,
}

/// Snapshot of a session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The selected gender, if any.
    pub gender: Option<Gender>,
    /// The number of messages in the history.
    pub message_count: usize,
    /// The model used for replies.
    pub model: String,
    /// The maximum tokens per reply.
    pub max_tokens: u32,
}

impl<C: ChatCompletion + ?Sized + 'static> Session<C> {
    /// Creates an empty session.
    pub fn new(client: Arc<C>, options: RelayOptions) -> Self {
        Self {
            gender: None,
            messages: Vec::new(),
            client,
            options,
        }
    }

    /// The selected gender, or `None` while the selection screen is showing.
    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    /// Returns true once a gender has been selected.
    pub fn is_chatting(&self) -> bool {
        self.gender.is_some()
    }

    /// Selects the gender for this session.
    ///
    /// Selecting the already-selected gender again is a no-op.  Selecting a
    /// different one is rejected and leaves the session unchanged.
    pub fn set_gender(&mut self, gender: Gender) -> Result<()> {
        match self.gender {
            None => {
                self.gender = Some(gender);
                Ok(())
            }
            Some(current) if current == gender => Ok(()),
            Some(current) => Err(Error::validation(
                format!("gender already selected as {current}"),
                Some("gender".to_string()),
            )),
        }
    }

    /// Appends a message to the history.
    pub fn append_message(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
    }

    /// The conversation so far, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// The request parameters used for each turn.
    pub fn options(&self) -> &RelayOptions {
        &self.options
    }

    /// The system message that frames every request.
    pub fn system_prompt(&self) -> String {
        let gender = self.gender.map(|g| g.as_str()).unwrap_or("unknown");
        format!("Assistant talking to {gender} user")
    }

    /// Builds the request for `prompt`: the system message, the history, then
    /// the prompt as a user message.
    pub fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(self.messages.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt()));
        messages.extend(self.messages.iter().cloned());
        messages.push(ChatMessage::user(prompt));
        ChatCompletionRequest::new(&self.options.model, messages, self.options.max_tokens)
    }

    /// Starts a turn that answers `prompt`.
    ///
    /// Nothing is sent until the returned stream is polled.  See
    /// [`RelayStream`] for how the history is updated.
    pub fn relay(&mut self, prompt: impl Into<String>) -> RelayStream<'_> {
        let prompt = prompt.into();
        let request = self.build_request(&prompt);
        let client = Arc::clone(&self.client);
        let pending = Box::pin(async move { client.stream_chat(request).await });
        RelayStream::new(pending, prompt, &mut self.messages)
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            gender: self.gender,
            message_count: self.message_count(),
            model: self.options.model.clone(),
            max_tokens: self.options.max_tokens,
        }
    }
}

/// Owns the sessions of all connected users.
///
/// Every session shares the same read-only client handle.
pub struct SessionStore<C: ChatCompletion + ?Sized + 'static> {
    client: Arc<C>,
    options: RelayOptions,
    sessions: HashMap<String, Session<C>>,
}

impl<C: ChatCompletion + ?Sized + 'static> SessionStore<C> {
    /// Creates an empty store.
    pub fn new(client: Arc<C>, options: RelayOptions) -> Self {
        Self {
            client,
            options,
            sessions: HashMap::new(),
        }
    }

    /// Returns the session for `key`, creating an empty one if none exists.
    ///
    /// Calling this again for the same key returns the existing session
    /// untouched.
    pub fn initialize(&mut self, key: &str) -> &mut Session<C> {
        let client = &self.client;
        let options = &self.options;
        self.sessions
            .entry(key.to_string())
            .or_insert_with(|| Session::new(Arc::clone(client), options.clone()))
    }

    /// Returns the session for `key`, if it exists.
    pub fn get(&self, key: &str) -> Option<&Session<C>> {
        self.sessions.get(key)
    }

    /// Returns the session for `key` for mutation, if it exists.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Session<C>> {
        self.sessions.get_mut(key)
    }

    /// Discards the session for `key`, returning it.
    pub fn end(&mut self, key: &str) -> Option<Session<C>> {
        self.sessions.remove(key)
    }

    /// Returns the number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
