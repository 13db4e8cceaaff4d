//! Interactive chat screens.
//!
//! This module provides the pieces of the terminal client built on top of the
//! hfchat library:
//!
//! - A selection screen that fixes the user's gender for the session
//! - Streaming replies rendered fragment by fragment
//! - Slash commands for inspecting the session
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: Slash command parsing and handling
//! - [`stream_reply`]: drives one turn from prompt to rendered reply

mod commands;
mod config;

use std::time::Duration;

use futures::StreamExt;

use crate::client::ChatCompletion;
use crate::render::Renderer;
use crate::session::Session;
use crate::types::Gender;

pub use crate::render::PlainTextRenderer;
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};

/// Title of the selection screen.
pub const WELCOME_TITLE: &str = "Welcome to DeepSeek Chat!";

/// Key of the single session driven by the terminal client.
pub const SESSION_KEY: &str = "local";

/// How often a pending reply checks for an interrupt.
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

/// Title of the chat screen for `gender`.
pub fn chat_title(gender: Gender) -> String {
    format!("DeepSeek Chat ({})", gender.title())
}

/// How a turn ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The full reply was shown and stored.
    Completed,
    /// The turn failed; an error fragment was shown and nothing was stored.
    Failed,
    /// The user stopped the reply; nothing was stored.
    Interrupted,
}

/// Relays `prompt` through `session`, rendering fragments as they arrive.
///
/// The turn is abandoned as soon as the renderer reports an interrupt, which
/// leaves the history as it was before the turn.
pub async fn stream_reply<C, R>(
    session: &mut Session<C>,
    prompt: &str,
    renderer: &mut R,
) -> TurnOutcome
where
    C: ChatCompletion + ?Sized + 'static,
    R: Renderer + ?Sized,
{
    renderer.start_response();
    let mut relay = session.relay(prompt);
    let mut outcome = TurnOutcome::Completed;
    loop {
        let next = tokio::select! {
            fragment = relay.next() => Some(fragment),
            _ = wait_for_interrupt(&*renderer) => None,
        };
        let Some(fragment) = next else {
            drop(relay);
            renderer.print_interrupted();
            return TurnOutcome::Interrupted;
        };
        let Some(fragment) = fragment else {
            break;
        };
        if fragment.is_error() {
            outcome = TurnOutcome::Failed;
        }
        renderer.print_fragment(&fragment);
    }
    renderer.finish_response();
    outcome
}

async fn wait_for_interrupt<R: Renderer + ?Sized>(renderer: &R) {
    while !renderer.should_interrupt() {
        tokio::time::sleep(INTERRUPT_POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use super::*;
    use crate::relay::RelayOptions;
    use crate::testing::ScriptedService;
    use crate::types::ChatMessage;
    use crate::{ChatCompletionChunk, Error};

    fn session(service: ScriptedService) -> Session<ScriptedService> {
        let mut session = Session::new(Arc::new(service), RelayOptions::default());
        session.set_gender(Gender::Male).unwrap();
        session
    }

    fn renderer() -> PlainTextRenderer<Vec<u8>> {
        PlainTextRenderer::with_writer(Vec::new(), false)
    }

    #[test]
    fn titles() {
        assert_eq!(chat_title(Gender::Male), "DeepSeek Chat (Male)");
        assert_eq!(chat_title(Gender::Female), "DeepSeek Chat (Female)");
    }

    #[tokio::test]
    async fn completed_turn_is_rendered_and_stored() {
        let mut session = session(ScriptedService::replying(&["Hi", " there"]));
        let mut renderer = renderer();

        let outcome = stream_reply(&mut session, "Hello", &mut renderer).await;

        assert_eq!(outcome, TurnOutcome::Completed);
        assert_eq!(
            session.messages(),
            &[ChatMessage::user("Hello"), ChatMessage::assistant("Hi there")]
        );
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(text, "Assistant: Hi there\n");
    }

    #[tokio::test]
    async fn failed_turn_shows_error_only() {
        let mut session = session(ScriptedService::with_chunks(vec![
            Ok(ChatCompletionChunk::from_text("Hel")),
            Err(Error::connection("reset by peer", None)),
        ]));
        let mut renderer = renderer();

        let outcome = stream_reply(&mut session, "Hello", &mut renderer).await;

        assert_eq!(outcome, TurnOutcome::Failed);
        assert!(session.messages().is_empty());
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.ends_with("⚠️ Error: Connection error: reset by peer\n"));
    }

    #[tokio::test]
    async fn interrupt_abandons_pending_turn() {
        let (service, _release) = ScriptedService::gated(&["never", " shown"]);
        let mut session = session(service);
        let mut renderer = renderer().with_interrupt(Arc::new(AtomicBool::new(true)));

        let outcome = stream_reply(&mut session, "Hello", &mut renderer).await;

        assert_eq!(outcome, TurnOutcome::Interrupted);
        assert!(session.messages().is_empty());
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains("[interrupted]"));
        assert!(!text.contains("never"));
    }
}
