//! Output rendering for the chat screens.
//!
//! This module provides the renderer trait used by the interactive client and
//! a plain-text implementation with optional ANSI styling.

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::assets::Animation;
use crate::relay::Fragment;
use crate::types::{ChatMessage, Gender, Role};

/// ANSI escape code for bold text (used for titles).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for animation details).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user's role label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the assistant's role label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Print a screen title.
    fn print_title(&mut self, title: &str);

    /// Print the selection card for `gender` with its animation.
    fn print_animation(&mut self, gender: Gender, animation: &Animation);

    /// Print a message from the history.
    fn print_message(&mut self, message: &ChatMessage);

    /// Called before the first fragment of a reply.
    fn start_response(&mut self);

    /// Print one fragment of a streamed reply.
    ///
    /// This is called incrementally as fragments arrive.
    fn print_fragment(&mut self, fragment: &Fragment);

    /// Called when a reply is complete.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_response(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when the reply is interrupted by the user.
    fn print_interrupted(&mut self) {}

    /// Returns true if streaming should be interrupted.
    fn should_interrupt(&self) -> bool {
        false
    }
}

/// Plain text renderer with optional ANSI styling.
///
/// Writes to stdout unless constructed with [`PlainTextRenderer::with_writer`].
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    line_start: bool,
    interrupted: Option<Arc<AtomicBool>>,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer that writes to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            line_start: true,
            interrupted: None,
        }
    }

    /// Attaches an interrupt flag to the renderer.
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(interrupted);
        self
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
        self.line_start = text.ends_with('\n');
    }

    fn end_line(&mut self) {
        if !self.line_start {
            self.write("\n");
        }
    }

    fn role_label(&self, role: Role) -> String {
        match role {
            Role::System => self.styled(ANSI_DIM, "System:"),
            Role::User => self.styled(ANSI_CYAN, "You:"),
            Role::Assistant => self.styled(ANSI_GREEN, "Assistant:"),
        }
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_title(&mut self, title: &str) {
        self.end_line();
        let title = self.styled(ANSI_BOLD, title);
        self.write(&format!("{title}\n\n"));
    }

    fn print_animation(&mut self, gender: Gender, animation: &Animation) {
        let index = Gender::ALL
            .iter()
            .position(|g| *g == gender)
            .map(|i| i + 1)
            .unwrap_or(0);
        let details = self.styled(ANSI_DIM, &format!("({})", animation.summary()));
        self.write(&format!("  [{index}] {} {details}\n", gender.title()));
    }

    fn print_message(&mut self, message: &ChatMessage) {
        self.end_line();
        let label = self.role_label(message.role());
        self.write(&format!("{label} {}\n", message.content()));
    }

    fn start_response(&mut self) {
        self.end_line();
        let label = self.role_label(Role::Assistant);
        self.write(&format!("{label} "));
    }

    fn print_fragment(&mut self, fragment: &Fragment) {
        match fragment {
            Fragment::Text(text) => self.write(text),
            Fragment::Error(_) => {
                self.end_line();
                let rendered = self.styled(ANSI_RED, &fragment.to_string());
                self.write(&format!("{rendered}\n"));
            }
        }
    }

    fn finish_response(&mut self) {
        self.end_line();
    }

    fn print_error(&mut self, error: &str) {
        self.end_line();
        let rendered = self.styled(ANSI_RED, &format!("Error: {error}"));
        self.write(&format!("{rendered}\n"));
    }

    fn print_info(&mut self, info: &str) {
        self.end_line();
        self.write(&format!("{info}\n"));
    }

    fn print_interrupted(&mut self) {
        self.end_line();
        self.write("[interrupted]\n");
    }

    fn should_interrupt(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn plain() -> PlainTextRenderer<Vec<u8>> {
        PlainTextRenderer::with_writer(Vec::new(), false)
    }

    fn output(renderer: PlainTextRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn streamed_reply_on_one_line() {
        let mut renderer = plain();
        renderer.print_message(&ChatMessage::user("Hello"));
        renderer.start_response();
        renderer.print_fragment(&Fragment::Text("Hi".to_string()));
        renderer.print_fragment(&Fragment::Text(" there".to_string()));
        renderer.finish_response();
        assert_eq!(output(renderer), "You: Hello\nAssistant: Hi there\n");
    }

    #[test]
    fn error_fragment_on_its_own_line() {
        let mut renderer = plain();
        renderer.start_response();
        renderer.print_fragment(&Fragment::Text("Hel".to_string()));
        renderer.print_fragment(&Fragment::Error(Error::connection("reset", None)));
        renderer.finish_response();
        assert_eq!(
            output(renderer),
            "Assistant: Hel\n⚠️ Error: Connection error: reset\n"
        );
    }

    #[test]
    fn title_and_animation_card() {
        let animation = Animation::parse("wave.json", r#"{"nm": "wave"}"#).unwrap();
        let mut renderer = plain();
        renderer.print_title("Welcome to DeepSeek Chat!");
        renderer.print_animation(Gender::Female, &animation);
        assert_eq!(
            output(renderer),
            "Welcome to DeepSeek Chat!\n\n  [2] Female (wave, 0 layers)\n"
        );
    }

    #[test]
    fn color_wraps_labels() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), true);
        renderer.print_error("boom");
        let text = output(renderer);
        assert!(text.starts_with(ANSI_RED));
        assert!(text.contains("Error: boom"));
        assert!(text.contains(ANSI_RESET));
    }

    #[test]
    fn interrupt_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let renderer = plain().with_interrupt(Arc::clone(&flag));
        assert!(!renderer.should_interrupt());
        flag.store(true, Ordering::Relaxed);
        assert!(renderer.should_interrupt());
    }
}
