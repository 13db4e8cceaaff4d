//! Slash command parsing for the chat screen.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to inspect the session without sending messages to the
//! inference service.

/// A parsed chat command.
///
/// These commands inspect the session and are never relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Reprint the conversation so far.
    History,

    /// Display session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be relayed as a regular message.
///
/// # Examples
///
/// ```
/// # use hfchat::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
/// assert!(parse_command("Hello!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "history" | "h" => no_argument(ChatCommand::History, "/history", argument),
        "stats" | "status" => no_argument(ChatCommand::Stats, "/stats", argument),
        "config" => no_argument(ChatCommand::ShowConfig, "/config", argument),
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "" => ChatCommand::Invalid("Empty command; type /help for commands".to_string()),
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

fn no_argument(command: ChatCommand, name: &str, argument: Option<&str>) -> ChatCommand {
    match argument {
        None => command,
        Some(_) => ChatCommand::Invalid(format!("{name} takes no arguments")),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /history               Show the conversation so far
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat
Anything else is sent to the assistant.  Ctrl+C stops a reply in progress."#
}
