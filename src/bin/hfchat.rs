//! Interactive terminal chat against the Hugging Face inference router.
//!
//! The user first picks a gender on the selection screen; every reply is then
//! framed by a system message naming it.  Replies stream in token by token.
//!
//! # Usage
//!
//! ```bash
//! # Token from the environment
//! HUGGINGFACE_API_TOKEN=hf_... hfchat
//!
//! # Token from a YAML secrets file
//! hfchat --secrets ~/.config/hfchat/secrets.yaml
//!
//! # Different model, no colors
//! hfchat --model meta-llama/Llama-3.1-8B-Instruct --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/history` - Show the conversation so far
//! - `/stats` - Show session statistics
//! - `/config` - Show current configuration
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use hfchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, PlainTextRenderer, SESSION_KEY, WELCOME_TITLE, chat_title,
    help_text, parse_command, stream_reply,
};
use hfchat::secrets::load_token;
use hfchat::{
    AnimationSet, ChatCompletion, Gender, InferenceClient, JsonlLogger, Renderer, Session,
    SessionStore,
};

/// Everything that must be in place before the first screen is shown.
struct Startup {
    client: InferenceClient,
    animations: AnimationSet,
}

fn start(config: &ChatConfig) -> hfchat::Result<Startup> {
    config.validate()?;
    let token = load_token(&config.secrets_path)?;
    let mut client = InferenceClient::with_options(token, config.base_url.as_deref(), None)?;
    if let Some(path) = &config.log_file {
        client = client.with_logger(Arc::new(JsonlLogger::open(path)?));
    }
    let animations = AnimationSet::load(&config.male_animation, &config.female_animation)?;
    Ok(Startup { client, animations })
}

/// Main entry point for the hfchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("hfchat [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let Startup { client, animations } = match start(&config) {
        Ok(startup) => startup,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    let mut renderer = PlainTextRenderer::with_color(use_color).with_interrupt(interrupted.clone());
    let mut rl = DefaultEditor::new()?;
    let mut store = SessionStore::new(Arc::new(client), config.relay_options());

    let session = store.initialize(SESSION_KEY);
    if select_gender(session, &animations, &mut renderer, &mut rl)? {
        chat(session, &config, &mut renderer, &mut rl, &interrupted).await;
    }
    store.end(SESSION_KEY);

    Ok(())
}

/// Runs the selection screen.  Returns false if the user left before picking.
fn select_gender<C: ChatCompletion + ?Sized + 'static>(
    session: &mut Session<C>,
    animations: &AnimationSet,
    renderer: &mut PlainTextRenderer,
    rl: &mut DefaultEditor,
) -> Result<bool, Box<dyn std::error::Error>> {
    renderer.print_title(WELCOME_TITLE);
    for gender in Gender::ALL {
        renderer.print_animation(gender, animations.for_gender(gender));
    }
    renderer.print_info("");

    while !session.is_chatting() {
        match rl.readline("Select [1-2]: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if parse_command(line) == Some(ChatCommand::Quit) {
                    println!("Goodbye!");
                    return Ok(false);
                }
                match line.parse::<Gender>() {
                    Ok(gender) => session.set_gender(gender)?,
                    Err(err) => renderer.print_error(&err.to_string()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(true)
}

/// Runs the chat screen until the user quits.
async fn chat<C: ChatCompletion + ?Sized + 'static>(
    session: &mut Session<C>,
    config: &ChatConfig,
    renderer: &mut PlainTextRenderer,
    rl: &mut DefaultEditor,
    interrupted: &AtomicBool,
) {
    let Some(gender) = session.gender() else {
        return;
    };
    renderer.print_title(&chat_title(gender));
    println!("Type /help for commands, /quit to exit\n");

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::History => {
                            if session.messages().is_empty() {
                                renderer.print_info("No messages yet.");
                            }
                            for message in session.messages() {
                                renderer.print_message(message);
                            }
                        }
                        ChatCommand::Stats => print_stats(session),
                        ChatCommand::ShowConfig => print_config(config),
                        ChatCommand::Invalid(message) => renderer.print_error(&message),
                    }
                    continue;
                }

                stream_reply(session, line, renderer).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }
}

fn print_stats<C: ChatCompletion + ?Sized + 'static>(session: &Session<C>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    match stats.gender {
        Some(gender) => println!("      Gender: {}", gender.title()),
        None => println!("      Gender: (not selected)"),
    }
    println!("      Messages: {}", stats.message_count);
    println!("      Model: {}", stats.model);
    println!("      Max tokens: {}", stats.max_tokens);
}

fn print_config(config: &ChatConfig) {
    println!("    Current Configuration:");
    println!("      Model: {}", config.model);
    println!("      Max tokens: {}", config.max_tokens);
    println!(
        "      Base URL: {}",
        config.base_url.as_deref().unwrap_or("(default)")
    );
    println!("      Secrets file: {}", config.secrets_path.display());
    println!("      Male animation: {}", config.male_animation.display());
    println!("      Female animation: {}", config.female_animation.display());
    match config.log_file {
        Some(ref path) => println!("      Log file: {}", path.display()),
        None => println!("      Log file: (disabled)"),
    }
    println!(
        "      Colors: {}",
        if config.use_color { "on" } else { "off" }
    );
}
