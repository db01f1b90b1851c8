//! Interactive terminal chat client.
//!
//! This binary provides a REPL that sends each message to the completion
//! endpoint and types the answer out piece by piece.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! chatline
//!
//! # Specify a model
//! chatline --model gpt-4o
//!
//! # Talk to a local endpoint and keep state in a scratch directory
//! chatline --endpoint http://localhost:8000/chat --state-dir /tmp/chatline
//!
//! # Disable colors (useful for piping output)
//! chatline --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history
//! - `/model <name>` - Change the model
//! - `/dark [on|off]` - Set or toggle the dark theme
//! - `/layout center|side` - Change the layout
//! - `/stats` - Show token counters
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use arrrg::CommandLine;
use biometrics::Collector;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{Level, warn};
use tracing_subscriber::FmtSubscriber;

use chatline::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use chatline::view::render_info_bar;
use chatline::{
    CompletionClient, FileStorage, MemoryStorage, Model, Storage, register_biometrics,
};

/// Main entry point for the chatline application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("chatline [OPTIONS]");
    let config = match ChatConfig::try_from(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("chatline: {err}");
            std::process::exit(2);
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if config.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    register_biometrics(Collector::new());

    let client = CompletionClient::with_options(Some(&config.endpoint), Some(config.timeout))?;
    let storage = open_storage(&config);
    let error_dismiss = config.error_dismiss;

    // Flag for interrupt handling during typing
    let interrupted = Arc::new(AtomicBool::new(false));

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    let mut renderer = PlainTextRenderer::with_color(config.use_color)
        .with_width(config.width)
        .with_interrupt(interrupted.clone());
    let mut session = ChatSession::with_storage(client, config, storage)?;
    let mut rl = DefaultEditor::new()?;

    println!("chatline (model: {})", session.state().model());
    println!("Type /help for commands, /quit to exit\n");
    renderer.print_transcript(session.state());

    loop {
        if let Some(error) = session
            .state()
            .visible_error(Instant::now(), error_dismiss)
        {
            renderer.print_banner(error, session.state());
        }

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(trimmed);

                // Check for slash commands
                if let Some(cmd) = parse_command(trimmed) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            session.clear();
                            renderer.print_info("Conversation cleared.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Model(model) => {
                            session.set_model(model);
                            renderer.print_info(&format!("Model changed to: {}", model));
                        }
                        ChatCommand::ListModels => {
                            print_models(session.state().model());
                        }
                        ChatCommand::DarkMode(value) => {
                            if session.set_dark_mode(value) {
                                renderer.print_info("Dark theme enabled.");
                            } else {
                                renderer.print_info("Light theme enabled.");
                            }
                            renderer.print_transcript(session.state());
                        }
                        ChatCommand::Layout(layout) => {
                            session.set_layout(layout);
                            renderer.print_info(&format!("Layout set to {}", layout));
                            renderer.print_transcript(session.state());
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::History => {
                            renderer.print_history(session.state());
                        }
                        ChatCommand::ShowConfig => {
                            print_config(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - send to the endpoint
                interrupted.store(false, Ordering::Relaxed);
                if let Err(e) = session.send(&line, &mut renderer).await {
                    warn!(error = %e, "message not answered");
                }
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

    if let Err(err) = session.save() {
        renderer.print_error(&format!("Failed to save session: {}", err));
    }
    Ok(())
}

fn open_storage(config: &ChatConfig) -> Box<dyn Storage> {
    let Some(root) = config.state_dir.clone().or_else(FileStorage::default_root) else {
        warn!("no state directory available; history will not be kept");
        return Box::new(MemoryStorage::new());
    };
    match FileStorage::open(&root) {
        Ok(storage) => Box::new(storage),
        Err(err) => {
            warn!(error = %err, root = %root.display(), "cannot open state directory");
            Box::new(MemoryStorage::new())
        }
    }
}

fn print_models(current: Model) {
    println!("    Models:");
    for model in Model::ALL {
        let marker = if model == current { "*" } else { " " };
        println!("    {} {}", marker, model);
    }
}

fn print_stats(session: &ChatSession<CompletionClient>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Model: {}", stats.model);
    println!("      Messages: {}", stats.message_count);
    println!("      {}", render_info_bar(&stats));
    match stats.last_error {
        Some(ref error) => println!("      Last error: {}", error),
        None => println!("      Last error: (none)"),
    }
}

fn print_config(session: &ChatSession<CompletionClient>) {
    let stats = session.stats();
    let config = session.config();
    println!("    Current Configuration:");
    println!("      Model: {}", stats.model);
    println!("      Endpoint: {}", config.endpoint);
    println!("      System instruction: {}", config.system_instruction);
    println!("      Context messages: {}", config.context_messages);
    println!("      Timeout: {}s", config.timeout.as_secs());
    println!(
        "      Typing interval: {}ms",
        config.typing_interval.as_millis()
    );
    println!(
        "      Theme: {}",
        if stats.dark_mode { "dark" } else { "light" }
    );
    println!("      Layout: {}", stats.layout);
    match config.state_dir {
        Some(ref dir) => println!("      State directory: {}", dir.display()),
        None => println!("      State directory: (default)"),
    }
}
