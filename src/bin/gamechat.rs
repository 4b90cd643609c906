//! Interactive gaming assistant chat.
//!
//! This binary provides a streaming REPL for chatting with a gaming-focused assistant
//! backed by Groq or Google Gemini.  Credentials are read from the environment after
//! loading `.env` from the working directory.
//!
//! # Usage
//!
//! ```bash
//! # Groq with default settings (needs GROQ_API_KEY)
//! gamechat
//!
//! # Gemini with a different personality (needs GEMINI_API_KEY)
//! gamechat --backend gemini --personality humorous
//!
//! # Keep history when switching personality
//! gamechat --keep-history
//!
//! # Disable colors (useful for piping output)
//! gamechat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear chat history
//! - `/personality <name>` - Switch personality
//! - `/history` - Show the conversation so far
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use gamechat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use gamechat::{CompletionBackend, CompletionLogger, FileLogger, HistoryPolicy, Personality};

const WELCOME: &str = r#"Welcome to Your Gaming AI assistant!

I'm your personal gaming companion, here to help you with:
  - Game Recommendations - Find your next favorite game
  - Hardware Advice - Choose the best gaming gear
  - Strategy Tips - Level up your gameplay
  - Esports Insights - Stay updated on competitive gaming
  - General Gaming Chat - Discuss anything gaming-related!

Pick a personality with /personality and let's chat!"#;

/// Main entry point for the gamechat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let (args, _) = ChatArgs::from_command_line_relaxed("gamechat [OPTIONS]");
    let config = ChatConfig::try_from(args)?;

    let logger: Option<Arc<dyn CompletionLogger>> = match &config.log_file {
        Some(path) => Some(Arc::new(FileLogger::create(path)?)),
        None => None,
    };
    let backend = config
        .backend
        .connect(None, config.base_url.clone(), logger.clone())?;
    let mut session = ChatSession::new(backend, &config);
    if let Some(logger) = logger {
        session = session.with_logger(logger);
    }
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    println!("🎮 My Gaming AI assistant\n");
    println!("{WELCOME}\n");
    println!(
        "Backend: {} (model: {})",
        session.backend().name(),
        config.model
    );
    print_personality(session.personality());
    if !session.backend().has_credential() {
        renderer.print_error(&format!(
            "{} is not set; add it to .env or the environment",
            session.backend().credential_name()
        ));
    }
    println!("Type /help for commands, /quit to exit\n");

    loop {
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
                            renderer.print_info("Chat history cleared.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Personality(personality) => {
                            if session.set_personality(personality) {
                                if session.session().history_policy()
                                    == HistoryPolicy::ResetOnChange
                                {
                                    renderer.print_info("Chat history cleared.");
                                }
                                print_personality(personality);
                            } else {
                                renderer.print_info(&format!("Already using {personality}."));
                            }
                        }
                        ChatCommand::ListPersonalities => {
                            print_personalities(session.personality());
                        }
                        ChatCommand::History => {
                            if session.message_count() == 0 {
                                renderer.print_info("No messages yet.");
                            } else {
                                session.render_history(&mut renderer);
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::ShowConfig => {
                            print_config(&config, &session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                session.submit(&line, &mut renderer).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt discards the line
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_personality(personality: Personality) {
    println!("Personality: {}", personality);
    println!("  {}", personality.description());
}

fn print_personalities(active: Personality) {
    println!("    Personalities:");
    for personality in Personality::ALL {
        let marker = if personality == active { "*" } else { " " };
        println!(
            "    {} {:<16} {}",
            marker,
            personality.label(),
            personality.description()
        );
    }
}

fn print_stats<B: CompletionBackend>(session: &ChatSession<B>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Backend: {}", stats.backend);
    println!("      Model: {}", stats.model);
    println!("      Personality: {}", stats.personality);
    println!("      Messages: {}", stats.message_count);
    println!(
        "      Turns: {} completed / {} failed",
        stats.turns_completed, stats.turns_failed
    );
    println!("      Fragments received: {}", stats.fragments_received);
}

fn print_config<B: CompletionBackend>(config: &ChatConfig, session: &ChatSession<B>) {
    let params = session.params();
    let backend = session.backend();
    println!("    Current Configuration:");
    println!("      Backend: {}", config.backend);
    println!("      Model: {}", params.model);
    println!("      Temperature: {:.2}", params.temperature);
    println!("      Max tokens: {}", params.max_tokens);
    println!("      Personality: {}", session.personality());
    println!(
        "      History on personality change: {}",
        session.session().history_policy()
    );
    println!(
        "      Credential: {} ({})",
        backend.credential_name(),
        if backend.has_credential() { "set" } else { "not set" }
    );
    match &config.log_file {
        Some(path) => println!("      Log file: {}", path.display()),
        None => println!("      Log file: (disabled)"),
    }
}
