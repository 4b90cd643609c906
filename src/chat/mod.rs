//! Chat application module for interactive conversations about games.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! completion backends. It supports:
//!
//! - Streaming responses with real-time fragment display
//! - Switchable personalities
//! - Slash commands for session control
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Turn handling and session statistics
//! - [`commands`]: Slash command parsing and handling

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, MAX_TEMPERATURE};
pub use session::{ChatSession, SessionStats, TurnOutcome, TurnState, format_error_reply};
