//! Chat application module for interactive conversations.
//!
//! This module provides a REPL chat interface built on top of the
//! completion client. It supports:
//!
//! - Simulated typing of each answer, piece by piece
//! - Persisted history, theme and layout
//! - Slash commands for session control
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`state`]: The session state store and its persistence
//! - [`session`]: Sending user turns and typing out answers
//! - [`typing`]: Splitting answers into typed pieces
//! - [`commands`]: Slash command parsing and handling

mod commands;
mod config;
mod session;
mod state;
mod typing;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_CONTEXT_MESSAGES, DEFAULT_SYSTEM_INSTRUCTION};
pub use session::{ChatSession, SendOutcome};
pub use state::{DEFAULT_ERROR_DISMISS, ErrorNotice, MAX_MESSAGES, SessionState, SessionStats};
pub use typing::{DEFAULT_TYPING_INTERVAL, TypingSimulation, split_pieces};
