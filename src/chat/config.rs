//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::chat::state::DEFAULT_ERROR_DISMISS;
use crate::chat::typing::DEFAULT_TYPING_INTERVAL;
use crate::client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use crate::types::Model;
use crate::view::DEFAULT_WIDTH;

/// System instruction placed at the head of every request.
///
/// "You are an expert and are working with an intelligent assistant."
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "شما یک فرد خبره هستید و در حال کار با یک دستیار هوشمند می باشید.";

/// Number of prior messages sent as context with each request.
pub const DEFAULT_CONTEXT_MESSAGES: usize = 5;

/// Command-line arguments for the chatline tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gpt-4o-mini)", "MODEL")]
    pub model: Option<String>,

    /// Completion endpoint URL.
    #[arrrg(optional, "Completion endpoint URL", "URL")]
    pub endpoint: Option<String>,

    /// System instruction sent with every request.
    #[arrrg(optional, "System instruction for every request", "PROMPT")]
    pub system: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Delay between typed pieces in milliseconds.
    #[arrrg(optional, "Typing delay per piece in ms (default: 30)", "MILLIS")]
    pub typing_interval_ms: Option<u64>,

    /// Directory holding persisted session state.
    #[arrrg(optional, "Directory for persisted state", "DIR")]
    pub state_dir: Option<String>,

    /// Width of the conversation column.
    #[arrrg(optional, "Conversation width in columns (default: 80)", "COLUMNS")]
    pub width: Option<usize>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Log debug output to stderr.
    #[arrrg(flag, "Log debug output to stderr")]
    pub verbose: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model selected at startup.
    pub model: Model,

    /// Endpoint requests are posted to.
    pub endpoint: String,

    /// System instruction placed before the context turns.
    pub system_instruction: String,

    /// Number of prior messages sent as context.
    pub context_messages: usize,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Delay between typed pieces.
    pub typing_interval: Duration,

    /// How long an error stays visible.
    pub error_dismiss: Duration,

    /// Directory for persisted state; `None` keeps state in memory.
    pub state_dir: Option<PathBuf>,

    /// Width of the conversation column.
    pub width: usize,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to log debug output.
    pub verbose: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gpt-4o-mini
    /// - Timeout: 60 seconds
    /// - Typing interval: 30 ms
    /// - Error dismiss: 5 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            context_messages: DEFAULT_CONTEXT_MESSAGES,
            timeout: DEFAULT_TIMEOUT,
            typing_interval: DEFAULT_TYPING_INTERVAL,
            error_dismiss: DEFAULT_ERROR_DISMISS,
            state_dir: None,
            width: DEFAULT_WIDTH,
            use_color: true,
            verbose: false,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Sets how many prior messages are sent as context.
    pub fn with_context_messages(mut self, count: usize) -> Self {
        self.context_messages = count;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the delay between typed pieces.
    pub fn with_typing_interval(mut self, interval: Duration) -> Self {
        self.typing_interval = interval;
        self
    }

    /// Sets how long errors stay visible.
    pub fn with_error_dismiss(mut self, dismiss: Duration) -> Self {
        self.error_dismiss = dismiss;
        self
    }

    /// Sets the state directory.
    pub fn with_state_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.state_dir = dir;
        self
    }

    /// Sets the conversation width.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = String;

    fn try_from(args: ChatArgs) -> Result<Self, Self::Error> {
        let defaults = ChatConfig::new();
        let model = match args.model {
            Some(s) => s.parse::<Model>()?,
            None => defaults.model,
        };
        let typing_interval = match args.typing_interval_ms {
            Some(0) => return Err("--typing-interval-ms must be positive".to_string()),
            Some(ms) => Duration::from_millis(ms),
            None => defaults.typing_interval,
        };
        let timeout = match args.timeout_secs {
            Some(0) => return Err("--timeout-secs must be positive".to_string()),
            Some(secs) => Duration::from_secs(secs),
            None => defaults.timeout,
        };

        Ok(ChatConfig {
            model,
            endpoint: args.endpoint.unwrap_or(defaults.endpoint),
            system_instruction: args.system.unwrap_or(defaults.system_instruction),
            timeout,
            typing_interval,
            state_dir: args.state_dir.map(PathBuf::from),
            width: args.width.unwrap_or(DEFAULT_WIDTH),
            use_color: !args.no_color,
            verbose: args.verbose,
            ..ChatConfig::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.model, Model::Gpt4oMini);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.system_instruction, DEFAULT_SYSTEM_INSTRUCTION);
        assert_eq!(config.context_messages, 5);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.typing_interval, Duration::from_millis(30));
        assert_eq!(config.error_dismiss, Duration::from_secs(5));
        assert!(config.state_dir.is_none());
        assert!(config.use_color);
        assert!(!config.verbose);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::try_from(ChatArgs::default()).unwrap();
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            model: Some("gpt-4.1".to_string()),
            endpoint: Some("http://localhost:9000/chat".to_string()),
            system: Some("Be terse.".to_string()),
            timeout_secs: Some(10),
            typing_interval_ms: Some(5),
            state_dir: Some("/tmp/chatline".to_string()),
            width: Some(100),
            no_color: true,
            verbose: true,
        };
        let config = ChatConfig::try_from(args).unwrap();
        assert_eq!(config.model, Model::Gpt41);
        assert_eq!(config.endpoint, "http://localhost:9000/chat");
        assert_eq!(config.system_instruction, "Be terse.");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.typing_interval, Duration::from_millis(5));
        assert_eq!(config.state_dir, Some(PathBuf::from("/tmp/chatline")));
        assert_eq!(config.width, 100);
        assert!(!config.use_color);
        assert!(config.verbose);
    }

    #[test]
    fn config_from_args_rejects_unknown_model_and_zero_values() {
        let args = ChatArgs {
            model: Some("gpt-9".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).is_err());

        let args = ChatArgs {
            typing_interval_ms: Some(0),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).is_err());

        let args = ChatArgs {
            timeout_secs: Some(0),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).is_err());
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_model(Model::DeepseekChat)
            .with_endpoint("http://127.0.0.1/chat")
            .with_system_instruction("sys")
            .with_context_messages(2)
            .with_timeout(Duration::from_secs(3))
            .with_typing_interval(Duration::from_millis(1))
            .with_error_dismiss(Duration::from_secs(1))
            .with_state_dir(Some(PathBuf::from("state")))
            .with_width(60)
            .without_color();

        assert_eq!(config.model, Model::DeepseekChat);
        assert_eq!(config.endpoint, "http://127.0.0.1/chat");
        assert_eq!(config.system_instruction, "sys");
        assert_eq!(config.context_messages, 2);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.typing_interval, Duration::from_millis(1));
        assert_eq!(config.error_dismiss, Duration::from_secs(1));
        assert_eq!(config.state_dir, Some(PathBuf::from("state")));
        assert_eq!(config.width, 60);
        assert!(!config.use_color);
    }
}
