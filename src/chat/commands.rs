//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the endpoint.

use crate::types::{Layout, Model};

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation history and token counters.
    Clear,

    /// Change the model.
    Model(Model),

    /// List the selectable models.
    ListModels,

    /// Set the theme; `None` toggles it.
    DarkMode(Option<bool>),

    /// Set the layout mode.
    Layout(Layout),

    /// Display token counters and settings.
    Stats,

    /// Print the whole conversation.
    History,

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
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use chatline::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model gpt-4o").is_some());
/// assert!(parse_command("Hello there!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "model" => match argument {
            Some(name) => match name.parse::<Model>() {
                Ok(model) => ChatCommand::Model(model),
                Err(err) => ChatCommand::Invalid(err),
            },
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "models" => ChatCommand::ListModels,
        "dark" => match argument {
            None => ChatCommand::DarkMode(None),
            Some(arg) => match parse_on_off(arg) {
                Some(value) => ChatCommand::DarkMode(Some(value)),
                None => ChatCommand::Invalid("/dark expects 'on' or 'off'".to_string()),
            },
        },
        "theme" => match argument.map(str::to_lowercase).as_deref() {
            Some("dark") => ChatCommand::DarkMode(Some(true)),
            Some("light") => ChatCommand::DarkMode(Some(false)),
            None => ChatCommand::DarkMode(None),
            Some(_) => ChatCommand::Invalid("/theme expects 'dark' or 'light'".to_string()),
        },
        "layout" => match argument {
            Some(arg) => match arg.parse::<Layout>() {
                Ok(layout) => ChatCommand::Layout(layout),
                Err(err) => ChatCommand::Invalid(err),
            },
            None => ChatCommand::Invalid("/layout requires 'center' or 'side'".to_string()),
        },
        "stats" | "status" | "tokens" => ChatCommand::Stats,
        "history" => ChatCommand::History,
        "config" => ChatCommand::ShowConfig,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear                 Clear conversation history and token counters
  /model <name>          Change the model (e.g., /model gpt-4o)
  /models                List selectable models
  /dark [on|off]         Set or toggle the dark theme
  /theme dark|light      Set the theme
  /layout center|side    Center every message or align by role
  /stats                 Show token counters and settings
  /history               Show the whole conversation
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_clear() {
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/CLEAR"), Some(ChatCommand::Clear));
    }

    #[test]
    fn parse_model() {
        assert_eq!(
            parse_command("/model gpt-4o"),
            Some(ChatCommand::Model(Model::Gpt4o))
        );
        assert_eq!(
            parse_command("/model   deepseek-chat  "),
            Some(ChatCommand::Model(Model::DeepseekChat))
        );
        assert_eq!(
            parse_command("/model"),
            Some(ChatCommand::Invalid(
                "/model requires a model name".to_string()
            ))
        );
        assert!(matches!(
            parse_command("/model gpt-2"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("unknown model")
        ));
        assert_eq!(parse_command("/models"), Some(ChatCommand::ListModels));
    }

    #[test]
    fn parse_theme() {
        assert_eq!(parse_command("/dark"), Some(ChatCommand::DarkMode(None)));
        assert_eq!(
            parse_command("/dark on"),
            Some(ChatCommand::DarkMode(Some(true)))
        );
        assert_eq!(
            parse_command("/dark off"),
            Some(ChatCommand::DarkMode(Some(false)))
        );
        assert_eq!(
            parse_command("/theme Light"),
            Some(ChatCommand::DarkMode(Some(false)))
        );
        assert!(matches!(
            parse_command("/dark maybe"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects")
        ));
        assert!(matches!(
            parse_command("/theme solarized"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_layout() {
        assert_eq!(
            parse_command("/layout center"),
            Some(ChatCommand::Layout(Layout::Centered))
        );
        assert_eq!(
            parse_command("/layout side"),
            Some(ChatCommand::Layout(Layout::Side))
        );
        assert!(matches!(
            parse_command("/layout"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
        assert!(matches!(
            parse_command("/layout left"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_views() {
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/tokens"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/config"), Some(ChatCommand::ShowConfig));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn unknown_commands() {
        assert_eq!(
            parse_command("/frobnicate now"),
            Some(ChatCommand::Invalid("Unknown command: /frobnicate".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello there!"), None);
        assert_eq!(parse_command("سلام"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(!help.is_empty());
        assert!(help.contains("/quit"));
        assert!(help.contains("/clear"));
        assert!(help.contains("/model"));
        assert!(help.contains("/layout"));
    }
}
