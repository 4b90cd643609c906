//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the API.

use crate::types::Personality;

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Clear the conversation history.
    Clear,

    /// Switch to another personality.
    Personality(Personality),

    /// List the available personalities.
    ListPersonalities,

    /// Redraw the visible conversation.
    History,

    /// Show the current configuration.
    ShowConfig,

    /// Display session statistics.
    Stats,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use gamechat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/personality humorous").is_some());
/// assert!(parse_command("Any good co-op games?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" | "reset" => ChatCommand::Clear,
        "personality" | "p" => match argument {
            Some(name) => match name.parse::<Personality>() {
                Ok(personality) => ChatCommand::Personality(personality),
                Err(err) => ChatCommand::Invalid(err),
            },
            None => ChatCommand::ListPersonalities,
        },
        "personalities" => ChatCommand::ListPersonalities,
        "history" => ChatCommand::History,
        "config" => ChatCommand::ShowConfig,
        "stats" | "status" => ChatCommand::Stats,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear                 Clear the chat history
  /personality <name>    Switch personality (friendly, professional, humorous)
  /personalities         List personalities
  /history               Show the conversation so far
  /stats                 Show session statistics
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
    fn parse_personality() {
        assert_eq!(
            parse_command("/personality humorous"),
            Some(ChatCommand::Personality(Personality::Humorous))
        );
        assert_eq!(
            parse_command("/personality   Professional  "),
            Some(ChatCommand::Personality(Personality::Professional))
        );
        assert_eq!(
            parse_command("/personality"),
            Some(ChatCommand::ListPersonalities)
        );
        assert!(matches!(
            parse_command("/personality grumpy"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("grumpy")
        ));
    }

    #[test]
    fn parse_listing_commands() {
        assert_eq!(
            parse_command("/personalities"),
            Some(ChatCommand::ListPersonalities)
        );
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/config"), Some(ChatCommand::ShowConfig));
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/model gpt"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Recommend a roguelike"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_lists_commands() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/clear"));
        assert!(help.contains("/personality"));
    }
}
