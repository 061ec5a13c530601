//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and control sessions, personality and the
//! terminal. Anything else is sent as a message.

use console::style;
use parley_types::chat::Personality;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat.
    Exit,
    /// Start a fresh session.
    New,
    /// List saved sessions.
    History,
    /// Switch to a saved session (id or prefix).
    Load(String),
    /// Delete a saved session (id or prefix).
    Delete(String),
    /// Change the personality of the active session.
    Personality(Personality),
    /// Sign out and end the chat.
    Logout,
    /// Unknown command, or a known one used wrongly.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let arg = parts
        .get(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" | "/cls" => ChatCommand::Clear,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/new" => ChatCommand::New,
        "/history" | "/sessions" => ChatCommand::History,
        "/load" | "/open" => match arg {
            Some(id) => ChatCommand::Load(id),
            None => ChatCommand::Unknown("/load requires a session id".to_string()),
        },
        "/delete" | "/rm" => match arg {
            Some(id) => ChatCommand::Delete(id),
            None => ChatCommand::Unknown("/delete requires a session id".to_string()),
        },
        "/personality" | "/p" => match arg.as_deref().map(str::parse::<Personality>) {
            Some(Ok(personality)) => ChatCommand::Personality(personality),
            Some(Err(e)) => ChatCommand::Unknown(e),
            None => ChatCommand::Unknown(format!(
                "/personality requires one of: {}",
                personality_names()
            )),
        },
        "/logout" => ChatCommand::Logout,
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

fn personality_names() -> String {
    Personality::ALL
        .iter()
        .map(Personality::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/new", "Start a new conversation"),
        ("/history", "List saved conversations"),
        ("/load <id>", "Switch to a saved conversation"),
        ("/delete <id>", "Delete a saved conversation"),
        ("/personality <name>", "Change how the assistant talks"),
        ("/clear", "Clear the screen"),
        ("/logout", "Sign out and exit"),
        ("/exit", "End the chat"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (command, description) in rows {
        println!("  {:<22}{}", style(command).cyan(), description);
    }
    println!();
    println!(
        "  {} {}",
        style("Personalities:").dim(),
        style(personality_names()).dim()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(parse("hello there"), None);
        assert_eq!(parse("what does /help do?"), None);
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("/help"), Some(ChatCommand::Help));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
        assert_eq!(parse("  /EXIT  "), Some(ChatCommand::Exit));
        assert_eq!(parse("/q"), Some(ChatCommand::Exit));
        assert_eq!(parse("/new"), Some(ChatCommand::New));
        assert_eq!(parse("/history"), Some(ChatCommand::History));
        assert_eq!(parse("/cls"), Some(ChatCommand::Clear));
        assert_eq!(parse("/logout"), Some(ChatCommand::Logout));
    }

    #[test]
    fn test_parse_session_commands() {
        assert_eq!(parse("/load 0192abcd"), Some(ChatCommand::Load("0192abcd".to_string())));
        assert_eq!(parse("/rm  0192abcd "), Some(ChatCommand::Delete("0192abcd".to_string())));
        assert_eq!(
            parse("/load"),
            Some(ChatCommand::Unknown("/load requires a session id".to_string()))
        );
        assert_eq!(
            parse("/delete   "),
            Some(ChatCommand::Unknown("/delete requires a session id".to_string()))
        );
    }

    #[test]
    fn test_parse_personality() {
        assert_eq!(
            parse("/personality Creative"),
            Some(ChatCommand::Personality(Personality::Creative))
        );
        assert_eq!(
            parse("/p grumpy"),
            Some(ChatCommand::Unknown("invalid personality: 'grumpy'".to_string()))
        );
        match parse("/personality") {
            Some(ChatCommand::Unknown(msg)) => {
                assert!(msg.contains("friendly, professional, technical, creative"))
            }
            other => panic!("expected usage error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(parse("/dance"), Some(ChatCommand::Unknown("/dance".to_string())));
    }
}
