//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod auth;
pub mod chat;
pub mod session;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use parley_types::chat::Personality;

/// Chat with a personality-driven assistant from your terminal.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat.
    Chat {
        #[command(flatten)]
        who: IdentityArgs,

        /// Create a new account for --email instead of signing in.
        #[arg(long, requires = "email")]
        signup: bool,

        /// Personality for new conversations (friendly, professional, technical, creative).
        #[arg(long, short)]
        personality: Option<Personality>,

        /// Resume a stored session (full id or unique prefix).
        #[arg(long, short)]
        session: Option<String>,
    },

    /// Browse stored chat sessions.
    Sessions {
        #[command(flatten)]
        who: IdentityArgs,

        #[command(subcommand)]
        action: SessionAction,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Whose history to use.
#[derive(Args, Debug, Clone, Default)]
pub struct IdentityArgs {
    /// Use local guest mode; history stays on this device.
    #[arg(long, conflicts_with = "email")]
    pub guest: bool,

    /// Sign in with this email address (the password is prompted).
    #[arg(long)]
    pub email: Option<String>,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// List sessions, most recent first.
    #[command(alias = "ls")]
    List,

    /// Show the transcript of a session.
    Show {
        /// Session id or unique prefix.
        id: String,
    },

    /// Delete a session.
    #[command(alias = "rm")]
    Delete {
        /// Session id or unique prefix.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_chat_flags() {
        let cli = Cli::try_parse_from([
            "parley", "chat", "--email", "ada@example.com", "--signup", "-p", "technical",
        ])
        .unwrap();
        match cli.command {
            Commands::Chat {
                who,
                signup,
                personality,
                session,
            } => {
                assert_eq!(who.email.as_deref(), Some("ada@example.com"));
                assert!(!who.guest);
                assert!(signup);
                assert_eq!(personality, Some(Personality::Technical));
                assert!(session.is_none());
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn test_guest_conflicts_with_email() {
        let result = Cli::try_parse_from(["parley", "chat", "--guest", "--email", "ada@example.com"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_signup_requires_email() {
        assert!(Cli::try_parse_from(["parley", "chat", "--signup"]).is_err());
    }

    #[test]
    fn test_parse_sessions_delete() {
        let cli = Cli::try_parse_from(["parley", "--json", "sessions", "--guest", "rm", "0192", "-f"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Sessions { who, action } => {
                assert!(who.guest);
                assert!(matches!(action, SessionAction::Delete { ref id, force: true } if id == "0192"));
            }
            _ => panic!("expected sessions"),
        }
    }

    #[test]
    fn test_invalid_personality_rejected() {
        assert!(Cli::try_parse_from(["parley", "chat", "--personality", "grumpy"]).is_err());
    }
}
