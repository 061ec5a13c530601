//! Main chat loop orchestration.
//!
//! Coordinates the conversation: authentication, session lifecycle,
//! welcome banner, the input loop with a thinking spinner, slash commands,
//! and teardown of the identity watcher.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::info;

use parley_core::auth::controller::{AuthController, IdentityWatcher};
use parley_core::auth::gateway::AuthGateway;
use parley_core::exchange::pipeline::{MessageExchange, ReplyOutcome};
use parley_core::exchange::responder::RuleBasedResponder;
use parley_core::storage::session_store::SessionStore;
use parley_types::chat::Personality;

use crate::cli::auth::{authenticate, mode_from_flags, prompt_mode};
use crate::cli::session::{find_session, preview, print_message, short_id};
use crate::cli::IdentityArgs;
use crate::state::{AppState, ChatLifecycle};

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};

/// Label used for assistant messages.
const ASSISTANT: &str = "Parley";

/// Messages of a loaded session replayed on screen.
const REPLAY_LIMIT: usize = 6;

/// Options for `parley chat`.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub who: IdentityArgs,
    pub signup: bool,
    pub personality: Option<Personality>,
    pub session: Option<String>,
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message("typing...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn notice(symbol: &str, text: impl std::fmt::Display) {
    println!("\n  {} {}\n", style(symbol).cyan().bold(), text);
}

fn warning(text: impl std::fmt::Display) {
    println!("\n  {} {}\n", style("!").yellow().bold(), text);
}

fn print_history(lifecycle: &ChatLifecycle) {
    let sessions = lifecycle.history();
    if sessions.is_empty() {
        notice("i", "No saved conversations yet.");
        return;
    }

    println!();
    for session in sessions {
        let active = lifecycle.active_id() == Some(&session.id);
        let marker = if active {
            style("*").green().bold()
        } else {
            style(" ").dim()
        };
        println!(
            "  {} {}  {:<42} {}",
            marker,
            style(short_id(session)).dim(),
            preview(session.title(), 40),
            style(format!(
                "{} msgs, {}",
                session.messages.len(),
                session.updated_at.format("%Y-%m-%d %H:%M")
            ))
            .dim()
        );
    }
    println!();
}

fn replay(lifecycle: &ChatLifecycle) {
    let messages = lifecycle.messages();
    let skipped = messages.len().saturating_sub(REPLAY_LIMIT);
    if skipped > 0 {
        println!("  {}", style(format!("... {skipped} earlier messages")).dim());
        println!();
    }
    for message in &messages[skipped..] {
        print_message(message, ASSISTANT);
    }
}

fn load(lifecycle: &mut ChatLifecycle, query: &str) {
    let session_id = match find_session(lifecycle.history(), query) {
        Ok(session) => session.id.clone(),
        Err(e) => {
            warning(e);
            return;
        }
    };

    match lifecycle.load_session(&session_id) {
        Ok(()) => {
            notice(
                "*",
                format!(
                    "Loaded conversation {} ({})",
                    style(&session_id).dim(),
                    lifecycle.personality()
                ),
            );
            replay(lifecycle);
        }
        Err(e) => warning(e),
    }
}

async fn delete(lifecycle: &mut ChatLifecycle, query: &str) {
    let session_id = match find_session(lifecycle.history(), query) {
        Ok(session) => session.id.clone(),
        Err(e) => {
            warning(e);
            return;
        }
    };

    let was_active = lifecycle.active_id() == Some(&session_id);
    lifecycle.delete_session(&session_id).await;
    notice("*", format!("Deleted conversation {}", style(&session_id).dim()));
    if was_active {
        println!("  {}\n", style("Started a new conversation.").dim());
    }
}

/// Run the interactive chat loop.
pub async fn run_chat_loop(state: &AppState, options: ChatOptions) -> anyhow::Result<()> {
    let mut controller = AuthController::new(state.gateway());
    let mode = match mode_from_flags(&options.who, options.signup) {
        Some(mode) => mode,
        None => prompt_mode()?,
    };
    let identity = authenticate(&mut controller, mode, true).await?;

    let cancel = CancellationToken::new();
    let watcher = IdentityWatcher::spawn(
        controller.gateway().subscribe(),
        Some(identity.clone()),
        cancel.clone(),
    );

    let personality = state.personality(options.personality);
    let mut lifecycle = state.open_lifecycle(identity.clone(), personality).await;
    let exchange = MessageExchange::new(RuleBasedResponder::new())
        .with_typing_delay(Duration::from_millis(state.config.typing_delay_ms));

    print_welcome_banner(
        &identity,
        lifecycle.store().backend_name(),
        personality,
        lifecycle.history().len(),
    );

    if let Some(query) = &options.session {
        load(&mut lifecycle, query);
    }

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        if watcher.current().is_none() {
            println!("\n  {}", style("Signed out.").dim());
            break;
        }

        let text = match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) => text,
        };

        if let Some(command) = commands::parse(&text) {
            match command {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Clear => chat_input.clear(),
                ChatCommand::Exit => {
                    println!("\n  {}", style("Session ended.").dim());
                    break;
                }
                ChatCommand::New => {
                    lifecycle.start_new_session();
                    notice("*", "Started a new conversation.");
                }
                ChatCommand::History => {
                    lifecycle.reload_history().await;
                    print_history(&lifecycle);
                }
                ChatCommand::Load(query) => load(&mut lifecycle, &query),
                ChatCommand::Delete(query) => delete(&mut lifecycle, &query).await,
                ChatCommand::Personality(personality) => {
                    lifecycle.set_personality(personality).await;
                    notice("*", format!("Personality set to {}", style(personality).cyan()));
                }
                ChatCommand::Logout => {
                    // The watcher observes the sign-out and ends the loop
                    let mut changes = watcher.changes();
                    controller.sign_out().await;
                    let signed_out = changes.wait_for(|identity| identity.is_none());
                    if tokio::time::timeout(Duration::from_secs(1), signed_out).await.is_err() {
                        tracing::warn!("Sign-out was not observed, exiting anyway");
                        break;
                    }
                }
                ChatCommand::Unknown(detail) => {
                    println!(
                        "\n  {} Unknown command: {}. Type /help for available commands.\n",
                        style("?").yellow().bold(),
                        style(detail).dim()
                    );
                }
            }
            continue;
        }

        let Some(pending) = exchange.submit(&mut lifecycle, &text).await else {
            continue;
        };

        let spinner = thinking_spinner();
        let reply = exchange.generate(&pending).await;
        spinner.finish_and_clear();

        match exchange.complete(&mut lifecycle, pending, reply).await {
            ReplyOutcome::Appended(message) => {
                println!();
                print_message(&message, ASSISTANT);
            }
            ReplyOutcome::Discarded => {}
            ReplyOutcome::Failed(e) => {
                eprintln!("\n  {} {e}", style("!").red().bold());
                eprintln!("  {}", style("Your message was saved. Type a message to retry, /exit to quit.").dim());
            }
        }
    }

    info!(sessions = lifecycle.history().len(), "Chat ended");
    watcher.shutdown().await;
    Ok(())
}
