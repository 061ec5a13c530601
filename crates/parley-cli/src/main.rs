//! Parley CLI entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, initializes logging and the stores, then
//! dispatches to the chat loop or a session command.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use parley_core::auth::controller::AuthController;
use parley_observe::{init_tracing, shutdown_tracing, TracingOptions};

use cli::auth::{authenticate, mode_from_flags, prompt_mode};
use cli::chat::loop_runner::{run_chat_loop, ChatOptions};
use cli::{Cli, Commands, SessionAction};
use state::AppState;

/// Set to export spans through OpenTelemetry (stdout exporter).
const OTEL_ENV: &str = "PARLEY_OTEL";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = TracingOptions::from_verbosity(cli.verbose, cli.quiet)
        .with_json(cli.json)
        .with_otel(std::env::var_os(OTEL_ENV).is_some());
    init_tracing(&options).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let result = dispatch(&state, cli).await;

    state.close().await;
    shutdown_tracing();
    result
}

async fn dispatch(state: &AppState, cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Chat {
            who,
            signup,
            personality,
            session,
        } => {
            let options = ChatOptions {
                who,
                signup,
                personality,
                session,
            };
            run_chat_loop(state, options).await
        }

        Commands::Sessions { who, action } => {
            let mut controller = AuthController::new(state.gateway());
            let mode = match mode_from_flags(&who, false) {
                Some(mode) => mode,
                None => prompt_mode()?,
            };
            let identity = authenticate(&mut controller, mode, false).await?;
            let mut lifecycle = state.open_lifecycle(identity, state.personality(None)).await;

            match action {
                SessionAction::List => cli::session::list_sessions(&lifecycle, cli.json),
                SessionAction::Show { id } => cli::session::show_session(&lifecycle, &id, cli.json),
                SessionAction::Delete { id, force } => {
                    cli::session::delete_session(&mut lifecycle, &id, force, cli.json).await
                }
            }
        }

        // Handled before state initialization
        Commands::Completions { .. } => Ok(()),
    }
}
