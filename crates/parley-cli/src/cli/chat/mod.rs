//! Interactive CLI chat for Parley.
//!
//! Implements the chat loop: thinking spinner, welcome banner, slash
//! commands and session persistence. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
