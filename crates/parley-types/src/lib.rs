//! Shared domain types for Parley.
//!
//! This crate contains the domain types used across the Parley chat client:
//! identities, messages, chat sessions, auth events, configuration, and their
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod event;
pub mod identity;
