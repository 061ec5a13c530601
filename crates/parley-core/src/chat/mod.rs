//! Chat session lifecycle for Parley.
//!
//! `SessionManager` owns the active conversation and the history index for
//! one identity, and writes every change through a `SessionStore`.

pub mod clock;
pub mod session;
