//! Session lifecycle and port definitions for Parley.
//!
//! This crate defines the "ports" (store, generator, and auth traits) that the
//! infrastructure layer implements, plus the session lifecycle manager and the
//! message exchange pipeline. It depends only on `parley-types` -- never on
//! `parley-infra` or any database/IO crate.

pub mod auth;
pub mod chat;
pub mod exchange;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
