//! Storage abstractions for Parley.
//!
//! Defines the remote document store and local blob store traits, and the
//! single `SessionStore` capability the session lifecycle writes through.
//! Remote and blob implementations live in parley-infra.

pub mod blob_store;
pub mod history_store;
pub mod session_store;
