//! Infrastructure implementations for Parley.
//!
//! Adapters for the ports defined in `parley-core`: the SQLite-backed
//! remote document store and auth gateway, the file-backed blob store, and
//! configuration loading.

pub mod config;
pub mod crypto;
pub mod filesystem;
pub mod sqlite;
