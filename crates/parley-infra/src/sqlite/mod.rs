//! SQLite storage layer.
//!
//! The remote document store and the account table, backed by SQLite with
//! WAL mode and split read/write connection pools.

pub mod auth;
pub mod history;
pub mod pool;

use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width RFC 3339 in UTC, so stored timestamps sort as text.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}
