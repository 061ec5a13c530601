//! Filesystem adapters for Parley.
//!
//! Data directory resolution and the file-backed local blob store.

pub mod blob;

use std::path::PathBuf;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PARLEY_DATA_DIR";

/// Resolve the Parley data directory.
///
/// Priority:
/// 1. `PARLEY_DATA_DIR` environment variable
/// 2. `~/.parley`
/// 3. `./.parley` when no home directory is known
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    PathBuf::from(".parley")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_data_dir_ends_with_parley() {
        // Only meaningful when the override is not set in the test environment
        if std::env::var(DATA_DIR_ENV).is_err() {
            let dir = resolve_data_dir();
            assert!(dir.ends_with(".parley"));
        }
    }
}
