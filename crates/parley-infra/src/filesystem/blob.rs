//! File-backed implementation of `BlobStore`.
//!
//! One file per key under `{data_dir}/local/`. Writes go to a temp file in
//! the same directory and are renamed into place, so a crash never leaves
//! a half-written history blob.

use std::fmt::Write as _;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parley_core::storage::blob_store::BlobStore;
use parley_types::error::StoreError;
use tempfile::NamedTempFile;

/// Subdirectory of the data dir holding local blobs.
pub const LOCAL_DIR: &str = "local";

/// Blob store that keeps each key in its own JSON file.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Store blobs directly in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store blobs in `{data_dir}/local/`.
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(LOCAL_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Encode a key as a safe file stem.
///
/// ASCII alphanumerics and `_ - @ .` are kept; every other byte becomes
/// `%XX`. A leading `.` is encoded too, so no key maps to a hidden or
/// parent-directory name.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for (i, byte) in key.bytes().enumerate() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'_' | b'-' | b'@')
            || (byte == b'.' && i > 0);
        if keep {
            stem.push(byte as char);
        } else {
            let _ = write!(stem, "%{byte:02X}");
        }
    }
    stem
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> StoreError {
    match e.kind() {
        ErrorKind::PermissionDenied => {
            StoreError::PermissionDenied(format!("{action} {}: {e}", path.display()))
        }
        _ => StoreError::Unreachable(format!("{action} {}: {e}", path.display())),
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("failed to read", &path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error("failed to create", &self.dir, e))?;

        let mut tmp =
            NamedTempFile::new_in(&self.dir).map_err(|e| io_error("failed to create temp file in", &self.dir, e))?;
        tmp.write_all(value.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| io_error("failed to write", tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| io_error("failed to replace", &path, e.error))?;

        tracing::trace!(key, path = %path.display(), bytes = value.len(), "Blob written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("failed to remove", &path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_key_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = FileBlobStore::in_data_dir(tmp.path());
        assert_eq!(store.get("chatbot_history_guest").unwrap(), None);
    }

    #[test]
    fn test_set_get_remove() {
        let tmp = TempDir::new().unwrap();
        let store = FileBlobStore::in_data_dir(tmp.path());

        store.set("chatbot_history_guest", "[]").unwrap();
        assert_eq!(store.get("chatbot_history_guest").unwrap().as_deref(), Some("[]"));
        assert!(tmp.path().join("local/chatbot_history_guest.json").exists());

        store.set("chatbot_history_guest", "[1]").unwrap();
        assert_eq!(store.get("chatbot_history_guest").unwrap().as_deref(), Some("[1]"));

        store.remove("chatbot_history_guest").unwrap();
        assert_eq!(store.get("chatbot_history_guest").unwrap(), None);
        // Removing again is a no-op
        store.remove("chatbot_history_guest").unwrap();
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let store = FileBlobStore::in_data_dir(tmp.path());
        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();

        let entries: Vec<_> = std::fs::read_dir(store.dir()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_file_stem_encoding() {
        assert_eq!(file_stem("chatbot_history_ada@example.com"), "chatbot_history_ada@example.com");
        assert_eq!(file_stem("../etc/passwd"), "%2E.%2Fetc%2Fpasswd");
        assert_eq!(file_stem("a b"), "a%20b");
    }

    #[test]
    fn test_keys_with_path_separators_stay_inside_dir() {
        let tmp = TempDir::new().unwrap();
        let store = FileBlobStore::in_data_dir(tmp.path());

        store.set("../escape", "x").unwrap();

        assert!(!tmp.path().join("escape.json").exists());
        assert_eq!(store.get("../escape").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_file_store_backs_session_history() {
        use parley_core::storage::session_store::LocalSessionStore;
        use parley_types::identity::Identity;

        let tmp = TempDir::new().unwrap();
        let store = LocalSessionStore::new(FileBlobStore::in_data_dir(tmp.path()), &Identity::Guest);
        assert!(store.snapshot().unwrap().is_empty());
        assert!(store.key().ends_with("guest"));
    }
}
