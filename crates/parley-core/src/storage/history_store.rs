//! HistoryStore trait definition.
//!
//! The remote, per-user document collection that holds chat sessions for
//! signed-in identities. Follows the same RPITIT pattern as `SessionStore`.

use parley_types::chat::{ChatSession, SessionBody, SessionId};
use parley_types::error::StoreError;

/// Remote document store for chat sessions.
///
/// Implementations live in parley-infra (e.g., `SqliteHistoryStore`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait HistoryStore: Send + Sync {
    /// Create a new session document for a user. The store assigns the id.
    fn create(
        &self,
        user_id: &str,
        body: &SessionBody,
    ) -> impl std::future::Future<Output = Result<SessionId, StoreError>> + Send;

    /// List a user's sessions, ordered by `updated_at` DESC.
    fn list(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, StoreError>> + Send;

    /// Replace the body of an existing session document.
    ///
    /// Returns `StoreError::NotFound` if no document has this id.
    fn update(
        &self,
        session_id: &SessionId,
        body: &SessionBody,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete a session document. No-op if it does not exist.
    fn delete(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
