//! SQLite remote history store.
//!
//! Implements `HistoryStore` from `parley-core`. Each chat session is one
//! row in `chats` holding the JSON session document, owned by a user id.

use chrono::Utc;
use parley_core::storage::history_store::HistoryStore;
use parley_types::chat::{ChatSession, SessionBody, SessionId};
use parley_types::error::StoreError;
use sqlx::Row;
use uuid::Uuid;

use super::format_datetime;
use super::pool::DatabasePool;

/// SQLite-backed implementation of `HistoryStore`.
#[derive(Clone)]
pub struct SqliteHistoryStore {
    pool: DatabasePool,
}

impl SqliteHistoryStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatRow {
    id: String,
    body: String,
}

impl ChatRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            body: row.try_get("body")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, StoreError> {
        let body: SessionBody = serde_json::from_str(&self.body).map_err(|e| {
            StoreError::Serialization(format!("invalid session document {}: {e}", self.id))
        })?;
        Ok(ChatSession::from_body(SessionId(self.id), body))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a driver error onto the store taxonomy.
pub(crate) fn store_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.message().contains("readonly") => {
            StoreError::PermissionDenied(db.message().to_string())
        }
        _ => StoreError::Unreachable(e.to_string()),
    }
}

fn encode_body(body: &SessionBody) -> Result<String, StoreError> {
    serde_json::to_string(body)
        .map_err(|e| StoreError::Serialization(format!("failed to serialize session: {e}")))
}

// ---------------------------------------------------------------------------
// HistoryStore implementation
// ---------------------------------------------------------------------------

impl HistoryStore for SqliteHistoryStore {
    async fn create(&self, user_id: &str, body: &SessionBody) -> Result<SessionId, StoreError> {
        let id = Uuid::now_v7().to_string();
        let json = encode_body(body)?;

        sqlx::query(
            "INSERT INTO chats (id, user_id, body, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(&json)
        .bind(format_datetime(&Utc::now()))
        .bind(format_datetime(&body.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(store_error)?;

        tracing::debug!(session_id = %id, user_id, "Created chat document");
        Ok(SessionId(id))
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ChatSession>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, body FROM chats WHERE user_id = ? ORDER BY updated_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(store_error)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let chat_row = ChatRow::from_row(row).map_err(store_error)?;
            sessions.push(chat_row.into_session()?);
        }
        Ok(sessions)
    }

    async fn update(&self, session_id: &SessionId, body: &SessionBody) -> Result<(), StoreError> {
        let json = encode_body(body)?;

        let result = sqlx::query("UPDATE chats SET body = ?, updated_at = ? WHERE id = ?")
            .bind(&json)
            .bind(format_datetime(&body.updated_at))
            .bind(session_id.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(session_id.clone()));
        }
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM chats WHERE id = ?")
            .bind(session_id.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
