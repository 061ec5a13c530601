//! SQLite auth gateway.
//!
//! Implements `AuthGateway` from `parley-core` against the `users` table.
//! Passwords are stored as Argon2id PHC strings. Repeated failed sign-ins
//! for one email are rate-limited in memory.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use parley_core::auth::events::AuthEvents;
use parley_core::auth::gateway::AuthGateway;
use parley_core::auth::validate::{validate_email, validate_password};
use parley_types::error::AuthError;
use parley_types::event::AuthEvent;
use parley_types::identity::Identity;
use secrecy::{ExposeSecret, SecretString};
use sqlx::Row;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::format_datetime;
use super::pool::DatabasePool;
use crate::crypto::password::{hash_password, verify_password, PasswordError};

/// Default number of failed sign-ins before an email is rate-limited.
pub const DEFAULT_MAX_FAILED_SIGN_INS: u32 = 5;

/// SQLite-backed implementation of `AuthGateway`.
pub struct SqliteAuthGateway {
    pool: DatabasePool,
    events: AuthEvents,
    max_failed_sign_ins: u32,
    failures: Mutex<HashMap<String, u32>>,
}

impl SqliteAuthGateway {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            pool,
            events: AuthEvents::default(),
            max_failed_sign_ins: DEFAULT_MAX_FAILED_SIGN_INS,
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Failed sign-ins allowed per email before `RateLimited` is returned.
    pub fn with_max_failed_sign_ins(mut self, max: u32) -> Self {
        self.max_failed_sign_ins = max;
        self
    }

    fn is_rate_limited(&self, email: &str) -> bool {
        self.failures
            .lock()
            .map(|f| f.get(email).copied().unwrap_or(0) >= self.max_failed_sign_ins)
            .unwrap_or(false)
    }

    fn record_failure(&self, email: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            *failures.entry(email.to_string()).or_insert(0) += 1;
        }
    }

    fn clear_failures(&self, email: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(email);
        }
    }

    async fn password_hash_for(&self, email: &str) -> Result<Option<String>, AuthError> {
        let row = sqlx::query("SELECT password_hash FROM users WHERE email = ? AND anonymous = 0")
            .bind(email)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(unreachable)?;

        match row {
            Some(row) => row.try_get::<Option<String>, _>("password_hash").map_err(unreachable),
            None => Ok(None),
        }
    }
}

fn unreachable(e: sqlx::Error) -> AuthError {
    AuthError::NetworkUnreachable(e.to_string())
}

fn misconfigured(e: PasswordError) -> AuthError {
    AuthError::Misconfigured(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Run Argon2 off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Misconfigured(format!("password task failed: {e}")))?
        .map_err(misconfigured)
}

impl AuthGateway for SqliteAuthGateway {
    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        validate_email(email)?;
        validate_password(password.expose_secret())?;
        let identity = Identity::email(email);
        let email = identity.scope_key().to_string();

        if self.password_hash_for(&email).await?.is_some() {
            return Err(AuthError::AlreadyExists(email));
        }

        let plain = password.expose_secret().to_string();
        let hash = blocking(move || hash_password(&plain)).await?;

        let result = sqlx::query(
            "INSERT INTO users (id, email, password_hash, anonymous, created_at) VALUES (?, ?, ?, 0, ?)",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(&email)
        .bind(&hash)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(AuthError::AlreadyExists(email)),
            Err(e) => return Err(unreachable(e)),
        }

        tracing::info!(email = %email, "Account created");
        self.events.signed_in(identity.clone());
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        validate_email(email)?;
        let identity = Identity::email(email);
        let email = identity.scope_key().to_string();

        if self.is_rate_limited(&email) {
            tracing::warn!(email = %email, "Sign-in rate limited");
            return Err(AuthError::RateLimited);
        }

        let verified = match self.password_hash_for(&email).await? {
            Some(hash) => {
                let plain = password.expose_secret().to_string();
                blocking(move || verify_password(&plain, &hash)).await?
            }
            None => false,
        };

        if !verified {
            self.record_failure(&email);
            tracing::debug!(email = %email, "Sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        }

        self.clear_failures(&email);
        self.events.signed_in(identity.clone());
        Ok(identity)
    }

    async fn sign_in_anonymous(&self) -> Result<Identity, AuthError> {
        sqlx::query("INSERT INTO users (id, email, password_hash, anonymous, created_at) VALUES (?, NULL, NULL, 1, ?)")
            .bind(Uuid::now_v7().to_string())
            .bind(format_datetime(&Utc::now()))
            .execute(&self.pool.writer)
            .await
            .map_err(unreachable)?;

        self.events.signed_in(Identity::Guest);
        Ok(Identity::Guest)
    }

    async fn sign_out(&self) {
        self.events.signed_out();
    }

    fn current(&self) -> Option<Identity> {
        self.events.current()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
