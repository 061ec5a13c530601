use thiserror::Error;

use crate::chat::SessionId;

/// Errors from the authentication gateway.
///
/// None of these change session state. Each maps to a corrective message
/// via [`AuthError::user_message`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account for '{0}' already exists")]
    AlreadyExists(String),

    #[error("password is too weak (minimum {min_len} characters)")]
    WeakPassword { min_len: usize },

    #[error("invalid email address: '{0}'")]
    InvalidEmail(String),

    #[error("too many failed attempts")]
    RateLimited,

    #[error("auth provider unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("auth provider misconfigured: {0}")]
    Misconfigured(String),
}

impl AuthError {
    /// Message shown to the user to correct the failed action.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            AuthError::AlreadyExists(_) => {
                "Email already exists. Try logging in instead.".to_string()
            }
            AuthError::WeakPassword { min_len } => {
                format!("Password should be at least {min_len} characters")
            }
            AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
            AuthError::RateLimited => {
                "Too many failed attempts. Please try again later.".to_string()
            }
            AuthError::NetworkUnreachable(_) => {
                "Network error. Please check your connection.".to_string()
            }
            AuthError::Misconfigured(_) => {
                "Authentication is not configured. Please use guest mode.".to_string()
            }
        }
    }
}

/// Errors from the history stores (remote document store or local blobs).
///
/// Never surfaced to the user as a blocking failure: the session lifecycle
/// logs them and continues with local state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Input rejected before it becomes a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message is empty")]
    EmptyInput,
}

/// Errors from the response generator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplyError {
    #[error("response generator failed: {0}")]
    Failed(String),
}

/// Errors from session lifecycle operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(SessionId),
}
