//! AuthGateway trait definition.
//!
//! The gateway verifies credentials and issues an [`Identity`]. Every
//! successful sign-in and every sign-out is broadcast as an
//! [`AuthEvent`] to subscribers.
//!
//! The persistent implementation lives in parley-infra
//! (`SqliteAuthGateway`). [`OfflineAuthGateway`] stands in when no provider
//! is configured.

use parley_types::error::AuthError;
use parley_types::event::AuthEvent;
use parley_types::identity::Identity;
use secrecy::SecretString;
use tokio::sync::broadcast;

use super::events::AuthEvents;

/// Trait for authentication providers.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait AuthGateway: Send + Sync {
    /// Register a new account and sign it in.
    fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl std::future::Future<Output = Result<Identity, AuthError>> + Send;

    /// Verify credentials for an existing account.
    fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl std::future::Future<Output = Result<Identity, AuthError>> + Send;

    /// Start an anonymous session. Always yields [`Identity::Guest`] on success.
    fn sign_in_anonymous(
        &self,
    ) -> impl std::future::Future<Output = Result<Identity, AuthError>> + Send;

    /// End the current session.
    fn sign_out(&self) -> impl std::future::Future<Output = ()> + Send;

    /// Identity from the most recent auth-state change.
    fn current(&self) -> Option<Identity>;

    /// Receive every future auth-state change.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Gateway used when no auth provider is reachable.
///
/// Account operations fail with `NetworkUnreachable`; anonymous sign-in
/// succeeds so the application can run in local guest mode.
#[derive(Debug, Clone, Default)]
pub struct OfflineAuthGateway {
    events: AuthEvents,
    reason: String,
}

impl OfflineAuthGateway {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            events: AuthEvents::default(),
            reason: reason.into(),
        }
    }

    fn unreachable(&self) -> AuthError {
        AuthError::NetworkUnreachable(self.reason.clone())
    }
}

impl AuthGateway for OfflineAuthGateway {
    async fn sign_up(&self, _email: &str, _password: &SecretString) -> Result<Identity, AuthError> {
        Err(self.unreachable())
    }

    async fn sign_in(&self, _email: &str, _password: &SecretString) -> Result<Identity, AuthError> {
        Err(self.unreachable())
    }

    async fn sign_in_anonymous(&self) -> Result<Identity, AuthError> {
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
