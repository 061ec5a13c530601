//! Top-level owner of the current identity.
//!
//! [`AuthController`] wraps an [`AuthGateway`] and decides what a failed
//! anonymous sign-in means (local guest mode). [`IdentityWatcher`] follows
//! the gateway's auth events in the background until cancelled.

use parley_types::error::AuthError;
use parley_types::event::AuthEvent;
use parley_types::identity::Identity;
use secrecy::SecretString;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::gateway::AuthGateway;

/// Owns the identity the rest of the application is scoped to.
pub struct AuthController<A> {
    gateway: A,
    identity: Option<Identity>,
}

impl<A: AuthGateway> AuthController<A> {
    pub fn new(gateway: A) -> Self {
        Self {
            gateway,
            identity: None,
        }
    }

    pub fn gateway(&self) -> &A {
        &self.gateway
    }

    /// The signed-in identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Sign in with email and password. State is unchanged on error.
    pub async fn sign_in(&mut self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        let identity = self.gateway.sign_in(email, password).await?;
        info!(identity = %identity, "Signed in");
        self.identity = Some(identity.clone());
        Ok(identity)
    }

    /// Create an account and sign it in. State is unchanged on error.
    pub async fn sign_up(&mut self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        let identity = self.gateway.sign_up(email, password).await?;
        info!(identity = %identity, "Account created");
        self.identity = Some(identity.clone());
        Ok(identity)
    }

    /// Continue without an account.
    ///
    /// Tries the gateway's anonymous sign-in first. If that fails the
    /// session continues as a local guest anyway.
    pub async fn continue_as_guest(&mut self) -> Identity {
        let identity = match self.gateway.sign_in_anonymous().await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Anonymous sign-in failed, continuing as local guest");
                Identity::Guest
            }
        };
        self.identity = Some(identity.clone());
        identity
    }

    pub async fn sign_out(&mut self) {
        if let Some(identity) = self.identity.take() {
            info!(identity = %identity, "Signing out");
        }
        self.gateway.sign_out().await;
    }
}

/// Background task mirroring auth events into a `watch` channel.
///
/// Subscribe once at startup; call [`IdentityWatcher::shutdown`] (or
/// cancel the token) on exit.
pub struct IdentityWatcher {
    current: watch::Receiver<Option<Identity>>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl IdentityWatcher {
    /// Start following `events`, seeded with `initial`.
    pub fn spawn(
        mut events: broadcast::Receiver<AuthEvent>,
        initial: Option<Identity>,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, current) = watch::channel(initial);
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Identity watcher cancelled");
                        break;
                    }
                    event = events.recv() => match event {
                        Ok(event) => {
                            debug!(?event, "Auth state changed");
                            tx.send_replace(event.identity().cloned());
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Identity watcher lagged behind auth events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Self {
            current,
            cancel,
            handle,
        }
    }

    /// The identity after the latest observed event.
    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    /// A receiver that is notified on every identity change.
    pub fn changes(&self) -> watch::Receiver<Option<Identity>> {
        self.current.clone()
    }

    /// Stop the background task and wait for it to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Identity watcher task failed");
        }
    }
}
