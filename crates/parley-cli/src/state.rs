//! Application state wiring stores and the auth gateway together.
//!
//! AppState holds the concrete adapters used by every command. Core types
//! are generic over store/gateway traits; AppState pins them to the infra
//! implementations.

use std::path::PathBuf;

use anyhow::Context;
use parley_core::auth::gateway::{AuthGateway, OfflineAuthGateway};
use parley_core::chat::session::SessionLifecycle;
use parley_core::storage::session_store::StorageBackend;
use parley_infra::config::{load_config, resolve_remote_url};
use parley_infra::filesystem::blob::FileBlobStore;
use parley_infra::filesystem::resolve_data_dir;
use parley_infra::sqlite::auth::SqliteAuthGateway;
use parley_infra::sqlite::history::SqliteHistoryStore;
use parley_infra::sqlite::pool::DatabasePool;
use parley_types::chat::Personality;
use parley_types::config::ParleyConfig;
use parley_types::error::AuthError;
use parley_types::event::AuthEvent;
use parley_types::identity::Identity;
use secrecy::SecretString;
use tokio::sync::broadcast;

/// Session storage pinned to the infra adapters.
pub type ChatStore = StorageBackend<SqliteHistoryStore, FileBlobStore>;

/// Session lifecycle over [`ChatStore`].
pub type ChatLifecycle = SessionLifecycle<ChatStore>;

/// Auth gateway for this run: the SQLite provider, or offline when the
/// remote store is disabled or failed to open.
pub enum Gateway {
    Sqlite(SqliteAuthGateway),
    Offline(OfflineAuthGateway),
}

impl AuthGateway for Gateway {
    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        match self {
            Gateway::Sqlite(g) => g.sign_up(email, password).await,
            Gateway::Offline(g) => g.sign_up(email, password).await,
        }
    }

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        match self {
            Gateway::Sqlite(g) => g.sign_in(email, password).await,
            Gateway::Offline(g) => g.sign_in(email, password).await,
        }
    }

    async fn sign_in_anonymous(&self) -> Result<Identity, AuthError> {
        match self {
            Gateway::Sqlite(g) => g.sign_in_anonymous().await,
            Gateway::Offline(g) => g.sign_in_anonymous().await,
        }
    }

    async fn sign_out(&self) {
        match self {
            Gateway::Sqlite(g) => g.sign_out().await,
            Gateway::Offline(g) => g.sign_out().await,
        }
    }

    fn current(&self) -> Option<Identity> {
        match self {
            Gateway::Sqlite(g) => g.current(),
            Gateway::Offline(g) => g.current(),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        match self {
            Gateway::Sqlite(g) => g.subscribe(),
            Gateway::Offline(g) => g.subscribe(),
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub data_dir: PathBuf,
    pub config: ParleyConfig,
    /// `None` when the remote store is disabled or could not be opened.
    pub remote: Option<DatabasePool>,
    pub blobs: FileBlobStore,
}

impl AppState {
    /// Initialize the application state: load config, open the remote store.
    ///
    /// A remote store that fails to open is logged and treated as
    /// unreachable; only the data directory itself is required.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;

        let remote = if config.remote_enabled {
            let url = resolve_remote_url(&config, &data_dir);
            match DatabasePool::new(&url).await {
                Ok(pool) => Some(pool),
                Err(e) => {
                    tracing::warn!(error = %e, "Remote store unavailable, history stays on this device");
                    None
                }
            }
        } else {
            tracing::info!("Remote store disabled in config");
            None
        };

        let blobs = FileBlobStore::in_data_dir(&data_dir);

        Ok(Self {
            data_dir,
            config,
            remote,
            blobs,
        })
    }

    /// Build the auth gateway for this run.
    pub fn gateway(&self) -> Gateway {
        match &self.remote {
            Some(pool) => Gateway::Sqlite(
                SqliteAuthGateway::new(pool.clone())
                    .with_max_failed_sign_ins(self.config.max_failed_sign_ins),
            ),
            None => Gateway::Offline(OfflineAuthGateway::new("remote store unavailable")),
        }
    }

    /// Personality for new conversations, unless overridden.
    pub fn personality(&self, requested: Option<Personality>) -> Personality {
        requested.unwrap_or(self.config.default_personality)
    }

    /// Open the session lifecycle for `identity`, picking its backend.
    pub async fn open_lifecycle(&self, identity: Identity, personality: Personality) -> ChatLifecycle {
        let remote = self.remote.clone().map(SqliteHistoryStore::new);
        let store = StorageBackend::select(&identity, remote, self.blobs.clone());
        SessionLifecycle::open(identity, store, personality).await
    }

    /// Release the remote pool.
    pub async fn close(&self) {
        if let Some(pool) = &self.remote {
            pool.close().await;
        }
    }
}
