use crate::auth::gotrue::GoTrueClient;
use crate::auth::provider::AuthProvider;
use crate::auth::session_store::{SessionStore, StorageTarget};
use crate::config::{AppConfig, BackendConfig};
use crate::error::AppError;
use crate::preferences::PreferenceStore;
use crate::store::{RestStore, TableStore};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

/// Errors raised while constructing the backend client
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),

    #[error("Client construction timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Client construction failed: {0}")]
    Construction(String),
}

/// Handle to the hosted backend: table access plus auth
#[derive(Clone)]
pub struct Client {
    pub store: Arc<dyn TableStore>,
    pub auth: Arc<dyn AuthProvider>,
}

impl Client {
    pub fn new(store: Arc<dyn TableStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }
}

/// Builds a [`Client`] for a backend and session storage target.
///
/// This is the only integration point with the backend SDK.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create(
        &self,
        config: &BackendConfig,
        storage: StorageTarget,
    ) -> Result<Client, BootstrapError>;
}

/// Factory for the hosted REST and auth APIs
#[derive(Debug, Default)]
pub struct SupabaseClientFactory;

#[async_trait]
impl ClientFactory for SupabaseClientFactory {
    async fn create(
        &self,
        config: &BackendConfig,
        storage: StorageTarget,
    ) -> Result<Client, BootstrapError> {
        config.validate().map_err(BootstrapError::InvalidConfig)?;

        let url = Url::parse(&config.url)
            .map_err(|e| BootstrapError::InvalidConfig(format!("{}: {}", config.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(BootstrapError::InvalidConfig(format!(
                "unsupported URL scheme: {}",
                url.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BootstrapError::Construction(e.to_string()))?;

        // Table and auth clients share one session so both act as the same user
        let sessions = SessionStore::open(storage).await;
        let store = RestStore::new(http.clone(), config, sessions.clone())
            .map_err(|e| BootstrapError::Construction(e.to_string()))?;
        let auth = GoTrueClient::new(http, config, sessions)
            .map_err(|e| BootstrapError::Construction(e.to_string()))?;

        Ok(Client::new(Arc::new(store), Arc::new(auth)))
    }
}

/// Factory that hands out an already constructed client
pub struct StaticClientFactory {
    client: Client,
}

impl StaticClientFactory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClientFactory for StaticClientFactory {
    async fn create(
        &self,
        _config: &BackendConfig,
        _storage: StorageTarget,
    ) -> Result<Client, BootstrapError> {
        Ok(self.client.clone())
    }
}

/// One-time, shared construction of the backend client.
///
/// Concurrent callers of [`ready`](Self::ready) wait on the same
/// construction. A failed attempt leaves the bootstrap empty so a later call
/// can try again.
pub struct SessionBootstrap {
    backend: BackendConfig,
    session_path: PathBuf,
    preferences: Arc<PreferenceStore>,
    factory: Arc<dyn ClientFactory>,
    client: OnceCell<Client>,
}

impl SessionBootstrap {
    pub fn new(
        config: &AppConfig,
        preferences: Arc<PreferenceStore>,
        factory: Arc<dyn ClientFactory>,
    ) -> Self {
        Self {
            backend: config.backend.clone(),
            session_path: config.session_path(),
            preferences,
            factory,
            client: OnceCell::new(),
        }
    }

    /// Wait for the client, constructing it on first use
    pub async fn ready(&self) -> Result<Client, BootstrapError> {
        self.client
            .get_or_try_init(|| self.construct())
            .await
            .cloned()
    }

    /// Non-failing form of [`ready`](Self::ready): whether a client now exists
    pub async fn initialize(&self) -> bool {
        match self.ready().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Session bootstrap failed: {}", e);
                false
            }
        }
    }

    /// The client if construction already succeeded
    pub fn client(&self) -> Option<Client> {
        self.client.get().cloned()
    }

    pub fn is_ready(&self) -> bool {
        self.client.initialized()
    }

    /// Session storage the saved remember-me preference asks for
    pub async fn storage_target(&self) -> StorageTarget {
        if self.preferences.remember_me().await {
            StorageTarget::Persistent(self.session_path.clone())
        } else {
            StorageTarget::Ephemeral
        }
    }

    /// Build the client if needed and move its session to the storage the
    /// preference now asks for
    pub async fn apply_storage_preference(&self) -> Result<Client, AppError> {
        let client = self.ready().await?;
        client.auth.use_storage(self.storage_target().await).await?;
        Ok(client)
    }

    async fn construct(&self) -> Result<Client, BootstrapError> {
        let storage = self.storage_target().await;
        debug!("Constructing backend client with {:?} session storage", storage);

        let timeout = self.backend.bootstrap_timeout();
        let client = tokio::time::timeout(timeout, self.factory.create(&self.backend, storage))
            .await
            .map_err(|_| BootstrapError::TimedOut(timeout))??;

        info!("Backend client ready for {}", self.backend.url);
        spawn_session_check(client.auth.clone());
        Ok(client)
    }
}

// Report a restored session without holding up callers of `ready`
fn spawn_session_check(auth: Arc<dyn AuthProvider>) {
    tokio::spawn(async move {
        match auth.get_session().await {
            Ok(Some(session)) => info!("Restored session for user {}", session.user.id),
            Ok(None) => debug!("No saved session"),
            Err(e) => warn!("Background session check failed: {}", e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::MemoryAuthProvider;
    use crate::preferences::Preferences;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFactory {
        calls: AtomicUsize,
        delay: Duration,
        storage: std::sync::Mutex<Option<StorageTarget>>,
    }

    impl CountingFactory {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                storage: std::sync::Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ClientFactory for CountingFactory {
        async fn create(
            &self,
            _config: &BackendConfig,
            storage: StorageTarget,
        ) -> Result<Client, BootstrapError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.storage.lock().unwrap() = Some(storage);
            tokio::time::sleep(self.delay).await;
            Ok(Client::new(
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryAuthProvider::new()),
            ))
        }
    }

    fn bootstrap_with(factory: Arc<CountingFactory>, remember_me: bool) -> SessionBootstrap {
        let prefs = Preferences {
            remember_me,
            ..Preferences::default()
        };
        SessionBootstrap::new(
            &AppConfig::default(),
            Arc::new(PreferenceStore::in_memory(prefs)),
            factory,
        )
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_construction() {
        let factory = Arc::new(CountingFactory::new(Duration::from_millis(20)));
        let bootstrap = bootstrap_with(factory.clone(), false);

        let (a, b) = tokio::join!(bootstrap.initialize(), bootstrap.initialize());
        assert!(a && b);
        assert!(bootstrap.initialize().await);
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
        assert!(bootstrap.client().is_some());
    }

    #[tokio::test]
    async fn test_remember_me_selects_persistent_storage() {
        let factory = Arc::new(CountingFactory::new(Duration::ZERO));
        let bootstrap = bootstrap_with(factory.clone(), true);
        bootstrap.ready().await.unwrap();

        let storage = factory.storage.lock().unwrap().clone();
        assert!(matches!(storage, Some(StorageTarget::Persistent(_))));
    }

    #[tokio::test]
    async fn test_slow_factory_times_out_and_can_retry() {
        let factory = Arc::new(CountingFactory::new(Duration::from_millis(200)));
        let mut config = AppConfig::default();
        config.backend.bootstrap_timeout_ms = 10;
        let bootstrap = SessionBootstrap::new(
            &config,
            Arc::new(PreferenceStore::in_memory(Preferences::default())),
            factory.clone(),
        );

        assert!(matches!(bootstrap.ready().await, Err(BootstrapError::TimedOut(_))));
        assert!(!bootstrap.is_ready());
        assert!(!bootstrap.initialize().await);
        assert_eq!(factory.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_supabase_factory_rejects_bad_url() {
        let config = BackendConfig {
            url: "ftp://example.com".to_string(),
            ..BackendConfig::default()
        };
        let result = SupabaseClientFactory.create(&config, StorageTarget::Ephemeral).await;
        assert!(matches!(result, Err(BootstrapError::InvalidConfig(_))));
    }
}
