//! ConnectHub client library
//!
//! Session bootstrap, auth status resolution, route gating and the page
//! controllers of the ConnectHub tourism and booking platform.

pub mod auth;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod notify;
pub mod offline;
pub mod preferences;
pub mod repositories;
pub mod services;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use auth::{AuthResolver, AuthStatus, Client, ClientFactory, Page, RouteGate, SessionBootstrap};
pub use config::{AppConfig, BackendConfig};
pub use error::{AppError, AppResult};
pub use notify::{Notifier, Toast};
pub use preferences::PreferenceStore;

use std::sync::Arc;

/// Everything a page controller needs, passed explicitly
pub struct AppContext {
    pub config: AppConfig,
    pub preferences: Arc<PreferenceStore>,
    pub bootstrap: Arc<SessionBootstrap>,
    pub resolver: Arc<AuthResolver>,
    pub gate: Arc<RouteGate>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppContext {
    /// Build a context, loading preferences from the configured data directory
    pub async fn new(
        config: AppConfig,
        factory: Arc<dyn ClientFactory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let preferences = Arc::new(PreferenceStore::load(config.preferences_path()).await);
        Self::with_preferences(config, preferences, factory, notifier)
    }

    pub fn with_preferences(
        config: AppConfig,
        preferences: Arc<PreferenceStore>,
        factory: Arc<dyn ClientFactory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let bootstrap = Arc::new(SessionBootstrap::new(&config, preferences.clone(), factory));
        let resolver = Arc::new(AuthResolver::new(bootstrap.clone()));
        let gate = Arc::new(RouteGate::new(resolver.clone(), notifier.clone()));

        Self {
            config,
            preferences,
            bootstrap,
            resolver,
            gate,
            notifier,
        }
    }

    /// The backend client, constructing it on first use
    pub async fn client(&self) -> AppResult<Client> {
        Ok(self.bootstrap.ready().await?)
    }

    pub fn notify(&self, toast: Toast) {
        self.notifier.notify(toast);
    }
}
