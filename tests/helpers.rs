#![allow(dead_code)]

use async_trait::async_trait;
use connecthub::auth::{
    AuthUser, BootstrapError, Client, ClientFactory, MemoryAuthProvider, StorageTarget, UserMetadata,
};
use connecthub::models::Booking;
use connecthub::notify::RecordingNotifier;
use connecthub::offline::register_admin_procedures;
use connecthub::preferences::Preferences;
use connecthub::store::{from_rows, tables, to_row, MemoryStore};
use connecthub::{AppConfig, AppContext, BackendConfig, PreferenceStore};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

pub const PASSWORD: &str = "secret-pass-1";

/// Factory handing out one shared in-memory client and recording each call
pub struct RecordingFactory {
    client: Client,
    calls: AtomicUsize,
    targets: Mutex<Vec<StorageTarget>>,
}

impl RecordingFactory {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn targets(&self) -> Vec<StorageTarget> {
        self.targets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClientFactory for RecordingFactory {
    async fn create(
        &self,
        _config: &BackendConfig,
        storage: StorageTarget,
    ) -> Result<Client, BootstrapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().unwrap().push(storage);
        Ok(self.client.clone())
    }
}

/// In-memory backend plus an application context wired to it
pub struct TestBackend {
    pub store: Arc<MemoryStore>,
    pub auth: Arc<MemoryAuthProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub factory: Arc<RecordingFactory>,
    pub ctx: Arc<AppContext>,
    pub data_dir: TempDir,
}

impl TestBackend {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        register_admin_procedures(&store).await;
        let auth = Arc::new(MemoryAuthProvider::new().with_store(store.clone()));
        let client = Client::new(store.clone(), auth.clone());

        let factory = Arc::new(RecordingFactory {
            client,
            calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        });
        let notifier = Arc::new(RecordingNotifier::new());
        let data_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = AppConfig::with_backend(BackendConfig::default())
            .expect("Failed to build test config");
        config.data_dir = data_dir.path().to_path_buf();

        let preferences = Arc::new(PreferenceStore::in_memory(Preferences::default()));
        let ctx = Arc::new(AppContext::with_preferences(
            config,
            preferences,
            factory.clone(),
            notifier.clone(),
        ));

        Self {
            store,
            auth,
            notifier,
            factory,
            ctx,
            data_dir,
        }
    }

    /// Register an account and its `profiles` row
    pub async fn create_user(&self, email: &str, role: &str, agent_status: Option<&str>) -> AuthUser {
        let user = self
            .auth
            .register(
                email,
                PASSWORD,
                UserMetadata {
                    full_name: Some(format!("Test {}", role)),
                    ..UserMetadata::default()
                },
            )
            .await;

        let row = to_row(&json!({
            "id": user.id,
            "full_name": user.user_metadata.full_name,
            "role": role,
            "agent_request_status": agent_status,
        }))
        .unwrap();
        self.store.seed(tables::PROFILES, vec![row]).await;
        user
    }

    pub async fn sign_in(&self, user: &AuthUser) {
        let client = self.ctx.client().await.expect("Client should be ready");
        client
            .auth
            .sign_in_with_password(user.email.as_deref().unwrap(), PASSWORD)
            .await
            .expect("Failed to sign in");
    }

    /// A signed-in traveller
    pub async fn traveller(&self) -> AuthUser {
        let user = self.create_user("traveller@example.com", "user", None).await;
        self.sign_in(&user).await;
        user
    }

    /// A signed-in agent with approved status
    pub async fn approved_agent(&self) -> AuthUser {
        let user = self
            .create_user("agent@example.com", "agent", Some("approved"))
            .await;
        self.sign_in(&user).await;
        user
    }

    /// Seed a booking row and return it decoded
    pub async fn seed_booking(&self, owner: Uuid, agent: Option<Uuid>, status: &str) -> Booking {
        let row = to_row(&json!({
            "user_id": owner,
            "agent_id": agent,
            "location_id": "chitrakote",
            "guests": 2,
            "status": status,
            "status_timeline": [{"status": status, "timestamp": "2024-05-01T10:00:00Z"}],
        }))
        .unwrap();
        let rows = self.store.seed(tables::BOOKINGS, vec![row]).await;
        from_rows::<Booking>(rows).unwrap().remove(0)
    }

    pub async fn bookings(&self) -> Vec<Booking> {
        from_rows(self.store.rows(tables::BOOKINGS).await).unwrap()
    }
}
