use crate::auth::provider::{AuthError, AuthProvider, AuthUser, Session, UserMetadata, UserUpdate};
use crate::auth::session_store::{SessionStore, StorageTarget};
use crate::store::{tables, to_row, MemoryStore};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

struct Account {
    user: AuthUser,
    password: String,
}

/// In-process auth provider.
///
/// When linked to a [`MemoryStore`] it creates the `profiles` row on sign-up
/// the way the hosted project's trigger does.
pub struct MemoryAuthProvider {
    accounts: RwLock<HashMap<String, Account>>,
    sessions: SessionStore,
    store: Option<Arc<MemoryStore>>,
    user_error: RwLock<Option<String>>,
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            sessions: SessionStore::ephemeral(),
            store: None,
            user_error: RwLock::new(None),
        }
    }

    pub fn with_store(mut self, store: Arc<MemoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Create an account directly, bypassing sign-up side effects
    pub async fn register(&self, email: &str, password: &str, metadata: UserMetadata) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            user_metadata: metadata,
        };
        self.accounts.write().await.insert(
            email.to_lowercase(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// Make `get_user` fail with `message` while a session exists
    pub async fn fail_get_user_with(&self, message: &str) {
        *self.user_error.write().await = Some(message.to_string());
    }

    async fn session_user_id(&self) -> Result<Uuid, AuthError> {
        self.sessions
            .current()
            .await
            .map(|s| s.user.id)
            .ok_or(AuthError::NoSession)
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: UserMetadata,
    ) -> Result<AuthUser, AuthError> {
        if self.accounts.read().await.contains_key(&email.to_lowercase()) {
            return Err(AuthError::Rejected {
                status: 422,
                message: "User already registered".to_string(),
            });
        }

        let user = self.register(email, password, metadata).await;

        if let Some(store) = &self.store {
            let profile = json!({
                "id": user.id,
                "full_name": user.user_metadata.full_name,
                "role": "user",
            });
            let row = to_row(&profile).map_err(|e| AuthError::Decode(e.to_string()))?;
            store.seed(tables::PROFILES, vec![row]).await;
        }
        Ok(user)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user = {
            let accounts = self.accounts.read().await;
            match accounts.get(&email.to_lowercase()) {
                Some(account) if account.password == password => account.user.clone(),
                _ => return Err(AuthError::InvalidCredentials),
            }
        };

        let session = Session {
            access_token: format!("memory-{}", Uuid::new_v4()),
            refresh_token: None,
            expires_at: None,
            user,
        };
        self.sessions.save(session.clone()).await?;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sessions.clear().await
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.sessions.current().await)
    }

    async fn use_storage(&self, target: StorageTarget) -> Result<(), AuthError> {
        self.sessions.retarget(target).await
    }

    async fn get_user(&self) -> Result<AuthUser, AuthError> {
        let user_id = self.session_user_id().await?;
        if let Some(message) = self.user_error.read().await.clone() {
            return Err(AuthError::Rejected {
                status: 403,
                message,
            });
        }

        self.accounts
            .read()
            .await
            .values()
            .find(|account| account.user.id == user_id)
            .map(|account| account.user.clone())
            .ok_or(AuthError::NoSession)
    }

    async fn update_user(&self, update: UserUpdate) -> Result<AuthUser, AuthError> {
        let user_id = self.session_user_id().await?;
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .values_mut()
            .find(|account| account.user.id == user_id)
            .ok_or(AuthError::NoSession)?;

        if let Some(password) = update.password {
            account.password = password;
        }
        if let Some(data) = update.data {
            let mut merged = serde_json::to_value(&account.user.user_metadata)?;
            if let Value::Object(target) = &mut merged {
                target.extend(data);
            }
            account.user.user_metadata = serde_json::from_value(merged)?;
        }
        Ok(account.user.clone())
    }
}
