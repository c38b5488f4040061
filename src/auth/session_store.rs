use crate::auth::provider::{AuthError, Session};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Where the current session is kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    /// Written to a JSON file and restored by the next run
    Persistent(PathBuf),
    /// Held in memory for the lifetime of this process only
    Ephemeral,
}

/// Shared holder of the signed-in session.
///
/// The auth client writes it and the table client reads the access token
/// from it, so both see the same identity. Clones share the session and the
/// storage target.
#[derive(Debug, Clone)]
pub struct SessionStore {
    current: Arc<RwLock<Option<Session>>>,
    target: Arc<RwLock<StorageTarget>>,
}

impl SessionStore {
    /// Open a store, restoring a saved session for persistent targets
    pub async fn open(target: StorageTarget) -> Self {
        let restored = match &target {
            StorageTarget::Persistent(path) => read_session(path).await,
            StorageTarget::Ephemeral => None,
        };

        Self {
            current: Arc::new(RwLock::new(restored)),
            target: Arc::new(RwLock::new(target)),
        }
    }

    pub fn ephemeral() -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            target: Arc::new(RwLock::new(StorageTarget::Ephemeral)),
        }
    }

    pub async fn target(&self) -> StorageTarget {
        self.target.read().await.clone()
    }

    /// Move the session to `target`.
    ///
    /// A live session is written to the new location and the old session
    /// file, if any, is removed.
    pub async fn retarget(&self, target: StorageTarget) -> Result<(), AuthError> {
        let mut current_target = self.target.write().await;
        if *current_target == target {
            return Ok(());
        }

        if let Some(session) = self.current.read().await.as_ref() {
            write_target(&target, session).await?;
        }
        if let StorageTarget::Persistent(old) = &*current_target {
            remove_file(old).await?;
        }

        debug!("Session storage moved to {:?}", target);
        *current_target = target;
        Ok(())
    }

    /// The stored session, expired or not
    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    /// Access token of the stored session while it is still valid
    pub async fn access_token(&self) -> Option<String> {
        let now = chrono::Utc::now().timestamp();
        self.current
            .read()
            .await
            .as_ref()
            .filter(|s| !s.is_expired(now))
            .map(|s| s.access_token.clone())
    }

    pub async fn save(&self, session: Session) -> Result<(), AuthError> {
        let target = self.target.read().await;
        write_target(&target, &session).await?;
        *self.current.write().await = Some(session);
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), AuthError> {
        let target = self.target.read().await;
        *self.current.write().await = None;

        if let StorageTarget::Persistent(path) = &*target {
            remove_file(path).await?;
        }
        Ok(())
    }
}

async fn write_target(target: &StorageTarget, session: &Session) -> Result<(), AuthError> {
    let StorageTarget::Persistent(path) = target else {
        return Ok(());
    };

    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
    }
    let json = serde_json::to_vec_pretty(session)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| AuthError::Storage(e.to_string()))
}

async fn remove_file(path: &Path) -> Result<(), AuthError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AuthError::Storage(e.to_string())),
    }
}

async fn read_session(path: &Path) -> Option<Session> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("No saved session at {:?}: {}", path, e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!("Ignoring unreadable saved session {:?}: {}", path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::{AuthUser, UserMetadata};
    use uuid::Uuid;

    fn session() -> Session {
        Session {
            access_token: "token-1".to_string(),
            refresh_token: None,
            expires_at: None,
            user: AuthUser {
                id: Uuid::new_v4(),
                email: Some("meera@example.com".to_string()),
                user_metadata: UserMetadata::default(),
            },
        }
    }

    #[tokio::test]
    async fn test_persistent_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::open(StorageTarget::Persistent(path.clone())).await;
        store.save(session()).await.unwrap();

        let reopened = SessionStore::open(StorageTarget::Persistent(path.clone())).await;
        assert_eq!(reopened.access_token().await.as_deref(), Some("token-1"));

        reopened.clear().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_ephemeral_session_is_not_written() {
        let store = SessionStore::ephemeral();
        store.save(session()).await.unwrap();
        assert!(store.current().await.is_some());
        assert_eq!(store.target().await, StorageTarget::Ephemeral);
    }

    #[tokio::test]
    async fn test_retarget_moves_live_session_to_file_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::ephemeral();
        let reader = store.clone();
        store.save(session()).await.unwrap();

        store
            .retarget(StorageTarget::Persistent(path.clone()))
            .await
            .unwrap();
        assert!(path.exists());
        assert_eq!(reader.target().await, StorageTarget::Persistent(path.clone()));

        store.retarget(StorageTarget::Ephemeral).await.unwrap();
        assert!(!path.exists());
        assert_eq!(reader.access_token().await.as_deref(), Some("token-1"));
    }

    #[tokio::test]
    async fn test_expired_session_yields_no_access_token() {
        let store = SessionStore::ephemeral();
        let mut expired = session();
        expired.expires_at = Some(chrono::Utc::now().timestamp() - 3600);
        store.save(expired).await.unwrap();

        assert!(store.access_token().await.is_none());
        assert!(store.current().await.is_some());
    }

    #[tokio::test]
    async fn test_corrupt_session_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = SessionStore::open(StorageTarget::Persistent(path)).await;
        assert!(store.current().await.is_none());
    }
}
