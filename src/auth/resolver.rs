use crate::auth::bootstrap::{Client, SessionBootstrap};
use crate::auth::gate::{role_for, Role};
use crate::auth::provider::{AuthError, AuthUser};
use crate::models::{AgentProfile, AgentRequestStatus, Profile};
use crate::repositories::{AgentProfileRepository, ProfileRepository};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Signed-in user enriched with their profile rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUser {
    #[serde(flatten)]
    pub user: AuthUser,
    pub profile: Option<Profile>,
    pub agent_profile: Option<AgentProfile>,
}

impl SessionUser {
    pub fn new(user: AuthUser) -> Self {
        Self {
            user,
            profile: None,
            agent_profile: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref()
    }

    pub fn role(&self) -> Role {
        role_for(self)
    }

    /// Agent whose application has been approved
    pub fn is_approved_agent(&self) -> bool {
        self.role() == Role::Agent
            && self
                .profile
                .as_ref()
                .and_then(Profile::agent_status)
                == Some(AgentRequestStatus::Approved)
    }

    pub fn display_name(&self) -> String {
        self.user.display_name()
    }

    pub fn initials(&self) -> String {
        self.user.initials()
    }
}

/// Outcome of resolving the current visitor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthStatus {
    pub is_authenticated: bool,
    pub user: Option<SessionUser>,
}

impl AuthStatus {
    pub fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            user: None,
        }
    }

    pub fn signed_in(user: SessionUser) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
        }
    }
}

/// Resolves who is signed in.
///
/// A missing session is the normal state for visitors and is never
/// reported as an error.
pub struct AuthResolver {
    bootstrap: Arc<SessionBootstrap>,
}

impl AuthResolver {
    pub fn new(bootstrap: Arc<SessionBootstrap>) -> Self {
        Self { bootstrap }
    }

    pub fn bootstrap(&self) -> &Arc<SessionBootstrap> {
        &self.bootstrap
    }

    /// The signed-in account, without profile enrichment
    pub async fn current_user(&self) -> Option<AuthUser> {
        self.resolve().await.map(|(_, user)| user)
    }

    pub async fn is_logged_in(&self) -> bool {
        self.current_user().await.is_some()
    }

    /// Signed-in user with profile and agent profile attached
    pub async fn status(&self) -> AuthStatus {
        let Some((client, user)) = self.resolve().await else {
            return AuthStatus::anonymous();
        };

        let user = enrich(&client, user).await;
        AuthStatus::signed_in(user)
    }

    async fn resolve(&self) -> Option<(Client, AuthUser)> {
        let client = match self.bootstrap.ready().await {
            Ok(client) => client,
            Err(e) => {
                warn!("Backend client unavailable: {}", e);
                return None;
            }
        };

        match client.auth.get_session().await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!("No active session");
                return None;
            }
            Err(e) => {
                error!("Failed to read session: {}", e);
                return None;
            }
        }

        match client.auth.get_user().await {
            Ok(user) => Some((client, user)),
            Err(e) if e.is_missing_sub_claim() || matches!(e, AuthError::NoSession) => {
                debug!("Treating stale session as signed out: {}", e);
                None
            }
            Err(e) => {
                error!("Get user error: {}", e);
                None
            }
        }
    }
}

/// Attach profile rows; lookups run together and failures read as "no row"
async fn enrich(client: &Client, user: AuthUser) -> SessionUser {
    let profiles = ProfileRepository::new(client.store.clone());
    let agent_profiles = AgentProfileRepository::new(client.store.clone());

    let (profile, agent_profile) = futures::join!(
        profiles.find_by_id(user.id),
        agent_profiles.find_by_user(user.id)
    );

    SessionUser {
        profile: profile.unwrap_or_else(|e| {
            debug!("No profile for {}: {}", user.id, e);
            None
        }),
        agent_profile: agent_profile.unwrap_or_else(|e| {
            debug!("No agent profile for {}: {}", user.id, e);
            None
        }),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::bootstrap::StaticClientFactory;
    use crate::auth::memory::MemoryAuthProvider;
    use crate::auth::provider::{AuthProvider, UserMetadata};
    use crate::config::AppConfig;
    use crate::preferences::{PreferenceStore, Preferences};
    use crate::store::{tables, to_row, MemoryStore};
    use serde_json::json;

    async fn resolver_for(store: Arc<MemoryStore>, auth: Arc<MemoryAuthProvider>) -> AuthResolver {
        let client = Client::new(store, auth);
        let bootstrap = SessionBootstrap::new(
            &AppConfig::default(),
            Arc::new(PreferenceStore::in_memory(Preferences::default())),
            Arc::new(StaticClientFactory::new(client)),
        );
        AuthResolver::new(Arc::new(bootstrap))
    }

    #[tokio::test]
    async fn test_visitor_without_session_is_anonymous() {
        let resolver = resolver_for(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryAuthProvider::new()),
        )
        .await;

        assert_eq!(resolver.status().await, AuthStatus::anonymous());
        assert!(!resolver.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_missing_sub_claim_resolves_to_signed_out() {
        let auth = Arc::new(MemoryAuthProvider::new());
        auth.register("a@example.com", "password1", UserMetadata::default()).await;
        auth.sign_in_with_password("a@example.com", "password1").await.unwrap();
        auth.fail_get_user_with("invalid claim: missing sub claim").await;

        let resolver = resolver_for(Arc::new(MemoryStore::new()), auth).await;
        assert!(!resolver.status().await.is_authenticated);
    }

    #[tokio::test]
    async fn test_status_attaches_profiles_and_survives_enrichment_failure() {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(MemoryAuthProvider::new());
        let user = auth.register("agent@example.com", "password1", UserMetadata::default()).await;
        auth.sign_in_with_password("agent@example.com", "password1").await.unwrap();
        store
            .seed(
                tables::PROFILES,
                vec![to_row(&json!({
                    "id": user.id,
                    "role": "agent",
                    "agent_request_status": "approved"
                }))
                .unwrap()],
            )
            .await;
        store.fail_table(tables::AGENT_PROFILES).await;

        let resolver = resolver_for(store, auth).await;
        let status = resolver.status().await;
        let session_user = status.user.unwrap();

        assert!(status.is_authenticated);
        assert_eq!(session_user.role(), Role::Agent);
        assert!(session_user.is_approved_agent());
        assert!(session_user.agent_profile.is_none());
    }
}
