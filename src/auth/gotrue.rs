use crate::auth::provider::{AuthError, AuthProvider, AuthUser, Session, UserMetadata, UserUpdate};
use crate::auth::session_store::{SessionStore, StorageTarget};
use crate::config::BackendConfig;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self.expires_at.or_else(|| {
            self.expires_in
                .map(|secs| chrono::Utc::now().timestamp() + secs)
        });
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Client for the hosted auth API
pub struct GoTrueClient {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
    sessions: SessionStore,
}

impl GoTrueClient {
    pub fn new(
        http: reqwest::Client,
        config: &BackendConfig,
        sessions: SessionStore,
    ) -> Result<Self, AuthError> {
        let base = Url::parse(&config.url)
            .and_then(|project| project.join("auth/v1/"))
            .map_err(|e| AuthError::Decode(format!("invalid backend URL {}: {}", config.url, e)))?;

        Ok(Self {
            http,
            base,
            anon_key: config.anon_key.clone(),
            sessions,
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, AuthError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        Ok(self.http.request(method, url).header("apikey", &self.anon_key))
    }

    async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, AuthError> {
        let token = self.sessions.access_token().await.ok_or(AuthError::NoSession)?;
        Ok(self.request(method, path)?.bearer_auth(token))
    }

    /// Exchange the refresh token of an expired session for a new one.
    /// Without a usable refresh token the session is dropped.
    async fn refresh(&self, expired: Session) -> Result<Option<Session>, AuthError> {
        let Some(refresh_token) = expired.refresh_token.as_deref() else {
            debug!("Session for {} expired without a refresh token", expired.user.id);
            self.sessions.clear().await?;
            return Ok(None);
        };

        let builder = self
            .request(Method::POST, "token")?
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));

        let token = match Self::send(builder).await {
            Ok(response) => response.json::<TokenResponse>().await.map_err(AuthError::from),
            Err(e) => Err(e),
        };

        match token {
            Ok(token) => {
                let session = token.into_session();
                info!("Refreshed session for {}", session.user.id);
                self.sessions.save(session.clone()).await?;
                Ok(Some(session))
            }
            Err(e) => {
                warn!("Session refresh failed, signing out locally: {}", e);
                self.sessions.clear().await?;
                Ok(None)
            }
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response, AuthError> {
        let response = builder.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = ["error_description", "msg", "message", "error"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| format!("auth request failed with HTTP {}", status));

        Err(AuthError::Rejected { status, message })
    }
}

#[async_trait]
impl AuthProvider for GoTrueClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: UserMetadata,
    ) -> Result<AuthUser, AuthError> {
        let builder = self
            .request(Method::POST, "signup")?
            .json(&json!({ "email": email, "password": password, "data": metadata }));
        let body: Value = Self::send(builder).await?.json().await?;

        // Auto-confirmed projects answer with a full session
        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body)?;
            let session = token.into_session();
            let user = session.user.clone();
            self.sessions.save(session).await?;
            return Ok(user);
        }

        let user_value = body.get("user").cloned().unwrap_or(body);
        let user: AuthUser = serde_json::from_value(user_value)?;
        info!("Signed up {}; awaiting email confirmation", user.id);
        Ok(user)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let builder = self
            .request(Method::POST, "token")?
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));

        let token: TokenResponse = match Self::send(builder).await {
            Ok(response) => response.json().await?,
            Err(AuthError::Rejected { status: 400, .. }) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e),
        };

        let session = token.into_session();
        self.sessions.save(session.clone()).await?;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let remote = match self.authorized(Method::POST, "logout").await {
            Ok(builder) => Self::send(builder).await.map(|_| ()),
            Err(AuthError::NoSession) => Ok(()),
            Err(e) => Err(e),
        };

        // The local session is dropped even when the remote call fails
        self.sessions.clear().await?;
        if let Err(e) = &remote {
            warn!("Remote sign-out failed: {}", e);
        }
        remote
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        match self.sessions.current().await {
            Some(session) if session.is_expired(chrono::Utc::now().timestamp()) => {
                self.refresh(session).await
            }
            current => Ok(current),
        }
    }

    async fn use_storage(&self, target: StorageTarget) -> Result<(), AuthError> {
        self.sessions.retarget(target).await
    }

    async fn get_user(&self) -> Result<AuthUser, AuthError> {
        let builder = self.authorized(Method::GET, "user").await?;
        let user: AuthUser = Self::send(builder).await?.json().await?;
        debug!("Fetched user {}", user.id);
        Ok(user)
    }

    async fn update_user(&self, update: UserUpdate) -> Result<AuthUser, AuthError> {
        let builder = self.authorized(Method::PUT, "user").await?.json(&update);
        let user: AuthUser = Self::send(builder).await?.json().await?;

        if let Some(mut session) = self.sessions.current().await {
            session.user = user.clone();
            self.sessions.save(session).await?;
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve_once;
    use uuid::Uuid;

    fn expired_session(refresh_token: Option<&str>) -> Session {
        Session {
            access_token: "EXPIRED-TOKEN".to_string(),
            refresh_token: refresh_token.map(str::to_string),
            expires_at: Some(chrono::Utc::now().timestamp() - 3600),
            user: AuthUser {
                id: Uuid::new_v4(),
                email: Some("returning@example.com".to_string()),
                user_metadata: UserMetadata::default(),
            },
        }
    }

    fn client_for(url: &str, sessions: SessionStore) -> GoTrueClient {
        let config = BackendConfig {
            url: url.to_string(),
            anon_key: "anon-key".to_string(),
            ..BackendConfig::default()
        };
        GoTrueClient::new(reqwest::Client::new(), &config, sessions).unwrap()
    }

    #[test]
    fn test_token_response_derives_expiry_from_expires_in() {
        let raw = json!({
            "access_token": "abc",
            "refresh_token": "def",
            "expires_in": 3600,
            "user": { "id": "7a6f2d8e-1c7b-4a55-9d36-0f1b8e4c2a11", "email": "a@b.co" }
        });
        let token: TokenResponse = serde_json::from_value(raw).unwrap();
        let session = token.into_session();

        let now = chrono::Utc::now().timestamp();
        let expires_at = session.expires_at.unwrap();
        assert!(expires_at > now + 3500 && expires_at <= now + 3600);
        assert_eq!(session.user.email.as_deref(), Some("a@b.co"));
    }

    #[tokio::test]
    async fn test_get_user_without_session_reports_no_session() {
        let client = GoTrueClient::new(
            reqwest::Client::new(),
            &BackendConfig::default(),
            SessionStore::ephemeral(),
        )
        .unwrap();

        assert!(matches!(client.get_user().await, Err(AuthError::NoSession)));
        assert!(client.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_refreshed() {
        let (url, request) = serve_once(
            "200 OK",
            r#"{"access_token":"FRESH-TOKEN","refresh_token":"r2","expires_in":3600,
                "user":{"id":"7a6f2d8e-1c7b-4a55-9d36-0f1b8e4c2a11"}}"#,
        )
        .await;
        let sessions = SessionStore::ephemeral();
        sessions.save(expired_session(Some("r1"))).await.unwrap();
        let client = client_for(&url, sessions.clone());

        let session = client.get_session().await.unwrap().expect("session should be refreshed");

        assert_eq!(session.access_token, "FRESH-TOKEN");
        assert_eq!(sessions.access_token().await.as_deref(), Some("FRESH-TOKEN"));
        let raw = request.await.unwrap();
        assert!(raw.contains("grant_type=refresh_token"));
        assert!(raw.contains("\"refresh_token\":\"r1\""));
    }

    #[tokio::test]
    async fn test_rejected_refresh_drops_saved_session() {
        let (url, _request) =
            serve_once("400 Bad Request", r#"{"error_description":"Invalid Refresh Token"}"#).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let sessions = SessionStore::open(StorageTarget::Persistent(path.clone())).await;
        sessions.save(expired_session(Some("revoked"))).await.unwrap();
        let client = client_for(&url, sessions.clone());

        assert!(client.get_session().await.unwrap().is_none());
        assert!(sessions.current().await.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_expired_session_without_refresh_token_is_dropped() {
        let sessions = SessionStore::ephemeral();
        sessions.save(expired_session(None)).await.unwrap();
        let client = client_for("http://127.0.0.1:9/", sessions.clone());

        assert!(client.get_session().await.unwrap().is_none());
        assert!(matches!(client.get_user().await, Err(AuthError::NoSession)));
    }
}
