use crate::auth::SessionStore;
use crate::config::BackendConfig;
use crate::store::{Query, Row, StoreError, TableStore};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Error payload returned by the REST layer
#[derive(Debug, Default, Deserialize)]
struct RemoteErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Table store backed by the hosted REST API.
///
/// Requests carry the project key plus the signed-in user's access token
/// (falling back to the key itself), so row-level security applies per user.
pub struct RestStore {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
    sessions: SessionStore,
}

impl RestStore {
    pub fn new(
        http: reqwest::Client,
        config: &BackendConfig,
        sessions: SessionStore,
    ) -> Result<Self, StoreError> {
        let project = Url::parse(&config.url)
            .map_err(|e| StoreError::Config(format!("invalid backend URL {}: {}", config.url, e)))?;
        let base = project
            .join("rest/v1/")
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base,
            anon_key: config.anon_key.clone(),
            sessions,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base
            .join(path)
            .map_err(|e| StoreError::Config(format!("invalid path {}: {}", path, e)))
    }

    async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .sessions
            .access_token()
            .await
            .unwrap_or_else(|| self.anon_key.clone());

        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = builder.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let parsed: RemoteErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let message = parsed
            .message
            .or(parsed.details)
            .unwrap_or_else(|| if body.is_empty() { format!("HTTP {}", status) } else { body });

        Err(StoreError::Remote {
            status,
            code: parsed.code,
            message,
        })
    }

    async fn read_rows(response: Response) -> Result<Vec<Row>, StoreError> {
        let value: Value = response.json().await?;
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(StoreError::Decode(format!("expected a row, got {}", other))),
                })
                .collect(),
            Value::Object(row) => Ok(vec![row]),
            Value::Null => Ok(Vec::new()),
            other => Err(StoreError::Decode(format!("expected rows, got {}", other))),
        }
    }
}

#[async_trait]
impl TableStore for RestStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError> {
        debug!("select from {} {:?}", table, query.to_params());
        let url = self.endpoint(table)?;
        let builder = self
            .request(Method::GET, url)
            .await
            .query(&[("select", "*")])
            .query(&query.to_params());

        let response = self.send(builder).await?;
        Self::read_rows(response).await
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        debug!("insert {} row(s) into {}", rows.len(), table);
        let url = self.endpoint(table)?;
        let builder = self
            .request(Method::POST, url)
            .await
            .header("Prefer", "return=representation")
            .json(&rows);

        let response = self.send(builder).await?;
        Self::read_rows(response).await
    }

    async fn update(&self, table: &str, patch: Row, query: &Query) -> Result<Vec<Row>, StoreError> {
        debug!("update {} {:?}", table, query.to_params());
        let url = self.endpoint(table)?;
        let builder = self
            .request(Method::PATCH, url)
            .await
            .header("Prefer", "return=representation")
            .query(&query.to_params())
            .json(&patch);

        let response = self.send(builder).await?;
        Self::read_rows(response).await
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<usize, StoreError> {
        debug!("delete from {} {:?}", table, query.to_params());
        let url = self.endpoint(table)?;
        let builder = self
            .request(Method::DELETE, url)
            .await
            .header("Prefer", "return=representation")
            .query(&query.to_params());

        let response = self.send(builder).await?;
        Ok(Self::read_rows(response).await?.len())
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, StoreError> {
        debug!("rpc {}", function);
        let url = self.endpoint(&format!("rpc/{}", function))?;
        let builder = self.request(Method::POST, url).await.json(&args);

        let response = self.send(builder).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve_once;

    #[test]
    fn test_endpoints_are_rooted_under_rest_v1() {
        let config = BackendConfig {
            url: "https://project.example.co".to_string(),
            ..BackendConfig::default()
        };
        let store = RestStore::new(reqwest::Client::new(), &config, SessionStore::ephemeral()).unwrap();

        assert_eq!(
            store.endpoint("bookings").unwrap().as_str(),
            "https://project.example.co/rest/v1/bookings"
        );
        assert_eq!(
            store.endpoint("rpc/admin_set_agent_status").unwrap().as_str(),
            "https://project.example.co/rest/v1/rpc/admin_set_agent_status"
        );
    }

    #[test]
    fn test_invalid_url_is_a_config_error() {
        let config = BackendConfig {
            url: "not a url".to_string(),
            ..BackendConfig::default()
        };
        let result = RestStore::new(reqwest::Client::new(), &config, SessionStore::ephemeral());
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_expired_session_falls_back_to_project_key() {
        use crate::auth::{AuthUser, Session, StorageTarget, UserMetadata};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let saved = SessionStore::open(StorageTarget::Persistent(path.clone())).await;
        saved
            .save(Session {
                access_token: "EXPIRED-TOKEN".to_string(),
                refresh_token: None,
                expires_at: Some(chrono::Utc::now().timestamp() - 3600),
                user: AuthUser {
                    id: uuid::Uuid::new_v4(),
                    email: None,
                    user_metadata: UserMetadata::default(),
                },
            })
            .await
            .unwrap();

        let (url, request) = serve_once("200 OK", "[]").await;
        let config = BackendConfig {
            url,
            anon_key: "anon-key".to_string(),
            ..BackendConfig::default()
        };
        let restored = SessionStore::open(StorageTarget::Persistent(path)).await;
        let store = RestStore::new(reqwest::Client::new(), &config, restored).unwrap();

        let rows = store.select("tourist_places", &Query::new()).await.unwrap();

        assert!(rows.is_empty());
        let raw = request.await.unwrap().to_lowercase();
        assert!(raw.contains("authorization: bearer anon-key"));
        assert!(!raw.contains("expired-token"));
    }
}
