use crate::auth::session_store::StorageTarget;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Marker text of the benign error returned for stale or partial tokens
const MISSING_SUB_CLAIM: &str = "missing sub claim";

/// Errors raised by an auth provider
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("No active session")]
    NoSession,

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Invalid auth response: {0}")]
    Decode(String),
}

impl AuthError {
    /// Stale-token artifact that means "not signed in" rather than a failure
    pub fn is_missing_sub_claim(&self) -> bool {
        self.to_string().contains(MISSING_SUB_CLAIM)
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Decode(err.to_string())
    }
}

/// Free-form metadata attached to an account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Legacy account-type field written by older sign-up forms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Identity issued by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl AuthUser {
    /// Full name when present, otherwise the local part of the email
    pub fn display_name(&self) -> String {
        if let Some(name) = self.full_name() {
            return name.to_string();
        }
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("Account")
            .to_string()
    }

    /// Up to two initials from the full name, else the first email letter
    pub fn initials(&self) -> String {
        if let Some(name) = self.full_name() {
            return name
                .split_whitespace()
                .filter_map(|part| part.chars().next())
                .take(2)
                .flat_map(char::to_uppercase)
                .collect();
        }
        self.email
            .as_deref()
            .and_then(|email| email.chars().next())
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "U".to_string())
    }

    fn full_name(&self) -> Option<&str> {
        self.user_metadata
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Token pair plus the user it was issued for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// Seconds before `expires_at` at which a token is treated as spent
const EXPIRY_MARGIN_SECS: i64 = 10;

impl Session {
    /// Whether the access token is past (or about to pass) its expiry.
    /// Sessions without an expiry never expire locally.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at
            .map(|at| at - EXPIRY_MARGIN_SECS <= now)
            .unwrap_or(false)
    }
}

/// Changes applied by `update_user`
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, Value>>,
}

impl UserUpdate {
    pub fn full_name(full_name: &str) -> Self {
        let mut data = serde_json::Map::new();
        data.insert("full_name".to_string(), Value::String(full_name.to_string()));
        Self {
            password: None,
            data: Some(data),
        }
    }

    pub fn password(password: &str) -> Self {
        Self {
            password: Some(password.to_string()),
            data: None,
        }
    }
}

/// Account and session operations delegated to the hosted auth service
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: UserMetadata,
    ) -> Result<AuthUser, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Locally held session, if any. Absence is not an error; an expired
    /// session is refreshed or dropped.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// Keep the session in `target` from now on
    async fn use_storage(&self, target: StorageTarget) -> Result<(), AuthError>;

    /// Fetch the user behind the current session from the auth service
    async fn get_user(&self) -> Result<AuthUser, AuthError>;

    async fn update_user(&self, update: UserUpdate) -> Result<AuthUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(full_name: Option<&str>, email: Option<&str>) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: email.map(str::to_string),
            user_metadata: UserMetadata {
                full_name: full_name.map(str::to_string),
                ..UserMetadata::default()
            },
        }
    }

    #[test]
    fn test_missing_sub_claim_is_recognised() {
        let err = AuthError::Rejected {
            status: 403,
            message: "invalid claim: missing sub claim".to_string(),
        };
        assert!(err.is_missing_sub_claim());
        assert!(!AuthError::NoSession.is_missing_sub_claim());
    }

    #[test]
    fn test_initials_and_display_name() {
        let named = user(Some("Asha Verma Rao"), Some("asha@example.com"));
        assert_eq!(named.initials(), "AV");
        assert_eq!(named.display_name(), "Asha Verma Rao");

        let anonymous = user(None, Some("ravi@example.com"));
        assert_eq!(anonymous.initials(), "R");
        assert_eq!(anonymous.display_name(), "ravi");

        assert_eq!(user(None, None).initials(), "U");
    }

    #[test]
    fn test_initials_from_lowercase_name_are_capitalised() {
        assert_eq!(user(Some("asha netam"), None).initials(), "AN");
        assert_eq!(user(Some("ravi"), Some("ravi@example.com")).initials(), "R");
    }

    #[test]
    fn test_session_expiry() {
        let mut session = Session {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: None,
            user: user(None, None),
        };
        assert!(!session.is_expired(2_000_000_000));

        session.expires_at = Some(1_000);
        assert!(session.is_expired(1_000));
        assert!(session.is_expired(995));
        assert!(!session.is_expired(900));
    }

    #[test]
    fn test_metadata_keeps_unknown_fields() {
        let raw = serde_json::json!({"full_name": "Kiran", "role": "agent", "plan": "gold"});
        let metadata: UserMetadata = serde_json::from_value(raw).unwrap();
        assert_eq!(metadata.role.as_deref(), Some("agent"));
        assert_eq!(metadata.extra["plan"], "gold");
    }
}
