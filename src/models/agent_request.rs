use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request from a user to be connected with an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for a new agent request; always starts out pending
#[derive(Debug, Clone, Serialize)]
pub struct NewAgentRequest {
    pub user_id: Uuid,
    pub message: String,
    pub status: &'static str,
}

impl NewAgentRequest {
    pub fn pending(user_id: Uuid, message: &str) -> Self {
        Self {
            user_id,
            message: message.to_string(),
            status: "pending",
        }
    }
}
