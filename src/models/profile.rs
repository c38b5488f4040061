use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Progress of a user's application to become an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl AgentRequestStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(AgentRequestStatus::Pending),
            "approved" => Ok(AgentRequestStatus::Approved),
            "rejected" => Ok(AgentRequestStatus::Rejected),
            _ => Err(format!("Invalid agent request status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRequestStatus::Pending => "pending",
            AgentRequestStatus::Approved => "approved",
            AgentRequestStatus::Rejected => "rejected",
        }
    }
}

/// One row per user, keyed by the auth user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub agent_request_status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Role column, ignoring blanks
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }

    /// Parsed agent application status; unknown values read as none
    pub fn agent_status(&self) -> Option<AgentRequestStatus> {
        self.agent_request_status
            .as_deref()
            .and_then(|s| AgentRequestStatus::from_str(s).ok())
    }
}

/// Agency details submitted with an agent sign-up
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    #[serde(default)]
    pub agency_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_tolerates_sparse_rows() {
        let profile: Profile = serde_json::from_value(json!({
            "id": "7a6f2d8e-1c7b-4a55-9d36-0f1b8e4c2a11",
            "role": "  ",
            "agent_request_status": "Approved"
        }))
        .unwrap();

        assert_eq!(profile.role(), None);
        assert_eq!(profile.agent_status(), Some(AgentRequestStatus::Approved));
    }

    #[test]
    fn test_unknown_agent_status_reads_as_none() {
        let profile: Profile = serde_json::from_value(json!({
            "id": "7a6f2d8e-1c7b-4a55-9d36-0f1b8e4c2a11",
            "agent_request_status": "on-hold"
        }))
        .unwrap();
        assert_eq!(profile.agent_status(), None);
    }
}
