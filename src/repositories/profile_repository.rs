use crate::error::RepositoryResult;
use crate::models::{AgentRequestStatus, Profile};
use crate::repositories::{fetch_all, fetch_optional};
use crate::store::{tables, to_row, Query, TableStore, ADMIN_SET_AGENT_STATUS};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Repository for profile data access
pub struct ProfileRepository {
    store: Arc<dyn TableStore>,
}

impl ProfileRepository {
    /// Create a new ProfileRepository
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Find a profile by user id
    pub async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Profile>> {
        fetch_optional(self.store.as_ref(), tables::PROFILES, Query::new().eq("id", id)).await
    }

    /// Profiles with an agent application awaiting review
    pub async fn find_pending_agents(&self) -> RepositoryResult<Vec<Profile>> {
        let query = Query::new().eq("agent_request_status", AgentRequestStatus::Pending.as_str());
        fetch_all(self.store.as_ref(), tables::PROFILES, &query).await
    }

    /// Record a new agent application; the role stays `user` until approval
    pub async fn mark_agent_pending(&self, id: Uuid) -> RepositoryResult<usize> {
        let patch = to_row(&json!({
            "agent_request_status": AgentRequestStatus::Pending.as_str(),
            "role": "user",
        }))?;
        let updated = self
            .store
            .update(tables::PROFILES, patch, &Query::new().eq("id", id))
            .await?;
        Ok(updated.len())
    }

    /// Update the display name
    pub async fn update_full_name(&self, id: Uuid, full_name: &str) -> RepositoryResult<usize> {
        let patch = to_row(&json!({ "full_name": full_name }))?;
        let updated = self
            .store
            .update(tables::PROFILES, patch, &Query::new().eq("id", id))
            .await?;
        Ok(updated.len())
    }

    /// Approve or reject an agent application through the privileged procedure
    pub async fn set_agent_status(&self, target_user: Uuid, approve: bool) -> RepositoryResult<()> {
        self.store
            .rpc(
                ADMIN_SET_AGENT_STATUS,
                json!({ "target_user": target_user, "approve": approve }),
            )
            .await?;
        Ok(())
    }
}
