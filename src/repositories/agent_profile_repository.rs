use crate::error::RepositoryResult;
use crate::models::AgentProfile;
use crate::repositories::{fetch_optional, insert_one};
use crate::store::{tables, Query, TableStore};
use std::sync::Arc;
use uuid::Uuid;

/// Repository for agency details
pub struct AgentProfileRepository {
    store: Arc<dyn TableStore>,
}

impl AgentProfileRepository {
    /// Create a new AgentProfileRepository
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Insert agency details for a user
    pub async fn create(&self, profile: &AgentProfile) -> RepositoryResult<AgentProfile> {
        insert_one(self.store.as_ref(), tables::AGENT_PROFILES, profile).await
    }

    /// Find the agency details belonging to a user
    pub async fn find_by_user(&self, user_id: Uuid) -> RepositoryResult<Option<AgentProfile>> {
        fetch_optional(
            self.store.as_ref(),
            tables::AGENT_PROFILES,
            Query::new().eq("user_id", user_id),
        )
        .await
    }
}
