use crate::error::RepositoryResult;
use crate::models::{Activity, NewActivity};
use crate::repositories::{fetch_all, insert_one};
use crate::store::{tables, Query, TableStore};
use std::sync::Arc;
use uuid::Uuid;

/// Maximum activity entries shown on the dashboard
pub const ACTIVITY_LIMIT: usize = 50;

/// Repository for the activity feed
pub struct ActivityRepository {
    store: Arc<dyn TableStore>,
}

impl ActivityRepository {
    /// Create a new ActivityRepository
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, activity: &NewActivity) -> RepositoryResult<Activity> {
        insert_one(self.store.as_ref(), tables::ACTIVITY_LOG, activity).await
    }

    /// Most recent entries for a user
    pub async fn find_recent(&self, user_id: Uuid) -> RepositoryResult<Vec<Activity>> {
        let query = Query::new()
            .eq("user_id", user_id)
            .newest_first()
            .limit(ACTIVITY_LIMIT);
        fetch_all(self.store.as_ref(), tables::ACTIVITY_LOG, &query).await
    }
}
