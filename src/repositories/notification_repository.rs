use crate::error::RepositoryResult;
use crate::models::{NewNotification, Notification};
use crate::repositories::{fetch_all, insert_one};
use crate::store::{tables, Query, TableStore};
use std::sync::Arc;
use uuid::Uuid;

/// Repository for notifications
pub struct NotificationRepository {
    store: Arc<dyn TableStore>,
}

impl NotificationRepository {
    /// Create a new NotificationRepository
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, notification: &NewNotification) -> RepositoryResult<Notification> {
        insert_one(self.store.as_ref(), tables::NOTIFICATIONS, notification).await
    }

    /// A user's notifications, newest first
    pub async fn find_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Notification>> {
        let query = Query::new().eq("user_id", user_id).newest_first();
        fetch_all(self.store.as_ref(), tables::NOTIFICATIONS, &query).await
    }
}
