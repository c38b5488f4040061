use crate::error::RepositoryResult;
use crate::models::{
    AgentRequest, Complaint, Feedback, NewAgentRequest, NewComplaint, NewFeedback,
};
use crate::repositories::{fetch_all, insert_one};
use crate::store::{tables, Query, TableStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Repository for rows a user writes and may delete themselves.
///
/// `T` is the stored row, `N` the insert payload.
pub struct UserContentRepository<T, N> {
    store: Arc<dyn TableStore>,
    table: &'static str,
    _rows: PhantomData<fn() -> (T, N)>,
}

pub type ComplaintRepository = UserContentRepository<Complaint, NewComplaint>;
pub type FeedbackRepository = UserContentRepository<Feedback, NewFeedback>;
pub type AgentRequestRepository = UserContentRepository<AgentRequest, NewAgentRequest>;

impl ComplaintRepository {
    pub fn complaints(store: Arc<dyn TableStore>) -> Self {
        Self::new(store, tables::COMPLAINTS)
    }
}

impl FeedbackRepository {
    pub fn feedback(store: Arc<dyn TableStore>) -> Self {
        Self::new(store, tables::FEEDBACK)
    }
}

impl AgentRequestRepository {
    pub fn agent_requests(store: Arc<dyn TableStore>) -> Self {
        Self::new(store, tables::AGENT_REQUESTS)
    }
}

impl<T, N> UserContentRepository<T, N>
where
    T: DeserializeOwned,
    N: Serialize + Sync,
{
    fn new(store: Arc<dyn TableStore>, table: &'static str) -> Self {
        Self {
            store,
            table,
            _rows: PhantomData,
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub async fn create(&self, record: &N) -> RepositoryResult<T> {
        insert_one(self.store.as_ref(), self.table, record).await
    }

    /// A user's rows, newest first
    pub async fn find_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<T>> {
        let query = Query::new().eq("user_id", user_id).newest_first();
        fetch_all(self.store.as_ref(), self.table, &query).await
    }

    /// Delete one row, only if it belongs to `user_id`
    pub async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<usize> {
        let query = Query::new().eq("id", id).eq("user_id", user_id);
        Ok(self.store.delete(self.table, &query).await?)
    }

    /// Delete every row belonging to `user_id`
    pub async fn delete_all_for_user(&self, user_id: Uuid) -> RepositoryResult<usize> {
        let query = Query::new().eq("user_id", user_id);
        Ok(self.store.delete(self.table, &query).await?)
    }
}
