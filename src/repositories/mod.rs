pub mod activity_repository;
pub mod agent_profile_repository;
pub mod booking_repository;
pub mod notification_repository;
pub mod place_repository;
pub mod profile_repository;
pub mod user_content_repository;

// Re-export all repositories for convenient access
pub use activity_repository::ActivityRepository;
pub use agent_profile_repository::AgentProfileRepository;
pub use booking_repository::BookingRepository;
pub use notification_repository::NotificationRepository;
pub use place_repository::PlaceRepository;
pub use profile_repository::ProfileRepository;
pub use user_content_repository::{
    AgentRequestRepository, ComplaintRepository, FeedbackRepository, UserContentRepository,
};

use crate::error::{RepositoryError, RepositoryResult};
use crate::store::{from_rows, to_row, Query, TableStore};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Select and decode every matching row
pub(crate) async fn fetch_all<T: DeserializeOwned>(
    store: &dyn TableStore,
    table: &str,
    query: &Query,
) -> RepositoryResult<Vec<T>> {
    let rows = store.select(table, query).await?;
    Ok(from_rows(rows)?)
}

/// Select and decode the first matching row, if any
pub(crate) async fn fetch_optional<T: DeserializeOwned>(
    store: &dyn TableStore,
    table: &str,
    query: Query,
) -> RepositoryResult<Option<T>> {
    let mut rows: Vec<T> = fetch_all(store, table, &query.limit(1)).await?;
    Ok(rows.pop())
}

/// Insert one record and decode the stored row
pub(crate) async fn insert_one<N: Serialize, T: DeserializeOwned>(
    store: &dyn TableStore,
    table: &str,
    record: &N,
) -> RepositoryResult<T> {
    let rows = store.insert(table, vec![to_row(record)?]).await?;
    let mut decoded: Vec<T> = from_rows(rows)?;
    decoded
        .pop()
        .ok_or_else(|| RepositoryError::InvalidRow(format!("insert into {} returned no row", table)))
}
