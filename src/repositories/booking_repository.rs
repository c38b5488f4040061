use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{Booking, BookingStatus, NewBooking, TimelineEntry};
use crate::repositories::{fetch_all, fetch_optional, insert_one};
use crate::store::{from_rows, tables, to_row, Filter, Query, TableStore};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Repository for booking data access
pub struct BookingRepository {
    store: Arc<dyn TableStore>,
}

impl BookingRepository {
    /// Create a new BookingRepository
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Insert a new booking request
    pub async fn create(&self, booking: &NewBooking) -> RepositoryResult<Booking> {
        insert_one(self.store.as_ref(), tables::BOOKINGS, booking).await
    }

    /// Find a booking by UUID
    pub async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Booking>> {
        fetch_optional(self.store.as_ref(), tables::BOOKINGS, Query::new().eq("id", id)).await
    }

    /// Bookings a user made or is the agent for, newest first
    pub async fn find_for_participant(&self, user_id: Uuid) -> RepositoryResult<Vec<Booking>> {
        let query = Query::new()
            .or(vec![Filter::eq("user_id", user_id), Filter::eq("agent_id", user_id)])
            .newest_first();
        fetch_all(self.store.as_ref(), tables::BOOKINGS, &query).await
    }

    /// Open inquiries assigned to the agent or to no agent yet
    pub async fn find_open_inquiries(&self, agent_id: Uuid) -> RepositoryResult<Vec<Booking>> {
        let query = Query::new()
            .eq("status", BookingStatus::Inquiry.as_str())
            .or(vec![Filter::eq("agent_id", agent_id), Filter::is_null("agent_id")]);
        fetch_all(self.store.as_ref(), tables::BOOKINGS, &query).await
    }

    /// Set the status and replace the timeline
    pub async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        timeline: &[TimelineEntry],
    ) -> RepositoryResult<Booking> {
        let patch = to_row(&json!({
            "status": status.as_str(),
            "status_timeline": timeline,
        }))?;
        let rows = self
            .store
            .update(tables::BOOKINGS, patch, &Query::new().eq("id", id))
            .await?;

        let mut updated: Vec<Booking> = from_rows(rows)?;
        updated
            .pop()
            .ok_or_else(|| RepositoryError::NotFound(format!("booking {}", id)))
    }
}
