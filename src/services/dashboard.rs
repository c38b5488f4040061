use crate::auth::{Page, SessionUser};
use crate::error::{AppError, AppResult};
use crate::format::{parse_date, relative_or_blank};
use crate::models::{
    Activity, AgentRequest, Booking, BookingStatus, Complaint, Feedback, NewAgentRequest,
    NewComplaint, NewFeedback, Notification,
};
use crate::notify::Toast;
use crate::repositories::{
    ActivityRepository, AgentRequestRepository, BookingRepository, ComplaintRepository,
    FeedbackRepository, NotificationRepository,
};
use crate::services::{enter_restricted, failed, invalid, or_empty, signed_in_user, PageLoad};
use crate::AppContext;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// User-owned rows that can be deleted from the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Complaint,
    Feedback,
    AgentRequest,
}

impl ContentKind {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "complaint" | "complaints" => Ok(ContentKind::Complaint),
            "feedback" => Ok(ContentKind::Feedback),
            "agent request" | "agent requests" => Ok(ContentKind::AgentRequest),
            _ => Err(format!("Invalid item type: {}", s)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Complaint => "complaint",
            ContentKind::Feedback => "feedback",
            ContentKind::AgentRequest => "agent request",
        }
    }

    fn capitalized(&self) -> String {
        let label = self.label();
        let mut chars = label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Counters shown in the dashboard header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub complaints: usize,
    pub feedback: usize,
    pub agent_requests: usize,
    pub unread_notifications: usize,
}

/// Activity entry with its age already formatted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityLine {
    pub when: String,
    pub action: String,
    pub meta: serde_json::Value,
}

/// Everything the dashboard page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub user: SessionUser,
    pub upcoming_trips: Vec<Booking>,
    pub travel_history: Vec<Booking>,
    pub bookings: Vec<Booking>,
    pub notifications: Vec<Notification>,
    pub activity: Vec<ActivityLine>,
    pub complaints: Vec<Complaint>,
    pub feedback: Vec<Feedback>,
    pub agent_requests: Vec<AgentRequest>,
    pub stats: DashboardStats,
}

impl DashboardView {
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        user: SessionUser,
        bookings: Vec<Booking>,
        notifications: Vec<Notification>,
        activity: Vec<Activity>,
        complaints: Vec<Complaint>,
        feedback: Vec<Feedback>,
        agent_requests: Vec<AgentRequest>,
        now: DateTime<Utc>,
    ) -> Self {
        let after_now = |date: &Option<String>| {
            date.as_deref().and_then(parse_date).map(|d| d > now).unwrap_or(false)
        };
        let before_now = |date: &Option<String>| {
            date.as_deref().and_then(parse_date).map(|d| d < now).unwrap_or(false)
        };

        let upcoming_trips = bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Confirmed && after_now(&b.start_date))
            .cloned()
            .collect();
        let travel_history = bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Completed || before_now(&b.end_date))
            .cloned()
            .collect();

        let stats = DashboardStats {
            complaints: complaints.len(),
            feedback: feedback.len(),
            agent_requests: agent_requests.len(),
            unread_notifications: notifications.iter().filter(|n| !n.read).count(),
        };

        let activity = activity
            .into_iter()
            .map(|a| ActivityLine {
                when: relative_or_blank(a.created_at, now),
                action: a.action,
                meta: a.meta,
            })
            .collect();

        Self {
            user,
            upcoming_trips,
            travel_history,
            bookings,
            notifications,
            activity,
            complaints,
            feedback,
            agent_requests,
            stats,
        }
    }
}

/// The signed-in user's dashboard
pub struct DashboardService {
    ctx: Arc<AppContext>,
}

impl DashboardService {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Gate the page and load every section concurrently.
    ///
    /// A section that fails to load is shown empty; the others still render.
    pub async fn load(&self) -> AppResult<PageLoad<DashboardView>> {
        let user = match enter_restricted(&self.ctx, &Page::Dashboard).await {
            Ok(user) => user,
            Err(redirect) => return Ok(PageLoad::Redirected(redirect)),
        };

        let store = self.ctx.client().await?.store;
        let bookings = BookingRepository::new(store.clone());
        let notifications = NotificationRepository::new(store.clone());
        let activity = ActivityRepository::new(store.clone());
        let complaints = ComplaintRepository::complaints(store.clone());
        let feedback = FeedbackRepository::feedback(store.clone());
        let agent_requests = AgentRequestRepository::agent_requests(store);

        let id = user.id();
        let (b, n, a, c, f, r) = futures::join!(
            bookings.find_for_participant(id),
            notifications.find_by_user(id),
            activity.find_recent(id),
            complaints.find_by_user(id),
            feedback.find_by_user(id),
            agent_requests.find_by_user(id)
        );

        Ok(PageLoad::Ready(DashboardView::build(
            user,
            or_empty("bookings", b),
            or_empty("notifications", n),
            or_empty("activity log", a),
            or_empty("complaints", c),
            or_empty("feedback", f),
            or_empty("agent requests", r),
            Utc::now(),
        )))
    }

    pub async fn submit_complaint(&self, title: &str, description: &str) -> AppResult<Complaint> {
        let (title, description) = (title.trim(), description.trim());
        if title.is_empty() || description.is_empty() {
            return invalid(&self.ctx, "Please fill in all fields");
        }

        let user = signed_in_user(&self.ctx).await?;
        let record = NewComplaint {
            user_id: user.id(),
            title: title.to_string(),
            description: description.to_string(),
        };
        let result = self.complaints().await?.create(&record).await;
        self.report(result.map_err(AppError::from), "Complaint submitted successfully", "Failed to submit complaint")
    }

    pub async fn submit_feedback(&self, message: &str) -> AppResult<Feedback> {
        let message = message.trim();
        if message.is_empty() {
            return invalid(&self.ctx, "Please enter your feedback");
        }

        let user = signed_in_user(&self.ctx).await?;
        let record = NewFeedback {
            user_id: user.id(),
            message: message.to_string(),
        };
        let result = self.feedback().await?.create(&record).await;
        self.report(result.map_err(AppError::from), "Feedback submitted successfully", "Failed to submit feedback")
    }

    pub async fn submit_agent_request(&self, message: &str) -> AppResult<AgentRequest> {
        let message = message.trim();
        if message.is_empty() {
            return invalid(&self.ctx, "Please describe your request");
        }

        let user = signed_in_user(&self.ctx).await?;
        let record = NewAgentRequest::pending(user.id(), message);
        let result = self.agent_requests().await?.create(&record).await;
        self.report(
            result.map_err(AppError::from),
            "Agent request submitted successfully",
            "Failed to submit agent request",
        )
    }

    /// Delete one of the user's own rows; rows of other users are untouched
    pub async fn delete_item(&self, kind: ContentKind, id: Uuid) -> AppResult<usize> {
        let user = signed_in_user(&self.ctx).await?;
        let store = self.ctx.client().await?.store;

        let result = match kind {
            ContentKind::Complaint => ComplaintRepository::complaints(store).delete_owned(id, user.id()).await,
            ContentKind::Feedback => FeedbackRepository::feedback(store).delete_owned(id, user.id()).await,
            ContentKind::AgentRequest => {
                AgentRequestRepository::agent_requests(store).delete_owned(id, user.id()).await
            }
        };

        match result {
            Ok(0) => {
                warn!("No {} {} owned by {} to delete", kind.label(), id, user.id());
                self.ctx.notify(Toast::error(format!(
                    "{} not found or already deleted",
                    kind.capitalized()
                )));
                Ok(0)
            }
            Ok(removed) => {
                info!("Deleted {} {} ({} row(s))", kind.label(), id, removed);
                self.ctx.notify(Toast::success(format!("{} deleted successfully", kind.capitalized())));
                Ok(removed)
            }
            Err(e) => failed(&self.ctx, "Delete", e.into(), format!("Failed to delete {}", kind.label())),
        }
    }

    async fn complaints(&self) -> AppResult<ComplaintRepository> {
        Ok(ComplaintRepository::complaints(self.ctx.client().await?.store))
    }

    async fn feedback(&self) -> AppResult<FeedbackRepository> {
        Ok(FeedbackRepository::feedback(self.ctx.client().await?.store))
    }

    async fn agent_requests(&self) -> AppResult<AgentRequestRepository> {
        Ok(AgentRequestRepository::agent_requests(self.ctx.client().await?.store))
    }

    fn report<T>(&self, result: AppResult<T>, success: &str, failure: &str) -> AppResult<T> {
        match result {
            Ok(value) => {
                self.ctx.notify(Toast::success(success));
                Ok(value)
            }
            Err(e) => failed(&self.ctx, "Submit", e, failure.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthUser, UserMetadata};
    use chrono::TimeZone;
    use serde_json::json;

    fn booking(status: &str, start: Option<&str>, end: Option<&str>) -> Booking {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "status": status,
            "start_date": start,
            "end_date": end,
        }))
        .unwrap()
    }

    #[test]
    fn test_trips_split_into_upcoming_and_history() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let user = SessionUser::new(AuthUser {
            id: Uuid::new_v4(),
            email: None,
            user_metadata: UserMetadata::default(),
        });
        let bookings = vec![
            booking("confirmed", Some("2024-07-01"), Some("2024-07-03")),
            booking("inquiry", Some("2024-07-01"), None),
            booking("completed", Some("2024-01-01"), None),
            booking("confirmed", Some("2024-06-01"), Some("2024-06-02")),
        ];

        let view = DashboardView::build(user, bookings, vec![], vec![], vec![], vec![], vec![], now);

        assert_eq!(view.upcoming_trips.len(), 1);
        assert_eq!(view.travel_history.len(), 2);
        assert_eq!(view.bookings.len(), 4);
        assert_eq!(view.stats, DashboardStats::default());
    }

    #[test]
    fn test_content_kind_labels() {
        assert_eq!(ContentKind::from_str("agent-request"), Ok(ContentKind::AgentRequest));
        assert_eq!(ContentKind::AgentRequest.capitalized(), "Agent request");
        assert!(ContentKind::from_str("booking").is_err());
    }
}
