use crate::auth::gate::require_agent_role;
use crate::auth::{GateOutcome, Page, SessionUser};
use crate::error::{AppError, AppResult};
use crate::models::{Booking, BookingStatus, NewActivity, NewNotification, NotificationKind};
use crate::notify::Toast;
use crate::repositories::{ActivityRepository, BookingRepository, NotificationRepository};
use crate::services::{enter_restricted, failed, PageLoad};
use crate::AppContext;
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Agent's answer to a booking inquiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingDecision {
    Accept,
    Reject,
}

impl BookingDecision {
    pub fn status(&self) -> BookingStatus {
        match self {
            BookingDecision::Accept => BookingStatus::Confirmed,
            BookingDecision::Reject => BookingStatus::Rejected,
        }
    }

    fn notification(&self) -> NotificationKind {
        match self {
            BookingDecision::Accept => NotificationKind::BookingConfirmed,
            BookingDecision::Reject => NotificationKind::BookingRejected,
        }
    }

    fn activity(&self) -> &'static str {
        match self {
            BookingDecision::Accept => "Accepted booking",
            BookingDecision::Reject => "Rejected booking",
        }
    }

    fn toast(&self) -> &'static str {
        match self {
            BookingDecision::Accept => "Booking accepted",
            BookingDecision::Reject => "Booking rejected",
        }
    }
}

/// One inquiry in the agent's inbox
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboxEntry {
    pub title: String,
    pub received: String,
    pub guests: u32,
    pub booking: Booking,
}

impl From<Booking> for InboxEntry {
    fn from(booking: Booking) -> Self {
        Self {
            title: booking
                .location_id
                .clone()
                .unwrap_or_else(|| "Booking Request".to_string()),
            received: booking
                .created_at
                .map(|at| at.with_timezone(&Local).format("%d/%m/%Y, %H:%M:%S").to_string())
                .unwrap_or_default(),
            guests: booking.guest_count(),
            booking,
        }
    }
}

/// Inbox of booking inquiries for approved agents
pub struct AgentDashboardService {
    ctx: Arc<AppContext>,
}

impl AgentDashboardService {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Open inquiries that are unassigned or assigned to this agent
    pub async fn load(&self) -> AppResult<PageLoad<Vec<InboxEntry>>> {
        let agent = match enter_restricted(&self.ctx, &Page::AgentDashboard).await {
            Ok(user) => user,
            Err(redirect) => return Ok(PageLoad::Redirected(redirect)),
        };

        let store = self.ctx.client().await?.store;
        let inquiries = BookingRepository::new(store)
            .find_open_inquiries(agent.id())
            .await
            .map_err(|e| {
                error!("Error loading booking requests: {}", e);
                AppError::from(e)
            })?;

        Ok(PageLoad::Ready(inquiries.into_iter().map(InboxEntry::from).collect()))
    }

    /// Confirm or reject an inquiry, notify its owner and log the action
    pub async fn decide(&self, booking_id: Uuid, decision: BookingDecision) -> AppResult<Booking> {
        let agent = self.approved_agent().await?;

        match self.apply(&agent, booking_id, decision).await {
            Ok(booking) => {
                info!("Agent {} set booking {} to {}", agent.id(), booking_id, booking.status.as_str());
                self.ctx.notify(Toast::success(decision.toast()));
                Ok(booking)
            }
            Err(e) => failed(&self.ctx, "Booking update", e, "Failed to update booking".to_string()),
        }
    }

    pub async fn accept(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.decide(booking_id, BookingDecision::Accept).await
    }

    pub async fn reject(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.decide(booking_id, BookingDecision::Reject).await
    }

    async fn approved_agent(&self) -> AppResult<SessionUser> {
        let status = self.ctx.resolver.status().await;
        match require_agent_role(&status) {
            GateOutcome::Proceed { user } => Ok(user),
            outcome => {
                let notice = outcome
                    .redirect()
                    .and_then(|r| r.notice.clone())
                    .unwrap_or_else(|| Toast::error("Access denied: Approved agent required"));
                let message = notice.message.clone();
                self.ctx.notify(notice);
                Err(AppError::Unauthorized(message))
            }
        }
    }

    async fn apply(&self, agent: &SessionUser, booking_id: Uuid, decision: BookingDecision) -> AppResult<Booking> {
        let store = self.ctx.client().await?.store;
        let bookings = BookingRepository::new(store.clone());

        let booking = bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking {}", booking_id)))?;

        let timeline = booking.timeline_with(decision.status());
        let updated = bookings
            .update_status(booking_id, decision.status(), &timeline)
            .await?;

        NotificationRepository::new(store.clone())
            .create(&NewNotification::for_booking(
                updated.user_id,
                Some(agent.id()),
                decision.notification(),
                booking_id,
            ))
            .await?;

        ActivityRepository::new(store)
            .create(&NewActivity::for_booking(agent.id(), decision.activity(), booking_id))
            .await?;

        Ok(updated)
    }
}
