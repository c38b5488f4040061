use crate::models::lenient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Notification categories written by the booking flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingCreated,
    BookingConfirmed,
    BookingRejected,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BookingCreated => "booking_created",
            NotificationKind::BookingConfirmed => "booking_confirmed",
            NotificationKind::BookingRejected => "booking_rejected",
        }
    }
}

/// A message addressed to one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub actor_id: Option<Uuid>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient::json_or_text")]
    pub data: Value,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Message text, falling back to the notification type
    pub fn text(&self) -> &str {
        self.message
            .as_deref()
            .or(self.kind.as_deref())
            .unwrap_or("")
    }
}

/// Payload for a new notification about a booking
#[derive(Debug, Clone, Serialize)]
pub struct NewNotification {
    pub user_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub data: Value,
}

impl NewNotification {
    pub fn for_booking(
        user_id: Option<Uuid>,
        actor_id: Option<Uuid>,
        kind: NotificationKind,
        booking_id: Uuid,
    ) -> Self {
        let message = match kind {
            NotificationKind::BookingCreated => "Booking request created",
            NotificationKind::BookingConfirmed => "Your booking has been confirmed by the agent",
            NotificationKind::BookingRejected => "Your booking was rejected by the agent",
        };
        Self {
            user_id,
            actor_id,
            kind,
            message: message.to_string(),
            data: json!({ "booking_id": booking_id }),
        }
    }
}
