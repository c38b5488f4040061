use crate::models::lenient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Booking lifecycle: `inquiry` then `confirmed` or `rejected`, then `completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Inquiry,
    Confirmed,
    Rejected,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl BookingStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "inquiry" => Ok(BookingStatus::Inquiry),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "rejected" => Ok(BookingStatus::Rejected),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Inquiry => "inquiry",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Unknown => "unknown",
        }
    }
}

/// One step in a booking's status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: BookingStatus,
    pub timestamp: DateTime<Utc>,
}

impl TimelineEntry {
    pub fn now(status: BookingStatus) -> Self {
        Self {
            status,
            timestamp: Utc::now(),
        }
    }
}

/// A visit request linking a traveller, optionally an agent, and a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub agent_id: Option<Uuid>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub guests: Option<u32>,
    pub status: BookingStatus,
    #[serde(default, deserialize_with = "lenient::json_or_text")]
    pub status_timeline: Vec<TimelineEntry>,
    #[serde(default, deserialize_with = "lenient::json_or_text")]
    pub metadata: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Timeline with `status` appended at the current time
    pub fn timeline_with(&self, status: BookingStatus) -> Vec<TimelineEntry> {
        let mut timeline = self.status_timeline.clone();
        timeline.push(TimelineEntry::now(status));
        timeline
    }

    pub fn guest_count(&self) -> u32 {
        self.guests.unwrap_or(1)
    }

    pub fn title(&self) -> &str {
        self.location_id.as_deref().unwrap_or("Trip")
    }

    pub fn notes(&self) -> &str {
        self.metadata
            .get("notes")
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

/// Payload for a new booking request
#[derive(Debug, Clone, Serialize)]
pub struct NewBooking {
    pub user_id: Option<Uuid>,
    pub location_id: String,
    pub start_date: Option<String>,
    pub guests: u32,
    pub status: BookingStatus,
    pub status_timeline: Vec<TimelineEntry>,
    pub metadata: Value,
}

impl NewBooking {
    /// A fresh inquiry with its first timeline entry
    pub fn inquiry(
        user_id: Option<Uuid>,
        location_id: &str,
        guests: u32,
        start_date: Option<String>,
    ) -> Self {
        Self {
            user_id,
            location_id: location_id.to_string(),
            start_date,
            guests,
            status: BookingStatus::Inquiry,
            status_timeline: vec![TimelineEntry::now(BookingStatus::Inquiry)],
            metadata: serde_json::json!({ "visitors": guests }),
        }
    }
}
