use crate::models::lenient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Entry in a user's activity feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    #[serde(default, deserialize_with = "lenient::json_or_text")]
    pub meta: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for a new activity entry
#[derive(Debug, Clone, Serialize)]
pub struct NewActivity {
    pub user_id: Uuid,
    pub action: String,
    pub meta: Value,
}

impl NewActivity {
    pub fn for_booking(user_id: Uuid, action: &str, booking_id: Uuid) -> Self {
        Self {
            user_id,
            action: action.to_string(),
            meta: json!({ "booking_id": booking_id }),
        }
    }
}
