//! Seeded in-process backend for running without a hosted project.

use crate::auth::{Client, MemoryAuthProvider, UserMetadata};
use crate::store::memory::Tables;
use crate::store::{tables, to_row, MemoryStore, StoreError, ADMIN_SET_AGENT_STATUS};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Password shared by every demo account
pub const DEMO_PASSWORD: &str = "connecthub-demo";

pub const DEMO_TRAVELLER: &str = "traveller@connecthub.test";
pub const DEMO_AGENT: &str = "agent@connecthub.test";
pub const DEMO_ADMIN: &str = "admin@connecthub.test";

/// Install the agent-approval procedure on an in-memory store.
///
/// Approval sets the profile's role to `agent`; rejection keeps it `user`.
pub async fn register_admin_procedures(store: &MemoryStore) {
    store
        .register_function(ADMIN_SET_AGENT_STATUS, set_agent_status)
        .await;
}

fn set_agent_status(tables: &mut Tables, args: Value) -> Result<Value, StoreError> {
    let target = args
        .get("target_user")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Decode("target_user is required".to_string()))?
        .to_string();
    let approve = args.get("approve").and_then(Value::as_bool).unwrap_or(false);

    let profile = tables
        .get_mut(tables::PROFILES)
        .and_then(|rows| {
            rows.iter_mut()
                .find(|row| row.get("id").and_then(Value::as_str) == Some(target.as_str()))
        })
        .ok_or_else(|| StoreError::Remote {
            status: 404,
            code: None,
            message: format!("No profile for {}", target),
        })?;

    let (status, role) = if approve { ("approved", "agent") } else { ("rejected", "user") };
    profile.insert("agent_request_status".to_string(), json!(status));
    profile.insert("role".to_string(), json!(role));
    Ok(Value::Null)
}

/// Demo backend with a traveller, an approved agent, an admin, open
/// inquiries and public places
pub async fn demo_client() -> Result<Client, StoreError> {
    let store = Arc::new(MemoryStore::new());
    let auth = MemoryAuthProvider::new().with_store(store.clone());
    register_admin_procedures(&store).await;

    let traveller = auth
        .register(DEMO_TRAVELLER, DEMO_PASSWORD, metadata("Asha Netam", "user"))
        .await;
    let agent = auth
        .register(DEMO_AGENT, DEMO_PASSWORD, metadata("Ravi Kashyap", "agent"))
        .await;
    let admin = auth
        .register(DEMO_ADMIN, DEMO_PASSWORD, metadata("Site Admin", "admin"))
        .await;
    let applicant = auth
        .register("applicant@connecthub.test", DEMO_PASSWORD, metadata("Meera Baghel", "user"))
        .await;

    store
        .seed(
            tables::PROFILES,
            vec![
                to_row(&json!({"id": traveller.id, "full_name": "Asha Netam", "role": "user"}))?,
                to_row(&json!({
                    "id": agent.id, "full_name": "Ravi Kashyap",
                    "role": "agent", "agent_request_status": "approved"
                }))?,
                to_row(&json!({"id": admin.id, "full_name": "Site Admin", "role": "admin"}))?,
                to_row(&json!({
                    "id": applicant.id, "full_name": "Meera Baghel",
                    "role": "user", "agent_request_status": "pending"
                }))?,
            ],
        )
        .await;

    store
        .seed(
            tables::AGENT_PROFILES,
            vec![to_row(&json!({
                "user_id": applicant.id, "agency_name": "Bastar Trails",
                "city": "Jagdalpur", "description": "Guided waterfall and cave tours"
            }))?],
        )
        .await;

    store
        .seed(
            tables::BOOKINGS,
            vec![
                to_row(&json!({
                    "user_id": traveller.id, "location_id": "chitrakote", "guests": 2,
                    "status": "inquiry",
                    "status_timeline": [{"status": "inquiry", "timestamp": "2024-05-01T10:00:00Z"}]
                }))?,
                to_row(&json!({
                    "user_id": traveller.id, "agent_id": agent.id, "location_id": "kanger",
                    "guests": "4", "status": "inquiry", "status_timeline": "[]"
                }))?,
            ],
        )
        .await;

    store
        .seed(
            tables::TOURIST_PLACES,
            vec![
                to_row(&json!({"id": 1, "name": "Chitrakote Falls", "category": "waterfall"}))?,
                to_row(&json!({"id": 2, "name": "Danteshwari Temple", "category": "temple"}))?,
            ],
        )
        .await;
    store
        .seed(
            tables::PLACES,
            vec![
                to_row(&json!({"id": 10, "name": "Tirathgarh Falls", "category": "waterfall", "is_public": true}))?,
                to_row(&json!({"id": 11, "name": "Draft entry", "category": "cave", "is_public": false}))?,
            ],
        )
        .await;
    store
        .seed(
            tables::LISTINGS,
            vec![to_row(&json!({"id": "l-1", "title": "Kutumsar Cave walk", "category": "cave", "is_public": true}))?],
        )
        .await;

    info!("Offline backend seeded with demo accounts");
    Ok(Client::new(store, Arc::new(auth)))
}

fn metadata(full_name: &str, role: &str) -> UserMetadata {
    UserMetadata {
        full_name: Some(full_name.to_string()),
        role: Some(role.to_string()),
        ..UserMetadata::default()
    }
}
