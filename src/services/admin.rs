use crate::auth::gate::require_admin;
use crate::auth::{GateOutcome, Page};
use crate::error::{AppError, AppResult};
use crate::models::{AgentProfile, Profile};
use crate::notify::Toast;
use crate::repositories::{AgentProfileRepository, ProfileRepository};
use crate::services::{enter_restricted, failed, PageLoad};
use crate::AppContext;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// An agent application awaiting review
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingAgent {
    pub name: String,
    pub profile: Profile,
    pub agent_profile: Option<AgentProfile>,
}

/// Admin review of agent applications
pub struct AdminRequestsService {
    ctx: Arc<AppContext>,
}

impl AdminRequestsService {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Pending applications, each with its agency details when present
    pub async fn load(&self) -> AppResult<PageLoad<Vec<PendingAgent>>> {
        if let Err(redirect) = enter_restricted(&self.ctx, &Page::AdminAgentRequests).await {
            return Ok(PageLoad::Redirected(redirect));
        }

        let store = self.ctx.client().await?.store;
        let profiles = ProfileRepository::new(store.clone()).find_pending_agents().await?;
        let agent_profiles = AgentProfileRepository::new(store);

        let details = join_all(profiles.iter().map(|p| agent_profiles.find_by_user(p.id))).await;
        let pending = profiles
            .into_iter()
            .zip(details)
            .map(|(profile, details)| PendingAgent {
                name: profile
                    .full_name
                    .clone()
                    .unwrap_or_else(|| "(no name)".to_string()),
                agent_profile: details.unwrap_or_else(|e| {
                    debug!("No agent profile for {}: {}", profile.id, e);
                    None
                }),
                profile,
            })
            .collect();

        Ok(PageLoad::Ready(pending))
    }

    /// Approve or reject an application. The remote procedure enforces the
    /// admin check itself; its error message is shown as is.
    pub async fn decide(&self, target_user: Uuid, approve: bool) -> AppResult<()> {
        let status = self.ctx.resolver.status().await;
        if let GateOutcome::Redirect(redirect) = require_admin(&status) {
            let message = redirect
                .notice
                .map(|n| n.message)
                .unwrap_or_else(|| "Access denied: admin only".to_string());
            self.ctx.notify(Toast::error(message.clone()));
            return Err(AppError::Unauthorized(message));
        }

        let store = self.ctx.client().await?.store;
        match ProfileRepository::new(store).set_agent_status(target_user, approve).await {
            Ok(()) => {
                info!("Agent application for {} approved={}", target_user, approve);
                self.ctx.notify(Toast::success("Updated successfully"));
                Ok(())
            }
            Err(e) => {
                let err = AppError::from(e);
                let toast = err.user_message("Failed to update");
                failed(&self.ctx, "Agent status update", err, toast)
            }
        }
    }
}
