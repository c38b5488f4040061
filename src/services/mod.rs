//! Page controllers.
//!
//! Each service receives the [`AppContext`] explicitly, gates its page,
//! loads what the page shows and performs the page's form actions. User
//! feedback goes through the context's notifier as toasts.

pub mod account;
pub mod admin;
pub mod agent_dashboard;
pub mod dashboard;
pub mod explore;
pub mod location;
pub mod profile;

pub use account::{AccountService, AccountType, AgentDetails, PasswordStrength, SignUpForm};
pub use admin::{AdminRequestsService, PendingAgent};
pub use agent_dashboard::{AgentDashboardService, BookingDecision, InboxEntry};
pub use dashboard::{ContentKind, DashboardService, DashboardStats, DashboardView};
pub use explore::{ExploreService, ExploreView};
pub use location::{LocationService, LocationView};
pub use profile::{ProfileService, ProfileView};

use crate::auth::{GateOutcome, Page, Redirect, SessionUser};
use crate::error::{AppError, AppResult};
use crate::notify::Toast;
use crate::AppContext;
use serde::Serialize;
use tracing::error;

/// Result of opening a gated page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", content = "data", rename_all = "lowercase")]
pub enum PageLoad<T> {
    Ready(T),
    Redirected(Redirect),
}

impl<T> PageLoad<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            PageLoad::Ready(view) => Some(view),
            PageLoad::Redirected(_) => None,
        }
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            PageLoad::Redirected(redirect) => Some(redirect),
            PageLoad::Ready(_) => None,
        }
    }
}

/// Gate a restricted page, yielding the admitted user or the redirect
pub(crate) async fn enter_restricted(ctx: &AppContext, page: &Page) -> Result<SessionUser, Redirect> {
    match ctx.gate.enter(page).await {
        GateOutcome::Proceed { user } => Ok(user),
        GateOutcome::Redirect(redirect) => Err(redirect),
        GateOutcome::Continue { .. } => Err(Redirect::to(Page::Index)),
    }
}

/// The signed-in user for a form action, or an error toast
pub(crate) async fn signed_in_user(ctx: &AppContext) -> AppResult<SessionUser> {
    match ctx.resolver.status().await.user {
        Some(user) => Ok(user),
        None => {
            let message = "Please login to access this page";
            ctx.notify(Toast::error(message));
            Err(AppError::Unauthorized(message.to_string()))
        }
    }
}

/// Reject invalid form input before anything is sent
pub(crate) fn invalid<T>(ctx: &AppContext, message: &str) -> AppResult<T> {
    ctx.notify(Toast::error(message));
    Err(AppError::Validation(message.to_string()))
}

/// Log a failed remote action and show `toast`
pub(crate) fn failed<T>(ctx: &AppContext, action: &str, err: AppError, toast: String) -> AppResult<T> {
    error!("{} failed: {}", action, err);
    ctx.notify(Toast::error(toast));
    Err(err)
}

/// Treat a failed list load as an empty list
pub(crate) fn or_empty<T, E: std::fmt::Display>(what: &str, result: Result<Vec<T>, E>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        error!("Error loading {}: {}", what, e);
        Vec::new()
    })
}
