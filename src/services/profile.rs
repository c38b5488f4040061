use crate::auth::{AuthError, Page, SessionUser, UserUpdate};
use crate::error::{AppError, AppResult};
use crate::notify::Toast;
use crate::repositories::{
    AgentRequestRepository, ComplaintRepository, FeedbackRepository, ProfileRepository,
};
use crate::services::account::MIN_PASSWORD_LEN;
use crate::services::{enter_restricted, failed, invalid, signed_in_user, PageLoad};
use crate::AppContext;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Account details shown on the profile page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub name: String,
    pub email: Option<String>,
    pub initials: String,
    pub role: String,
    pub user: SessionUser,
}

impl ProfileView {
    pub fn from_user(user: SessionUser) -> Self {
        Self {
            name: user.display_name(),
            email: user.email().map(str::to_string),
            initials: user.initials(),
            role: user.role().as_str().to_string(),
            user,
        }
    }
}

/// Profile page: name, password and account removal
pub struct ProfileService {
    ctx: Arc<AppContext>,
}

impl ProfileService {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    pub async fn load(&self) -> AppResult<PageLoad<ProfileView>> {
        Ok(match enter_restricted(&self.ctx, &Page::Profile).await {
            Ok(user) => PageLoad::Ready(ProfileView::from_user(user)),
            Err(redirect) => PageLoad::Redirected(redirect),
        })
    }

    /// Change the display name on the account and the profile row
    pub async fn update_full_name(&self, full_name: &str) -> AppResult<ProfileView> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return invalid(&self.ctx, "Please enter your full name");
        }

        let user = signed_in_user(&self.ctx).await?;
        let client = self.ctx.client().await?;
        let updated = match client.auth.update_user(UserUpdate::full_name(full_name)).await {
            Ok(updated) => updated,
            Err(e) => return failed(&self.ctx, "Profile update", e.into(), "Failed to update profile".to_string()),
        };

        // The profile row mirrors the name; a stale copy is not fatal
        if let Err(e) = ProfileRepository::new(client.store.clone())
            .update_full_name(updated.id, full_name)
            .await
        {
            warn!("Profile row not updated for {}: {}", updated.id, e);
        }

        self.ctx.notify(Toast::success("Profile updated successfully"));
        let mut user = user;
        user.user = updated;
        if let Some(profile) = user.profile.as_mut() {
            profile.full_name = Some(full_name.to_string());
        }
        Ok(ProfileView::from_user(user))
    }

    /// Change the password after re-checking the current one
    pub async fn change_password(&self, current: &str, new: &str, confirm: &str) -> AppResult<()> {
        if current.is_empty() || new.is_empty() || confirm.is_empty() {
            return invalid(&self.ctx, "Please fill in all fields");
        }
        if new.chars().count() < MIN_PASSWORD_LEN {
            return invalid(&self.ctx, "New password must be at least 8 characters long");
        }
        if new != confirm {
            return invalid(&self.ctx, "New passwords do not match");
        }
        if current == new {
            return invalid(&self.ctx, "New password must be different from current password");
        }

        let user = signed_in_user(&self.ctx).await?;
        if let Err(err) = self.verify_password(&user, current, "Current password is incorrect").await {
            let toast = err.user_message("Failed to change password");
            return failed(&self.ctx, "Password change", err, toast);
        }

        let client = self.ctx.client().await?;
        if let Err(e) = client.auth.update_user(UserUpdate::password(new)).await {
            let err = AppError::from(e);
            let toast = err.user_message("Failed to change password");
            return failed(&self.ctx, "Password change", err, toast);
        }

        info!("Password changed for {}", user.id());
        self.ctx.notify(Toast::success("Password changed successfully"));
        Ok(())
    }

    /// Remove the user's complaints, feedback and agent requests, then sign out.
    ///
    /// Deleting the auth account itself needs a privileged call and is left
    /// to support.
    pub async fn delete_account(&self, password: &str) -> AppResult<Page> {
        if password.is_empty() {
            return invalid(&self.ctx, "Please enter your password to confirm");
        }

        let user = signed_in_user(&self.ctx).await?;
        if let Err(err) = self.verify_password(&user, password, "Password is incorrect").await {
            let toast = err.user_message("Failed to delete account");
            return failed(&self.ctx, "Account deletion", err, toast);
        }

        let client = self.ctx.client().await?;
        let complaints = ComplaintRepository::complaints(client.store.clone());
        let feedback = FeedbackRepository::feedback(client.store.clone());
        let requests = AgentRequestRepository::agent_requests(client.store.clone());

        let id = user.id();
        let (c, f, r) = futures::join!(
            complaints.delete_all_for_user(id),
            feedback.delete_all_for_user(id),
            requests.delete_all_for_user(id)
        );
        for (table, result) in [("complaints", c), ("feedback", f), ("agent_requests", r)] {
            if let Err(e) = result {
                let err = AppError::from(e);
                let toast = err.user_message("Failed to delete account");
                return failed(&self.ctx, &format!("Deleting {}", table), err, toast);
            }
        }

        self.ctx.notify(Toast::success(
            "Account deletion initiated. Please contact support to complete the process.",
        ));

        if let Err(e) = client.auth.sign_out().await {
            warn!("Sign-out after account deletion failed: {}", e);
        }
        self.ctx.preferences.set_remember_me(false).await?;
        Ok(Page::Index)
    }

    async fn verify_password(&self, user: &SessionUser, password: &str, wrong: &str) -> AppResult<()> {
        let email = user
            .email()
            .ok_or_else(|| AppError::Message("Account has no email address".to_string()))?;
        let client = self.ctx.client().await?;

        match client.auth.sign_in_with_password(email, password).await {
            Ok(_) => Ok(()),
            Err(AuthError::InvalidCredentials) | Err(AuthError::Rejected { .. }) => {
                Err(AppError::Validation(wrong.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
