use crate::auth::{AuthUser, Client, Page, Redirect, UserMetadata};
use crate::error::{AppError, AppResult};
use crate::models::AgentProfile;
use crate::notify::Toast;
use crate::repositories::{AgentProfileRepository, ProfileRepository};
use crate::services::{failed, invalid};
use crate::AppContext;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use tracing::{error, info, warn};
use uuid::Uuid;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

/// Minimum password length for new passwords
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Account type chosen on the sign-up form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccountType {
    #[default]
    User,
    Agent,
}

impl AccountType {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "agent" => AccountType::Agent,
            _ => AccountType::User,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AccountType::User => "User",
            AccountType::Agent => "Agent",
        }
    }
}

/// Agency details collected when applying as an agent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentDetails {
    pub agency_name: String,
    pub phone: String,
    pub whatsapp: String,
    pub city: String,
    pub specialization: String,
    pub license_number: String,
    pub description: String,
}

impl AgentDetails {
    fn into_profile(self, user_id: Uuid) -> AgentProfile {
        let field = |value: String| Some(value.trim().to_string());
        AgentProfile {
            id: None,
            user_id,
            agency_name: field(self.agency_name),
            phone: field(self.phone),
            whatsapp: field(self.whatsapp),
            city: field(self.city),
            specialization: field(self.specialization),
            license_number: field(self.license_number),
            description: field(self.description),
        }
    }
}

/// Sign-up form input
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub accepted_terms: bool,
    pub account_type: AccountType,
    pub agent: AgentDetails,
}

impl SignUpForm {
    /// First problem with the form, as shown to the user
    pub fn validate(&self) -> Result<(), &'static str> {
        let full_name = self.full_name.trim();
        let email = self.email.trim();

        if full_name.is_empty()
            || email.is_empty()
            || self.password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err("Please fill in all fields");
        }
        if !is_valid_email(email) {
            return Err("Please enter a valid email address");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("Password must be at least 8 characters long");
        }
        if self.password != self.confirm_password {
            return Err("Passwords do not match");
        }
        if !self.accepted_terms {
            return Err("Please accept the terms and conditions");
        }
        Ok(())
    }
}

/// Strength rating shown under the password field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

impl PasswordStrength {
    /// Score length and character classes; empty input has no rating
    pub fn of(password: &str) -> Option<Self> {
        if password.is_empty() {
            return None;
        }

        let length = password.chars().count();
        let checks = [
            length >= 8,
            length >= 12,
            password.chars().any(|c| c.is_ascii_lowercase()),
            password.chars().any(|c| c.is_ascii_uppercase()),
            password.chars().any(|c| c.is_ascii_digit()),
            password.chars().any(|c| !c.is_ascii_alphanumeric()),
        ];
        let score = checks.iter().filter(|passed| **passed).count();

        Some(match score {
            0..=2 => PasswordStrength::Weak,
            3..=4 => PasswordStrength::Medium,
            _ => PasswordStrength::Strong,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PasswordStrength::Weak => "weak",
            PasswordStrength::Medium => "medium",
            PasswordStrength::Strong => "strong",
        }
    }
}

/// Sign-up, login and logout
pub struct AccountService {
    ctx: Arc<AppContext>,
}

impl AccountService {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Where the login and signup pages send the visitor, if anywhere
    pub async fn enter(&self, page: &Page) -> Option<Redirect> {
        self.ctx.gate.enter(page).await.redirect().cloned()
    }

    /// Create an account; agent applicants also get a pending application
    pub async fn sign_up(&self, form: SignUpForm) -> AppResult<AuthUser> {
        if let Err(message) = form.validate() {
            return invalid(&self.ctx, message);
        }

        let client = match self.ctx.client().await {
            Ok(client) => client,
            Err(e) => return failed(&self.ctx, "Sign up", e, "Failed to create account".to_string()),
        };

        // Every account starts as a plain user; agent status is granted on review
        let metadata = UserMetadata {
            full_name: Some(form.full_name.trim().to_string()),
            role: Some("user".to_string()),
            ..UserMetadata::default()
        };

        let user = match client.auth.sign_up(form.email.trim(), &form.password, metadata).await {
            Ok(user) => user,
            Err(e) => {
                let err = AppError::from(e);
                let toast = err.user_message("Failed to create account");
                return failed(&self.ctx, "Sign up", err, toast);
            }
        };

        info!("Created {} account {}", form.account_type.label(), user.id);
        self.ctx.notify(Toast::success(format!(
            "{} account created successfully! Please check your email to verify.",
            form.account_type.label()
        )));

        if form.account_type == AccountType::Agent {
            if let Err(e) = apply_as_agent(&client, user.id, form.agent).await {
                error!("Error creating agent profile: {}", e);
            }
        }
        Ok(user)
    }

    /// Sign in and remember the choice of persistent session
    pub async fn login(&self, email: &str, password: &str, remember_me: bool) -> AppResult<Redirect> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return invalid(&self.ctx, "Please enter email and password");
        }
        if !is_valid_email(email) {
            return invalid(&self.ctx, "Please enter a valid email address");
        }

        // Set before signing in so the new session lands in the chosen storage,
        // even when gating the login page already built the client
        let previous = self.ctx.preferences.remember_me().await;
        self.ctx.preferences.set_remember_me(remember_me).await?;

        let result = match self.ctx.bootstrap.apply_storage_preference().await {
            Ok(client) => client.auth.sign_in_with_password(email, password).await.map_err(AppError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(session) => {
                info!("Signed in user {}", session.user.id);
                self.ctx.notify(Toast::success("Login successful! Redirecting..."));
                Ok(Redirect::to(Page::Index))
            }
            Err(err) => {
                self.ctx.preferences.set_remember_me(previous).await?;
                if let Err(e) = self.ctx.bootstrap.apply_storage_preference().await {
                    warn!("Could not restore session storage: {}", e);
                }
                let toast = err.user_message("Invalid email or password");
                failed(&self.ctx, "Login", err, toast)
            }
        }
    }

    /// Sign out and forget the persistent-session choice
    pub async fn logout(&self) -> AppResult<Redirect> {
        let result = match self.ctx.client().await {
            Ok(client) => client.auth.sign_out().await.map_err(AppError::from),
            Err(e) => Err(e),
        };
        if let Err(err) = result {
            return failed(&self.ctx, "Logout", err, "Failed to logout".to_string());
        }

        self.ctx.preferences.set_remember_me(false).await?;
        if let Err(e) = self.ctx.bootstrap.apply_storage_preference().await {
            warn!("Could not reset session storage: {}", e);
        }
        self.ctx.notify(Toast::success("Logged out successfully"));
        Ok(Redirect::to(Page::Index))
    }
}

async fn apply_as_agent(client: &Client, user_id: Uuid, details: AgentDetails) -> AppResult<()> {
    AgentProfileRepository::new(client.store.clone())
        .create(&details.into_profile(user_id))
        .await?;
    ProfileRepository::new(client.store.clone())
        .mark_agent_pending(user_id)
        .await?;
    info!("Agent application pending for {}", user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid_form() -> SignUpForm {
        SignUpForm {
            full_name: "Asha Netam".to_string(),
            email: "asha@example.com".to_string(),
            password: "bastar-2024".to_string(),
            confirm_password: "bastar-2024".to_string(),
            accepted_terms: true,
            ..SignUpForm::default()
        }
    }

    #[rstest]
    #[case(|f: &mut SignUpForm| f.full_name = "  ".to_string(), "Please fill in all fields")]
    #[case(|f: &mut SignUpForm| f.email = "asha@example".to_string(), "Please enter a valid email address")]
    #[case(|f: &mut SignUpForm| { f.password = "short".to_string(); f.confirm_password = "short".to_string(); }, "Password must be at least 8 characters long")]
    #[case(|f: &mut SignUpForm| f.confirm_password = "different1".to_string(), "Passwords do not match")]
    #[case(|f: &mut SignUpForm| f.accepted_terms = false, "Please accept the terms and conditions")]
    fn test_sign_up_validation(#[case] break_form: fn(&mut SignUpForm), #[case] expected: &str) {
        let mut form = valid_form();
        break_form(&mut form);
        assert_eq!(form.validate(), Err(expected));
    }

    #[test]
    fn test_valid_form_passes() {
        assert_eq!(valid_form().validate(), Ok(()));
    }

    #[rstest]
    #[case("", None)]
    #[case("abc", Some(PasswordStrength::Weak))]
    #[case("abcdefgh1", Some(PasswordStrength::Medium))]
    #[case("Abcdefgh1234!", Some(PasswordStrength::Strong))]
    fn test_password_strength(#[case] password: &str, #[case] expected: Option<PasswordStrength>) {
        assert_eq!(PasswordStrength::of(password), expected);
    }

    #[test]
    fn test_account_type_parsing_defaults_to_user() {
        assert_eq!(AccountType::from_str("Agent"), AccountType::Agent);
        assert_eq!(AccountType::from_str("traveller"), AccountType::User);
    }
}
