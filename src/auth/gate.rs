//! Role derivation and page/action gating.
//!
//! The decision functions are pure over an [`AuthStatus`]; [`RouteGate`]
//! resolves the status, applies them and raises any notice.

use crate::auth::resolver::{AuthResolver, AuthStatus, SessionUser};
use crate::notify::{Notifier, Toast};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Coarse permission label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Role {
    User,
    Agent,
    Admin,
    Other(String),
}

impl Role {
    /// Convert from a stored role string
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "user" => Role::User,
            "agent" => Role::Agent,
            "admin" => Role::Admin,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Agent => "agent",
            Role::Admin => "admin",
            Role::Other(other) => other,
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Role of a signed-in user.
///
/// Precedence: profile row, then account metadata `role`, then the legacy
/// metadata `user_type`, then `user`. Blank values are skipped.
pub fn role_for(user: &SessionUser) -> Role {
    let metadata = &user.user.user_metadata;

    user.profile
        .as_ref()
        .and_then(|p| p.role())
        .or_else(|| non_blank(metadata.role.as_deref()))
        .or_else(|| non_blank(metadata.user_type.as_deref()))
        .map(Role::from_str)
        .unwrap_or(Role::User)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Pages of the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Index,
    Login,
    Signup,
    Dashboard,
    Profile,
    AgentDashboard,
    AdminAgentRequests,
    Explore,
    LocationDetail,
    Other(String),
}

impl Page {
    /// Parse a request path such as `/dashboard.html` or `admin/agent-requests`
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_matches('/');
        let path = path.strip_suffix(".html").unwrap_or(path);

        match path {
            "" | "index" => Page::Index,
            "login" => Page::Login,
            "signup" => Page::Signup,
            "dashboard" => Page::Dashboard,
            "profile" => Page::Profile,
            "agent-dashboard" => Page::AgentDashboard,
            "admin/agent-requests" | "admin-agent-requests" => Page::AdminAgentRequests,
            "explore" => Page::Explore,
            "location-detail" => Page::LocationDetail,
            other => Page::Other(other.to_string()),
        }
    }

    pub fn href(&self) -> String {
        match self {
            Page::Index => "/".to_string(),
            Page::Login => "/login".to_string(),
            Page::Signup => "/signup".to_string(),
            Page::Dashboard => "/dashboard".to_string(),
            Page::Profile => "/profile".to_string(),
            Page::AgentDashboard => "/agent-dashboard".to_string(),
            Page::AdminAgentRequests => "/admin/agent-requests".to_string(),
            Page::Explore => "/explore".to_string(),
            Page::LocationDetail => "/location-detail".to_string(),
            Page::Other(path) => format!("/{}", path),
        }
    }

    /// Pages that require a signed-in user
    pub fn is_protected(&self) -> bool {
        matches!(self, Page::Dashboard | Page::Profile)
    }
}

/// Navigation away from the current page, with an optional notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub to: Page,
    pub notice: Option<Toast>,
}

impl Redirect {
    pub fn to(page: Page) -> Self {
        Self {
            to: page,
            notice: None,
        }
    }

    pub fn with_error(page: Page, message: &str) -> Self {
        Self {
            to: page,
            notice: Some(Toast::error(message)),
        }
    }
}

/// One entry in the navigation bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub href: String,
}

impl NavItem {
    fn new(label: &'static str, href: &str) -> Self {
        Self {
            label,
            href: href.to_string(),
        }
    }
}

/// Navigation bar state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NavMenu {
    Guest {
        items: Vec<NavItem>,
    },
    Account {
        initials: String,
        name: String,
        items: Vec<NavItem>,
    },
}

impl NavMenu {
    pub fn for_status(status: &AuthStatus) -> Self {
        match &status.user {
            Some(user) => Self::for_user(user),
            None => NavMenu::Guest {
                items: vec![
                    NavItem::new("Login", "/login"),
                    NavItem::new("Get Started", "/signup"),
                ],
            },
        }
    }

    pub fn for_user(user: &SessionUser) -> Self {
        let mut items = vec![
            NavItem::new("My Reviews", "/profile#reviews"),
            NavItem::new("Wishlist", "/profile#wishlist"),
        ];
        if user.is_approved_agent() {
            items.push(NavItem::new("Agent Dashboard", "/agent-dashboard"));
        }
        items.push(NavItem::new("Logout", "#logout"));

        NavMenu::Account {
            initials: user.initials(),
            name: user.display_name(),
            items,
        }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        match self {
            NavMenu::Guest { items } | NavMenu::Account { items, .. } => {
                items.iter().map(|item| item.label).collect()
            }
        }
    }
}

/// Result of gating a page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum GateOutcome {
    /// Public page: render with this navigation state
    Continue { nav: NavMenu },
    /// Restricted page: the user may proceed
    Proceed { user: SessionUser },
    Redirect(Redirect),
}

impl GateOutcome {
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            GateOutcome::Redirect(redirect) => Some(redirect),
            _ => None,
        }
    }

    pub fn into_user(self) -> Option<SessionUser> {
        match self {
            GateOutcome::Proceed { user } => Some(user),
            _ => None,
        }
    }
}

/// Actions on public pages that need an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectedAction {
    SubmitComplaint,
    SubmitFeedback,
    ConnectWithAgent,
    RequestAgent,
    Named(String),
}

impl ProtectedAction {
    pub fn description(&self) -> &str {
        match self {
            ProtectedAction::SubmitComplaint => "submit a complaint",
            ProtectedAction::SubmitFeedback => "submit feedback",
            ProtectedAction::ConnectWithAgent => "connect with an agent",
            ProtectedAction::RequestAgent => "request an agent",
            ProtectedAction::Named(name) if name.trim().is_empty() => "perform this action",
            ProtectedAction::Named(name) => name,
        }
    }
}

/// Dialog asking the visitor to sign in, shown without leaving the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginPrompt {
    pub message: String,
    pub login: String,
}

/// Result of the soft gate for an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionGate {
    Allowed,
    LoginRequired(LoginPrompt),
}

const LOGIN_REQUIRED: &str = "Please login to access this page";
const AGENT_REQUIRED: &str = "Access denied: Approved agent required";
const ADMIN_LOGIN_REQUIRED: &str = "Please login as admin to view this page";
const ADMIN_ONLY: &str = "Access denied: admin only";

/// Hard gate for protected pages
pub fn require_auth(status: &AuthStatus) -> GateOutcome {
    match &status.user {
        Some(user) => GateOutcome::Proceed { user: user.clone() },
        None => GateOutcome::Redirect(Redirect::with_error(Page::Login, LOGIN_REQUIRED)),
    }
}

/// Soft gate: prompt for login instead of navigating away
pub fn require_auth_for_action(status: &AuthStatus, action: &ProtectedAction) -> ActionGate {
    if status.is_authenticated {
        return ActionGate::Allowed;
    }
    ActionGate::LoginRequired(LoginPrompt {
        message: format!("Please login to {}", action.description()),
        login: Page::Login.href(),
    })
}

/// Agent pages need role `agent` with an approved application
pub fn require_agent_role(status: &AuthStatus) -> GateOutcome {
    match &status.user {
        None => GateOutcome::Redirect(Redirect::with_error(Page::Index, LOGIN_REQUIRED)),
        Some(user) if user.is_approved_agent() => GateOutcome::Proceed { user: user.clone() },
        Some(_) => GateOutcome::Redirect(Redirect::with_error(Page::Index, AGENT_REQUIRED)),
    }
}

/// Admin pages need role `admin`
pub fn require_admin(status: &AuthStatus) -> GateOutcome {
    match &status.user {
        None => GateOutcome::Redirect(Redirect::with_error(Page::Login, ADMIN_LOGIN_REQUIRED)),
        Some(user) if user.role() == Role::Admin => GateOutcome::Proceed { user: user.clone() },
        Some(_) => GateOutcome::Redirect(Redirect::with_error(Page::Index, ADMIN_ONLY)),
    }
}

/// Login and signup pages send signed-in users home
pub fn redirect_if_logged_in(status: &AuthStatus) -> GateOutcome {
    if status.is_authenticated {
        return GateOutcome::Redirect(Redirect::to(Page::Index));
    }
    GateOutcome::Continue {
        nav: NavMenu::for_status(status),
    }
}

/// Gate decision for any page
pub fn decide(page: &Page, status: &AuthStatus) -> GateOutcome {
    match page {
        Page::Dashboard | Page::Profile => require_auth(status),
        Page::AgentDashboard => require_agent_role(status),
        Page::AdminAgentRequests => require_admin(status),
        Page::Login | Page::Signup => redirect_if_logged_in(status),
        _ => GateOutcome::Continue {
            nav: NavMenu::for_status(status),
        },
    }
}

/// Applies gate decisions for the current visitor and raises their notices
pub struct RouteGate {
    resolver: Arc<AuthResolver>,
    notifier: Arc<dyn Notifier>,
}

impl RouteGate {
    pub fn new(resolver: Arc<AuthResolver>, notifier: Arc<dyn Notifier>) -> Self {
        Self { resolver, notifier }
    }

    pub fn resolver(&self) -> &Arc<AuthResolver> {
        &self.resolver
    }

    /// Resolve the visitor and gate `page`
    pub async fn enter(&self, page: &Page) -> GateOutcome {
        let status = self.resolver.status().await;
        let outcome = decide(page, &status);
        self.announce(page, &outcome);
        outcome
    }

    /// Soft gate for an action on the current page
    pub async fn require_auth_for_action(&self, action: &ProtectedAction) -> ActionGate {
        let status = self.resolver.status().await;
        let gate = require_auth_for_action(&status, action);
        if let ActionGate::LoginRequired(prompt) = &gate {
            debug!("Login prompt: {}", prompt.message);
        }
        gate
    }

    fn announce(&self, page: &Page, outcome: &GateOutcome) {
        if let GateOutcome::Redirect(redirect) = outcome {
            info!("Redirecting from {} to {}", page.href(), redirect.to.href());
            if let Some(notice) = &redirect.notice {
                self.notifier.notify(notice.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::{AuthUser, UserMetadata};
    use crate::models::Profile;
    use rstest::rstest;
    use uuid::Uuid;

    fn user_with(
        profile_role: Option<&str>,
        agent_status: Option<&str>,
        meta_role: Option<&str>,
        user_type: Option<&str>,
    ) -> SessionUser {
        let id = Uuid::new_v4();
        let user = AuthUser {
            id,
            email: Some("someone@example.com".to_string()),
            user_metadata: UserMetadata {
                full_name: Some("Asha Netam".to_string()),
                role: meta_role.map(str::to_string),
                user_type: user_type.map(str::to_string),
                ..UserMetadata::default()
            },
        };
        let profile = (profile_role.is_some() || agent_status.is_some()).then(|| Profile {
            id,
            full_name: None,
            email: None,
            role: profile_role.map(str::to_string),
            agent_request_status: agent_status.map(str::to_string),
            created_at: None,
        });
        SessionUser {
            user,
            profile,
            agent_profile: None,
        }
    }

    fn signed_in(user: SessionUser) -> AuthStatus {
        AuthStatus::signed_in(user)
    }

    #[rstest]
    #[case(Some("admin"), Some("agent"), Some("agent"), Role::Admin)]
    #[case(None, Some("agent"), Some("user"), Role::Agent)]
    #[case(None, None, Some("agent"), Role::Agent)]
    #[case(Some(""), Some(" "), Some("admin"), Role::Admin)]
    #[case(None, None, None, Role::User)]
    #[case(Some("guide"), None, None, Role::Other("guide".to_string()))]
    fn test_role_precedence(
        #[case] profile_role: Option<&str>,
        #[case] meta_role: Option<&str>,
        #[case] user_type: Option<&str>,
        #[case] expected: Role,
    ) {
        let user = user_with(profile_role, None, meta_role, user_type);
        assert_eq!(role_for(&user), expected);
    }

    #[rstest]
    #[case("/", Page::Index)]
    #[case("index.html", Page::Index)]
    #[case("/dashboard.html?tab=trips", Page::Dashboard)]
    #[case("admin/agent-requests", Page::AdminAgentRequests)]
    #[case("/location-detail.html?id=kanger", Page::LocationDetail)]
    #[case("/festivals", Page::Other("festivals".to_string()))]
    fn test_page_from_path(#[case] path: &str, #[case] expected: Page) {
        assert_eq!(Page::from_path(path), expected);
    }

    #[test]
    fn test_protected_pages_redirect_visitors_to_login() {
        for page in [Page::Dashboard, Page::Profile] {
            assert!(page.is_protected());
            let outcome = decide(&page, &AuthStatus::anonymous());
            let redirect = outcome.redirect().unwrap();
            assert_eq!(redirect.to, Page::Login);
            assert_eq!(redirect.notice, Some(Toast::error(LOGIN_REQUIRED)));
        }
        assert!(!Page::Explore.is_protected());
    }

    #[rstest]
    #[case(Some("agent"), Some("pending"))]
    #[case(Some("user"), Some("approved"))]
    #[case(None, None)]
    fn test_agent_gate_denies_unapproved_users(
        #[case] role: Option<&str>,
        #[case] agent_status: Option<&str>,
    ) {
        let status = signed_in(user_with(role, agent_status, None, None));
        let outcome = require_agent_role(&status);
        let redirect = outcome.redirect().unwrap();
        assert_eq!(redirect.to, Page::Index);
        assert_eq!(redirect.notice, Some(Toast::error(AGENT_REQUIRED)));
    }

    #[test]
    fn test_agent_gate_admits_approved_agent_and_shows_menu_entry() {
        let user = user_with(Some("agent"), Some("approved"), None, None);
        let status = signed_in(user.clone());

        assert_eq!(require_agent_role(&status).into_user(), Some(user.clone()));
        assert_eq!(
            NavMenu::for_user(&user).labels(),
            vec!["My Reviews", "Wishlist", "Agent Dashboard", "Logout"]
        );
    }

    #[test]
    fn test_admin_gate() {
        let visitor = require_admin(&AuthStatus::anonymous());
        assert_eq!(visitor.redirect().unwrap().to, Page::Login);

        let user = signed_in(user_with(Some("agent"), Some("approved"), None, None));
        let denied = require_admin(&user);
        assert_eq!(denied.redirect().unwrap().notice, Some(Toast::error(ADMIN_ONLY)));

        let admin = signed_in(user_with(Some("admin"), None, None, None));
        assert!(matches!(require_admin(&admin), GateOutcome::Proceed { .. }));
    }

    #[test]
    fn test_login_page_sends_signed_in_users_home() {
        let status = signed_in(user_with(None, None, None, None));
        assert_eq!(
            decide(&Page::Login, &status),
            GateOutcome::Redirect(Redirect::to(Page::Index))
        );
        assert!(matches!(
            decide(&Page::Signup, &AuthStatus::anonymous()),
            GateOutcome::Continue { nav: NavMenu::Guest { .. } }
        ));
    }

    #[rstest]
    #[case(ProtectedAction::SubmitComplaint, "Please login to submit a complaint")]
    #[case(ProtectedAction::Named(String::new()), "Please login to perform this action")]
    #[case(ProtectedAction::Named("save a place".to_string()), "Please login to save a place")]
    fn test_action_gate_prompts_visitors(#[case] action: ProtectedAction, #[case] message: &str) {
        match require_auth_for_action(&AuthStatus::anonymous(), &action) {
            ActionGate::LoginRequired(prompt) => {
                assert_eq!(prompt.message, message);
                assert_eq!(prompt.login, "/login");
            }
            ActionGate::Allowed => panic!("visitor must be prompted"),
        }

        let status = signed_in(user_with(None, None, None, None));
        assert_eq!(require_auth_for_action(&status, &action), ActionGate::Allowed);
    }
}
