//! Authentication, session bootstrap and route gating.
//!
//! Page load runs bootstrap, then the status resolver, then the gate for
//! the requested page. Nothing here panics or fails a page outright:
//! unexpected errors resolve to "not signed in".

pub mod bootstrap;
pub mod gate;
pub mod gotrue;
pub mod memory;
pub mod provider;
pub mod resolver;
pub mod session_store;

pub use bootstrap::{
    BootstrapError, Client, ClientFactory, SessionBootstrap, StaticClientFactory,
    SupabaseClientFactory,
};
pub use gate::{
    role_for, ActionGate, GateOutcome, LoginPrompt, NavItem, NavMenu, Page, ProtectedAction,
    Redirect, Role, RouteGate,
};
pub use gotrue::GoTrueClient;
pub use memory::MemoryAuthProvider;
pub use provider::{AuthError, AuthProvider, AuthUser, Session, UserMetadata, UserUpdate};
pub use resolver::{AuthResolver, AuthStatus, SessionUser};
pub use session_store::{SessionStore, StorageTarget};
