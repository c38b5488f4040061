//! ConnectHub command line client
//!
//! Drives the page controllers from a terminal:
//! - resolve the current session and navigation menu
//! - open any page through its gate and print the view as JSON
//! - sign in and out, with an optional persistent session
//! - run against a seeded in-memory backend with `--offline`

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use connecthub::auth::{NavMenu, StaticClientFactory, SupabaseClientFactory};
use connecthub::notify::TracingNotifier;
use connecthub::offline::{self, DEMO_PASSWORD};
use connecthub::preferences::Preferences;
use connecthub::services::{
    AccountService, AdminRequestsService, AgentDashboardService, BookingDecision, DashboardService,
    ExploreService, LocationService, ProfileService,
};
use connecthub::{AppConfig, AppContext, BackendConfig, ClientFactory, Page, PreferenceStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use url::Url;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "connecthub", version, about = "ConnectHub tourism and booking client")]
struct Cli {
    /// Use a seeded in-memory backend instead of the hosted project
    #[arg(long, global = true)]
    offline: bool,

    /// Sign in as this demo account before running the command (offline only)
    #[arg(long, global = true, value_name = "EMAIL", requires = "offline")]
    as_user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show who is signed in and the navigation menu
    Status,
    /// Open a page through its gate, e.g. `dashboard` or `location-detail?id=kanger`
    Page { path: String },
    /// Sign in with email and password
    Login {
        email: String,
        password: String,
        /// Keep the session across runs
        #[arg(long)]
        remember: bool,
    },
    /// Sign out
    Logout,
    /// List public places
    Explore {
        #[arg(long)]
        category: Option<String>,
    },
    /// Open booking inquiries for the signed-in agent
    AgentInbox,
    /// Accept or reject a booking inquiry
    Decide {
        booking_id: Uuid,
        #[arg(long)]
        reject: bool,
    },
    /// Request a booking for a location
    Book {
        location: String,
        #[arg(long, default_value_t = 1)]
        visitors: u32,
        #[arg(long)]
        date: Option<String>,
    },
    /// Approve or reject an agent application (admin only)
    ReviewAgent {
        user_id: Uuid,
        #[arg(long)]
        reject: bool,
    },
    /// Show or change theme and language
    Prefs {
        #[arg(long)]
        toggle_theme: bool,
        #[arg(long)]
        toggle_language: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config = if cli.offline {
        AppConfig::with_backend(BackendConfig::default())
    } else {
        AppConfig::from_env()
    }
    .map_err(|e| anyhow!("Configuration error: {}", e))?;

    init_tracing(&config);

    info!("Starting ConnectHub client");
    info!("Environment: {}", config.environment);

    let ctx = Arc::new(build_context(&cli, config).await?);

    if let Some(email) = &cli.as_user {
        AccountService::new(ctx.clone())
            .login(email, DEMO_PASSWORD, false)
            .await
            .with_context(|| format!("Could not sign in as {}", email))?;
    }

    run(cli.command, ctx).await
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("connecthub={},reqwest=warn", config.log_level).into()
    });

    let json = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn build_context(cli: &Cli, config: AppConfig) -> anyhow::Result<AppContext> {
    let notifier = Arc::new(TracingNotifier);

    if cli.offline {
        let client = offline::demo_client().await?;
        let factory: Arc<dyn ClientFactory> = Arc::new(StaticClientFactory::new(client));
        let preferences = Arc::new(PreferenceStore::in_memory(Preferences::default()));
        info!("Running offline against the demo backend");
        return Ok(AppContext::with_preferences(config, preferences, factory, notifier));
    }

    info!("Backend: {}", config.backend.url);
    let factory: Arc<dyn ClientFactory> = Arc::new(SupabaseClientFactory);
    Ok(AppContext::new(config, factory, notifier).await)
}

async fn run(command: Commands, ctx: Arc<AppContext>) -> anyhow::Result<()> {
    match command {
        Commands::Status => {
            let status = ctx.resolver.status().await;
            let nav = NavMenu::for_status(&status);
            print_json(&serde_json::json!({ "status": status, "nav": nav }))
        }
        Commands::Page { path } => open_page(&path, ctx).await,
        Commands::Login {
            email,
            password,
            remember,
        } => {
            let redirect = AccountService::new(ctx).login(&email, &password, remember).await?;
            print_json(&redirect)
        }
        Commands::Logout => {
            let redirect = AccountService::new(ctx).logout().await?;
            print_json(&redirect)
        }
        Commands::Explore { category } => {
            let view = ExploreService::new(ctx).load(category.as_deref()).await;
            print_json(&view)
        }
        Commands::AgentInbox => {
            let inbox = AgentDashboardService::new(ctx).load().await?;
            print_json(&inbox)
        }
        Commands::Decide { booking_id, reject } => {
            let decision = if reject {
                BookingDecision::Reject
            } else {
                BookingDecision::Accept
            };
            let booking = AgentDashboardService::new(ctx).decide(booking_id, decision).await?;
            print_json(&booking)
        }
        Commands::Book {
            location,
            visitors,
            date,
        } => {
            let booking = LocationService::new(ctx)
                .request_booking(Some(&location), visitors, date.as_deref())
                .await?;
            print_json(&booking)
        }
        Commands::ReviewAgent { user_id, reject } => {
            AdminRequestsService::new(ctx.clone()).decide(user_id, !reject).await?;
            let remaining = AdminRequestsService::new(ctx).load().await?;
            print_json(&remaining)
        }
        Commands::Prefs {
            toggle_theme,
            toggle_language,
        } => {
            if toggle_theme {
                ctx.preferences.toggle_theme().await?;
            }
            if toggle_language {
                ctx.preferences.toggle_language().await?;
            }
            let prefs = ctx.preferences.get().await;
            print_json(&serde_json::json!({
                "preferences": prefs,
                "labels": prefs.language.labels(),
            }))
        }
    }
}

/// Route a path to its page controller
async fn open_page(path: &str, ctx: Arc<AppContext>) -> anyhow::Result<()> {
    let page = Page::from_path(path);
    match page {
        Page::Dashboard => print_json(&DashboardService::new(ctx).load().await?),
        Page::Profile => print_json(&ProfileService::new(ctx).load().await?),
        Page::AgentDashboard => print_json(&AgentDashboardService::new(ctx).load().await?),
        Page::AdminAgentRequests => print_json(&AdminRequestsService::new(ctx).load().await?),
        Page::Explore => {
            let category = query_param(path, "category")?;
            print_json(&ExploreService::new(ctx).load(category.as_deref()).await)
        }
        Page::LocationDetail => {
            let id = query_param(path, "id")?;
            print_json(&LocationService::new(ctx).view(id.as_deref()).await)
        }
        other => print_json(&ctx.gate.enter(&other).await),
    }
}

fn query_param(path: &str, name: &str) -> anyhow::Result<Option<String>> {
    let base = Url::parse("http://connecthub.local/")?;
    let url = base
        .join(path)
        .with_context(|| format!("Invalid page path: {}", path))?;
    Ok(url
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
