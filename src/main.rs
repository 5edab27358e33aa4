//! EventDesk - event management backend
//!
//! Serves the events API and provides small administration commands for the
//! user directory and configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eventdesk::{
    api::build_app,
    config::EventDeskConfig,
    events::{EventLifecycle, EventsState, JsonEventStore, OwnershipGuard, QueryEngine},
    identity::{IdentityResolver, IdentityState, JwtService, Role, UserDirectory, UserStore},
    notify::{Localizer, LogNotifier, NotificationDispatcher, Notifier, WebhookNotifier},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "eventdesk")]
#[command(version)]
#[command(about = "Event management backend")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "EVENTDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage the user directory
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a user
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },

    /// List registered users
    List,

    /// Issue a bearer token for a user
    Token {
        /// User id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let (plain, json) = if cli.json_logs {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("eventdesk={},tower_http=debug", log_level).into()),
        )
        .with(plain)
        .with(json)
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => EventDeskConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => EventDeskConfig::default(),
    };

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            run_server(config).await?;
        }
        Commands::User { command } => {
            run_user_command(&config, command).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn run_server(config: EventDeskConfig) -> Result<()> {
    tracing::info!("Starting EventDesk");

    let secret = config.auth.resolve_secret()?;
    let jwt = Arc::new(JwtService::new(&secret, config.auth.issuer.clone()));
    let users = Arc::new(UserStore::new(config.storage.users_dir()).await?);
    let resolver = Arc::new(IdentityResolver::new(jwt, users.clone()));

    let store = Arc::new(JsonEventStore::new(config.storage.events_dir()).await?);
    tracing::info!(
        events = store.len().await,
        dir = %config.storage.base_dir.display(),
        "Event store ready"
    );

    let lifecycle = EventLifecycle::new(
        store.clone(),
        OwnershipGuard::new(config.auth.admin_bypass),
        build_dispatcher(&config)?,
    );
    let query = QueryEngine::new(store, config.search.near_radius_meters);

    let identity = IdentityState {
        resolver: resolver.clone(),
        users,
    };
    let state = EventsState {
        lifecycle: Arc::new(lifecycle),
        query: Arc::new(query),
        resolver,
        search: config.search.clone(),
    };
    let app = build_app(identity, state, &config.server.cors_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("EventDesk listening on {}. Press Ctrl+C to stop.", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            }
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}

fn build_dispatcher(config: &EventDeskConfig) -> Result<NotificationDispatcher> {
    let settings = &config.notifications;
    if !settings.enabled {
        tracing::info!("Notifications disabled");
        return Ok(NotificationDispatcher::disabled());
    }

    let timeout = Duration::from_millis(settings.timeout_ms);
    let notifier: Arc<dyn Notifier> = match &settings.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone(), timeout)?),
        None => Arc::new(LogNotifier),
    };
    let localizer = match &settings.locales_dir {
        Some(dir) => Localizer::load_dir(settings.default_locale.clone(), dir),
        None => Localizer::new(settings.default_locale.clone()),
    };
    tracing::info!(
        backend = notifier.name(),
        locale = localizer.locale(),
        "Notifications enabled"
    );

    Ok(NotificationDispatcher::new(
        notifier,
        Arc::new(localizer),
        timeout,
    ))
}

async fn run_user_command(config: &EventDeskConfig, command: UserCommands) -> Result<()> {
    let users = UserStore::new(config.storage.users_dir()).await?;

    match command {
        UserCommands::Add { name, email, admin } => {
            let role = if admin { Role::Admin } else { Role::User };
            let user = users.add_user(&name, &email, role).await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        UserCommands::List => {
            for user in users.list().await {
                println!("{}\t{}\t{}\t{}", user.id, user.role, user.email, user.name);
            }
        }
        UserCommands::Token { id } => {
            let user = users
                .find_by_id(&id)
                .await?
                .with_context(|| format!("No user with id {}", id))?;
            let secret = config.auth.resolve_secret()?;
            let jwt = JwtService::new(&secret, config.auth.issuer.clone());
            let token = jwt.issue(&user, chrono::Duration::hours(config.auth.token_ttl_hours))?;
            println!("{}", token);
        }
    }

    Ok(())
}

fn show_config(config: Option<&EventDeskConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
