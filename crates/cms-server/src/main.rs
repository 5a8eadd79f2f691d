//! Studio CMS server
//!
//! Serves the CMS API and runs analytics syncs from the command line.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use studio_cms::{
    auth::{require_admin, AdminGuard},
    config::{AiConfig, AppConfig, DatabaseConfig, MailConfig},
    crypto::CredentialSealer,
    db::{create_pool, run_migrations, DbPool},
    handlers,
    mail::Mailer,
    rate_limit::RateLimiter,
    services::{
        AiService, AnalyticsService, BlueprintService, FormService, LeadService, PageService,
    },
    state::{AppState, Integrations},
};

/// Default encryption key for development (should be overridden in production).
const DEFAULT_ENCRYPTION_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

const DEFAULT_LOG_FILTER: &str = "info,studio_cms=debug,studio_connectors=debug,tower_http=debug";

#[derive(Parser)]
#[command(name = "studio-cms", version, about = "Studio CMS server and sync tool")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Sync one analytics property
    Sync {
        #[arg(long)]
        property: Uuid,
        /// Days back from today
        #[arg(long)]
        days: Option<u32>,
    },
    /// Sync every active analytics property in turn
    SyncAll {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Print a fresh base64 AES-256 key for CMS_ENCRYPTION_KEY
    GenerateKey,
    /// Apply database migrations
    Migrate,
}

/// Initialize tracing/logging. `CMS_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var("CMS_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Everything the router needs.
struct Services {
    state: AppState,
    guard: AdminGuard,
    pages: PageService,
    blueprints: BlueprintService,
    leads: LeadService,
    forms: FormService,
    analytics: AnalyticsService,
    ai: AiService,
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origin_list()
        .into_iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Build the application router with all routes.
fn build_router(services: Services) -> Router {
    let cors = cors_layer(&services.state.config);
    let admin = middleware::from_fn_with_state(services.guard.clone(), require_admin);

    // Health check routes (no auth required)
    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::api_health))
        .with_state(services.state);

    // Public site routes
    let public_page_routes = Router::new()
        .route("/api/pages/slug/{slug}", get(handlers::pages::by_slug))
        .with_state(services.pages.clone());

    let public_blueprint_routes = Router::new()
        .route(
            "/api/blueprint-instances/{id}",
            get(handlers::blueprints::get_instance),
        )
        .with_state(services.blueprints.clone());

    let public_lead_routes = Router::new()
        .route("/api/leads", post(handlers::leads::submit))
        .with_state(services.leads.clone());

    let public_form_routes = Router::new()
        .route("/api/form-submit", post(handlers::forms::submit))
        .with_state(services.forms.clone());

    // Admin routes
    let page_routes = Router::new()
        .route(
            "/api/pages",
            get(handlers::pages::list).post(handlers::pages::create),
        )
        .route(
            "/api/pages/{id}",
            get(handlers::pages::get)
                .put(handlers::pages::update)
                .delete(handlers::pages::delete),
        )
        .route("/api/blocks", get(handlers::pages::blocks))
        .route_layer(admin.clone())
        .with_state(services.pages);

    let blueprint_routes = Router::new()
        .route(
            "/api/blueprints",
            get(handlers::blueprints::list).post(handlers::blueprints::create),
        )
        .route(
            "/api/blueprints/{id}/instances",
            get(handlers::blueprints::list_instances).post(handlers::blueprints::create_instance),
        )
        .route_layer(admin.clone())
        .with_state(services.blueprints);

    let lead_routes = Router::new()
        .route("/api/leads", get(handlers::leads::list))
        .route(
            "/api/leads/{id}",
            get(handlers::leads::get).patch(handlers::leads::update),
        )
        .route(
            "/api/leads/{id}/activities",
            get(handlers::leads::list_activities).post(handlers::leads::add_activity),
        )
        .route_layer(admin.clone())
        .with_state(services.leads);

    let form_routes = Router::new()
        .route("/api/form-submissions", get(handlers::forms::list))
        .route_layer(admin.clone())
        .with_state(services.forms);

    let analytics_routes = Router::new()
        .route(
            "/api/{source}/properties",
            get(handlers::analytics::list).post(handlers::analytics::create),
        )
        .route(
            "/api/{source}/properties/{id}",
            get(handlers::analytics::get).delete(handlers::analytics::delete),
        )
        .route(
            "/api/{source}/properties/{id}/sync",
            post(handlers::analytics::sync),
        )
        .route(
            "/api/{source}/properties/{id}/verify",
            post(handlers::analytics::verify),
        )
        .route(
            "/api/{source}/properties/{id}/metrics",
            get(handlers::analytics::metrics),
        )
        .route_layer(admin.clone())
        .with_state(services.analytics);

    let ai_routes = Router::new()
        .route("/api/ai/content", post(handlers::ai::generate))
        .route("/api/ai/outline", post(handlers::ai::outline))
        .route("/api/ai/improve", post(handlers::ai::improve))
        .route("/api/ai/seo-tags", post(handlers::ai::seo_tags))
        .route_layer(admin)
        .with_state(services.ai);

    // Combine all routes
    Router::new()
        .merge(health_routes)
        .merge(public_page_routes)
        .merge(public_blueprint_routes)
        .merge(public_lead_routes)
        .merge(public_form_routes)
        .merge(page_routes)
        .merge(blueprint_routes)
        .merge(lead_routes)
        .merge(form_routes)
        .merge(analytics_routes)
        .merge(ai_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Get encryption key from config or use default.
fn encryption_key(config: &AppConfig) -> String {
    match config.encryption_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => {
            tracing::warn!("CMS_ENCRYPTION_KEY not set, using default (not secure for production)");
            DEFAULT_ENCRYPTION_KEY.to_string()
        }
    }
}

fn load_app_config() -> AppConfig {
    AppConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load app config, using defaults");
        AppConfig::default()
    })
}

async fn connect_database() -> anyhow::Result<DbPool> {
    let db_config = DatabaseConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load database config, using defaults");
        DatabaseConfig::default()
    });
    Ok(create_pool(&db_config).await?)
}

fn analytics_service(pool: DbPool, config: &AppConfig) -> anyhow::Result<AnalyticsService> {
    let sealer = CredentialSealer::from_base64(&encryption_key(config))?;
    Ok(AnalyticsService::new(pool, sealer, config.default_sync_days))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Sync { property, days } => {
            let config = load_app_config();
            let pool = connect_database().await?;
            let service = analytics_service(pool, &config)?;
            let response = service.sync_by_id(property, days).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Command::SyncAll { days } => {
            let config = load_app_config();
            let pool = connect_database().await?;
            let service = analytics_service(pool, &config)?;
            let reports = service.sync_all(days).await?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
            Ok(())
        }
        Command::GenerateKey => {
            println!("{}", CredentialSealer::generate_key_base64());
            Ok(())
        }
        Command::Migrate => {
            let pool = connect_database().await?;
            run_migrations(&pool).await?;
            Ok(())
        }
    }
}

async fn serve() -> anyhow::Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Studio CMS");

    let app_config = load_app_config();
    let mail_config = MailConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load mail config, mail disabled");
        MailConfig::default()
    });
    let ai_config = AiConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load AI config, using defaults");
        AiConfig::default()
    });

    tracing::info!(
        host = %app_config.host,
        port = app_config.port,
        admin_auth = app_config.admin_token().is_some(),
        mail = mail_config.is_enabled(),
        "Configuration loaded"
    );

    let db_pool = connect_database().await?;

    // Create services
    let mailer = Mailer::new(&mail_config, &app_config.site_name)?;
    let limiter = RateLimiter::new(
        app_config.lead_rate_limit,
        Duration::from_secs(app_config.lead_rate_window_secs),
    );
    let guard = AdminGuard::new(app_config.admin_token());
    if !guard.is_enforced() {
        tracing::warn!("CMS_ADMIN_TOKEN not set, admin routes are unauthenticated");
    }

    let ai = AiService::new(&ai_config)?;
    let integrations = Integrations {
        mail: mailer.is_enabled(),
        ai: ai.is_enabled(),
    };

    let services = Services {
        guard,
        pages: PageService::new(db_pool.clone()),
        blueprints: BlueprintService::new(db_pool.clone()),
        leads: LeadService::new(db_pool.clone(), limiter, mailer.clone()),
        forms: FormService::new(db_pool.clone(), mailer),
        analytics: analytics_service(db_pool.clone(), &app_config)?,
        ai,
        state: AppState::new(db_pool, app_config.clone(), integrations),
    };

    let app = build_router(services);

    let addr: SocketAddr = app_config.bind_address().parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
