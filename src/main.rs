use axum::Router;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use capacity_access::app::AppComponents;
use capacity_access::infrastructure::clock::SystemClock;
use capacity_access::infrastructure::config::{Config, LogFormat};
use capacity_access::infrastructure::db::{check_connection, create_pool};
use capacity_access::infrastructure::http::start_http_server;
use capacity_access::infrastructure::payments::StripeClient;
use capacity_access::infrastructure::repositories::{EmailOutboxRepository, ProfileRepository};
use capacity_access::infrastructure::scheduler::spawn_reminder_scheduler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting capacity access service on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    // Verify database connection
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    if config.stripe_webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET is not set; webhook deliveries will be rejected");
    }
    if config.stripe_secret_key.is_none() || config.stripe_yearly_price_id.is_none() {
        tracing::warn!("Stripe key or yearly price is not set; checkout is unavailable");
    }

    let pool = Arc::new(pool);

    // === DEPENDENCY INJECTION SETUP ===
    tracing::info!("Instantiating repositories...");
    let profile_repo = Arc::new(ProfileRepository::new(pool.clone()));
    let outbox_repo = Arc::new(EmailOutboxRepository::new(pool.clone()));
    let stripe_client = Arc::new(StripeClient::new(
        config.stripe_secret_key.clone(),
        config.stripe_api_base.clone(),
    ));

    let host = config.host.clone();
    let port = config.port;
    let scheduler_enabled = config.scheduler_enabled;
    let reminder_period = config.reminder_interval.to_std()?;
    let reminder_dry_run = config.reminder_dry_run;

    tracing::info!("Instantiating services...");
    let components = AppComponents::new(
        config,
        profile_repo,
        outbox_repo,
        stripe_client,
        Arc::new(SystemClock),
    );

    if scheduler_enabled {
        spawn_reminder_scheduler(
            components.reminder_scheduler.clone(),
            reminder_period,
            reminder_dry_run,
        );
    } else {
        tracing::info!("Reminder scheduler disabled");
    }

    // Start HTTP server with all routes
    start_http_server(components.router(Router::new()), &host, port).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "capacity_access=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
