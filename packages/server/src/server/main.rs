// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use storyboard_core::kernel::{Argon2Hasher, BasePasswordHasher, PgRecordStore};
use storyboard_core::server::auth::{CookieOptions, SessionStore};
use storyboard_core::server::{build_app, AppState};
use storyboard_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storyboard_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Storyboard server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Build application
    let sessions = SessionStore::new(
        &config.session_key,
        CookieOptions {
            secure: config.secure_cookies,
            ..CookieOptions::default()
        },
    );
    // Warm the dummy hash so the first unknown-email login costs the same as later ones
    let passwords = Argon2Hasher::new();
    passwords
        .dummy_hash()
        .await
        .context("Failed to prepare password hasher")?;

    let state = AppState::new(
        Arc::new(PgRecordStore::new(pool)),
        Arc::new(passwords),
        Arc::new(sessions),
    )
    .with_local_hosts(config.local_hosts.clone());
    let app = build_app(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
