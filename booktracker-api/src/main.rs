//! # BookTracker API Server
//!
//! Multi-user book sharing: accounts, document uploads, downloads,
//! bookmarks and admin moderation over a JSON API.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/booktracker cargo run -p booktracker-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use booktracker_api::{
    app::{build_router, AppState},
    bootstrap::ensure_admin,
    config::Config,
    error::expose_internal_errors,
};
use booktracker_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    files::FileStore,
    store::PgStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let production = config.api.production();

    // JSON logs in production, human-readable otherwise
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booktracker_api=debug,booktracker_shared=debug,tower_http=debug".into()),
        )
        .with(production.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!production).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!(
        "BookTracker API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    expose_internal_errors(!production);

    if config.jwt.insecure_default {
        tracing::warn!(
            "JWT_SECRET is not set; signing tokens with the built-in default secret. \
             Set JWT_SECRET before exposing this server."
        );
    }

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("Failed to connect to the database")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let files = FileStore::new(&config.uploads.dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", config.uploads.dir.display()))?;

    let store = Arc::new(PgStore::new(pool.clone()));

    if let Some(admin) = &config.admin {
        ensure_admin(store.as_ref(), admin).await?;
    }

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, files, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, closing connections...");
    close_pool(pool).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
