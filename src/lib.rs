use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod models;
pub mod one_time_token;
pub mod render;
pub mod routes;
pub mod store;
pub mod tracking;
pub mod utils;

use config::Config;
use context::AppContext;
use one_time_token::OneTimeTokenStore;
use store::{InMemoryPostStore, PostStore};

pub use routes::create_router;

/// Pick the post store: PostgreSQL when DATABASE_URL is set, memory otherwise
async fn build_post_store(config: &Config) -> Result<Arc<dyn PostStore>> {
    match config.db.url.as_deref() {
        Some(url) => {
            info!("Connecting to database...");
            let pool = db::create_pool(url, &config.db)
                .await
                .context("Failed to connect to database")?;
            info!("Connected to database");

            info!("Applying database migrations...");
            db::run_migrations(&pool).await?;
            info!("Database migrations applied successfully");

            Ok(Arc::new(db::PgPostStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, posts are kept in memory and lost on restart");
            Ok(Arc::new(InMemoryPostStore::new()))
        }
    }
}

/// Periodically drop one-time tokens that outlived their TTL
fn spawn_token_purge(tokens: Arc<OneTimeTokenStore>, interval_secs: u64) {
    if interval_secs == 0 {
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            let purged = tokens.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, remaining = tokens.len(), "Purged expired one-time tokens");
            }
        }
    });
}

pub async fn run() -> Result<()> {
    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Board Server Starting ===");
    info!("Port: {}", config.port);
    info!("Admin user: {}", config.logging.user_label(&config.auth.admin_user));

    let posts = build_post_store(&config).await?;
    let app_context = Arc::new(AppContext::new(config.clone(), posts));

    spawn_token_purge(
        app_context.tokens.clone(),
        config.one_time_token.purge_interval_secs,
    );

    let app = create_router(app_context);

    let addr = config.listen_address();
    let listener = TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    info!("Board server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Failed to start server")?;

    info!("Server shut down.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
