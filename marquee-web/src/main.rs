//! marquee-web - movie catalog server with content locker
//!
//! Serves the catalog index, movie detail pages with the player, the
//! playback session API and the locker settings API.

use anyhow::{Context, Result};
use clap::Parser;
use marquee_common::config::{CliOverrides, ServerConfig, TomlConfig};
use marquee_common::db::init_database;
use marquee_common::SystemClock;
use marquee_web::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for marquee-web
#[derive(Parser, Debug)]
#[command(name = "marquee-web")]
#[command(about = "Movie catalog server with content locker")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "MARQUEE_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "MARQUEE_BIND_ADDR")]
    bind_addr: Option<String>,

    /// Root folder holding the database
    #[arg(short, long, env = "MARQUEE_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Config file (defaults to the platform search path)
    #[arg(short, long, env = "MARQUEE_CONFIG")]
    config: Option<PathBuf>,

    /// Locker settings cache lifetime in seconds
    #[arg(long, env = "MARQUEE_SETTINGS_CACHE_TTL")]
    settings_cache_ttl: Option<u64>,

    /// Bearer token required for settings writes
    #[arg(long, env = "MARQUEE_ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_web=info,marquee_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any database delay
    info!(
        "Starting marquee-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let file = TomlConfig::load(args.config.as_deref());
    let config = ServerConfig::resolve(
        CliOverrides {
            root_folder: args.root_folder,
            bind_addr: args.bind_addr,
            port: args.port,
            settings_cache_ttl_secs: args.settings_cache_ttl,
            admin_token: args.admin_token,
        },
        file,
    );

    info!("Root folder: {}", config.root_folder.display());
    config
        .ensure_root_folder()
        .context("Failed to initialize root folder")?;

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let pool = match init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e).context("Failed to open database");
        }
    };

    if config.admin_token.is_none() {
        warn!("No admin token configured: settings writes are unauthenticated");
    }
    info!(
        "Settings cache TTL {}s, embed hosts {:?}",
        config.settings_cache_ttl_secs, config.embed_hosts
    );

    let state = AppState::new(pool, &config, Arc::new(SystemClock));
    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
