//! # annonces-server
//!
//! HTTP front for the classifieds catalog: public search and listing pages,
//! engagement tracking, a token-guarded back-office and the analytics
//! endpoints used by admins and analysts.

mod api;
mod auth;
mod config;
mod error;
mod media;

use annonces_store::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::media::MediaStore;

const DEFAULT_LOG_FILTER: &str = "info,annonces_server=debug";

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn open_catalog(config: &ServerConfig) -> anyhow::Result<Database> {
    let db = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    if let Some(path) = db.path() {
        info!(path = %path.display(), "catalog database opened");
    }
    if config.seed_demo {
        db.seed_demo_catalog()?;
    }
    Ok(db)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "annonces server starting");

    let config = ServerConfig::from_env();
    info!(?config, "configuration resolved");

    let db = open_catalog(&config)?;
    let media = MediaStore::new(config.media_storage_path.clone(), config.max_upload_size).await?;

    let http_addr = config.http_addr;
    let state = AppState::new(db, media, config);

    // Serve until the listener fails or the operator interrupts.
    tokio::select! {
        result = api::serve(state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server stopped with an error");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
        }
    }

    Ok(())
}
