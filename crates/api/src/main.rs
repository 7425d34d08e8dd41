//! API Server Application
//!
//! Reads the TOML file named by `PREREQ_CONFIG` (defaults otherwise) and
//! serves rule administration and compliance queries over HTTP.

mod extract;
mod handlers;
mod routes;
mod state;

use anyhow::{Context, Result};
use prereq_engine::{ConfigLoader, EngineContext, SYSTEM_ACTOR};
use prereq_persistence::Database;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Directory that has to exist before SQLite can create `database_url`
fn database_dir(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite:")?
        .split('?')
        .next()
        .filter(|p| !p.is_empty() && *p != ":memory:")?;
    Path::new(path.trim_start_matches("//"))
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config_path = std::env::var_os("PREREQ_CONFIG").map(PathBuf::from);
    let config = ConfigLoader::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;

    if let Some(dir) = database_dir(&config.database_url) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let db = Database::open(&config.database_url, &config.audit_dir)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    let engine =
        EngineContext::from_store(db.store(), config.engine.clone()).with_audit(db.audit());
    let app = routes::create_router(state::AppState::new(engine, SYSTEM_ACTOR));

    tracing::info!(
        database_url = %config.database_url,
        warning_window_days = config.engine.warning_window_days,
        "🚀 API server starting at http://{}",
        config.listen
    );

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
