//! Database opening, initialization and status

use anyhow::{Context, Result};
use prereq_engine::{AppConfig, EngineContext};
use prereq_persistence::{ClientRepo, Database, DocumentRepo, PersonRepo, RuleRepo};
use std::path::PathBuf;

/// File path behind a `sqlite:` URL, if it names one
pub fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url.strip_prefix("sqlite:")?;
    let rest = rest.trim_start_matches("//");
    let path = rest.split('?').next().unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// Open the database, creating parent directories for the file if needed
pub async fn open(config: &AppConfig) -> Result<Database> {
    if let Some(path) = sqlite_path(&config.database_url) {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    Database::open(&config.database_url, &config.audit_dir)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))
}

/// Engine over the SQLite store, audited
pub fn engine(db: &Database, config: &AppConfig) -> EngineContext {
    EngineContext::from_store(db.store(), config.engine.clone()).with_audit(db.audit())
}

/// Initialize the database with schema
pub async fn init(config: &AppConfig, force: bool) -> Result<()> {
    if force {
        if let Some(path) = sqlite_path(&config.database_url).filter(|p| p.exists()) {
            std::fs::remove_file(&path).context("Failed to remove existing database")?;
            println!("🗑️  Removed existing database");
        }
    }

    let db = open(config).await?;
    db.pool().close().await;

    println!("✅ Database initialized: {}", config.database_url);
    println!("   Audit log: {}", config.audit_dir.display());
    Ok(())
}

/// Show database status
pub async fn show_status(config: &AppConfig) -> Result<()> {
    if let Some(path) = sqlite_path(&config.database_url).filter(|p| !p.exists()) {
        println!("❌ Database not found at {:?}", path);
        println!("   Run 'prereq init' to create the database");
        return Ok(());
    }

    let db = open(config).await?;
    let pool = db.pool();

    println!("📊 Database Status");
    println!("   URL: {}", config.database_url);
    println!();
    println!("   Persons:   {}", PersonRepo::count(pool).await?);
    println!("   Clients:   {}", ClientRepo::count(pool).await?);
    println!("   Documents: {}", DocumentRepo::count(pool).await?);
    println!("   Rules:     {}", RuleRepo::count(pool).await?);
    println!();
    println!(
        "   Audit files: {}",
        db.audit().list_files().map(|f| f.len()).unwrap_or(0)
    );
    println!(
        "   Warning window: {} days",
        config.engine.warning_window_days
    );

    pool.close().await;
    Ok(())
}
