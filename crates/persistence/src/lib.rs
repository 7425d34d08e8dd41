//! # Prereq Persistence
//!
//! Persistence layer for the compliance engine: store traits, a SQLite
//! implementation, an in-memory implementation and the JSONL rule audit log.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Database                               │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────────┐ │
//! │  │   SQLite    │    │    JSONL    │    │     Repos       │ │
//! │  │  (state)    │    │   (audit)   │    │   (queries)     │ │
//! │  └─────────────┘    └─────────────┘    └─────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use prereq_persistence::{Database, RuleStore};
//!
//! let db = Database::open("sqlite:prereq.db?mode=rwc", "data/audit").await?;
//! let globals = db.store().list_global_rules().await?;
//! ```

pub mod audit;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use audit::{AuditFilter, AuditReader, RuleAuditLog};
pub use error::{PersistenceError, PersistenceResult};
pub use memory::InMemoryStore;
pub use sqlite::{
    init_database, AssignmentRepo, ClientRepo, DocumentRepo, PersonRepo, RuleRepo, SqliteStore,
};
pub use store::{DocumentStore, PersonDirectory, RuleStore};

use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;

/// Database facade - SQLite store plus the audit log
pub struct Database {
    store: Arc<SqliteStore>,
    audit: Arc<RuleAuditLog>,
}

impl Database {
    /// Connect, create the schema if needed and open the audit directory
    ///
    /// # Arguments
    /// * `db_url` - SQLite URL (e.g. "sqlite:prereq.db?mode=rwc")
    /// * `audit_path` - directory for the JSONL audit files
    pub async fn open<Q: AsRef<Path>>(db_url: &str, audit_path: Q) -> PersistenceResult<Self> {
        let pool = init_database(db_url).await?;
        let audit = RuleAuditLog::open(audit_path)?;

        Ok(Self {
            store: Arc::new(SqliteStore::new(pool)),
            audit: Arc::new(audit),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        self.store.pool()
    }

    /// Shared handle to the trait implementation
    pub fn store(&self) -> Arc<SqliteStore> {
        Arc::clone(&self.store)
    }

    pub fn audit(&self) -> Arc<RuleAuditLog> {
        Arc::clone(&self.audit)
    }

    pub fn audit_reader(&self) -> AuditReader {
        AuditReader::new(self.audit.base_path())
    }
}
