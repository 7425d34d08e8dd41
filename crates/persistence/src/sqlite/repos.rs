//! Repository implementations for SQLite
//!
//! CRUD operations for all tables.

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::*;
use prereq_core::{Client, Document, Person, PrerequisiteRule};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Map a unique-constraint failure to `DuplicateKey`
fn map_unique(err: sqlx::Error, entity: &str, key: &str) -> PersistenceError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            PersistenceError::duplicate_key(entity, key)
        }
        _ => PersistenceError::Database(err),
    }
}

// ============================================================================
// Person Repository
// ============================================================================

/// Repository for the persons table
pub struct PersonRepo;

impl PersonRepo {
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> PersistenceResult<PersonRow> {
        sqlx::query_as::<_, PersonRow>("SELECT * FROM persons WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Person", id))
    }

    pub async fn get_all(pool: &SqlitePool) -> PersistenceResult<Vec<PersonRow>> {
        let rows = sqlx::query_as::<_, PersonRow>("SELECT * FROM persons ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    /// Persons assigned to a client
    pub async fn get_by_client(pool: &SqlitePool, client_id: &str) -> PersistenceResult<Vec<PersonRow>> {
        let rows = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT p.* FROM persons p
            JOIN assignments a ON a.person_id = p.id
            WHERE a.client_id = ?
            ORDER BY p.name
            "#,
        )
        .bind(client_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn insert(pool: &SqlitePool, person: &Person) -> PersistenceResult<()> {
        let id = person.id();
        sqlx::query("INSERT INTO persons (id, name, role, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&person.name)
            .bind(&person.role)
            .bind(person.created_at)
            .execute(pool)
            .await
            .map_err(|e| match map_unique(e, "Person", &id) {
                PersistenceError::DuplicateKey { .. } => PersistenceError::already_exists("Person", &id),
                other => other,
            })?;
        Ok(())
    }

    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM persons")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Client Repository
// ============================================================================

/// Repository for the clients table
pub struct ClientRepo;

impl ClientRepo {
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> PersistenceResult<ClientRow> {
        sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Client", id))
    }

    pub async fn get_all(pool: &SqlitePool) -> PersistenceResult<Vec<ClientRow>> {
        let rows = sqlx::query_as::<_, ClientRow>("SELECT * FROM clients ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    pub async fn insert(pool: &SqlitePool, client: &Client) -> PersistenceResult<()> {
        sqlx::query("INSERT INTO clients (id, name, portfolio, created_at) VALUES (?, ?, ?, ?)")
            .bind(&client.id)
            .bind(&client.name)
            .bind(&client.portfolio)
            .bind(client.created_at)
            .execute(pool)
            .await
            .map_err(|e| match map_unique(e, "Client", &client.id) {
                PersistenceError::DuplicateKey { .. } => {
                    PersistenceError::already_exists("Client", &client.id)
                }
                other => other,
            })?;
        Ok(())
    }

    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM clients")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Assignment Repository
// ============================================================================

/// Repository for the assignments table
pub struct AssignmentRepo;

impl AssignmentRepo {
    /// Assign a person to a client; assigning twice is a no-op
    pub async fn assign(pool: &SqlitePool, person_id: &str, client_id: &str) -> PersistenceResult<()> {
        PersonRepo::get_by_id(pool, person_id).await?;
        ClientRepo::get_by_id(pool, client_id).await?;

        sqlx::query(
            "INSERT OR IGNORE INTO assignments (person_id, client_id, assigned_at) VALUES (?, ?, ?)",
        )
        .bind(person_id)
        .bind(client_id)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_client(pool: &SqlitePool, client_id: &str) -> PersistenceResult<Vec<AssignmentRow>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            "SELECT * FROM assignments WHERE client_id = ?",
        )
        .bind(client_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

// ============================================================================
// Document Repository
// ============================================================================

/// Repository for the documents table
pub struct DocumentRepo;

impl DocumentRepo {
    pub async fn get_by_person(pool: &SqlitePool, person_id: &str) -> PersistenceResult<Vec<DocumentRow>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT * FROM documents WHERE person_id = ? ORDER BY issued_at DESC",
        )
        .bind(person_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn insert(pool: &SqlitePool, document: &Document) -> PersistenceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, person_id, document_type, name, issued_at, expires_at, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&document.id)
        .bind(&document.person_id)
        .bind(&document.document_type)
        .bind(&document.name)
        .bind(document.issued_at)
        .bind(document.expires_at)
        .bind(document.uploaded_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Rule Repository
// ============================================================================

/// Repository for the prerequisite_rules table
pub struct RuleRepo;

impl RuleRepo {
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> PersistenceResult<RuleRow> {
        sqlx::query_as::<_, RuleRow>("SELECT * FROM prerequisite_rules WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Rule", id))
    }

    pub async fn get_global(pool: &SqlitePool) -> PersistenceResult<Vec<RuleRow>> {
        let rows = sqlx::query_as::<_, RuleRow>(
            "SELECT * FROM prerequisite_rules WHERE scope_key = 'global' ORDER BY type_key",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_by_client(pool: &SqlitePool, client_id: &str) -> PersistenceResult<Vec<RuleRow>> {
        let rows = sqlx::query_as::<_, RuleRow>(
            "SELECT * FROM prerequisite_rules WHERE client_id = ? ORDER BY type_key",
        )
        .bind(client_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Insert; the unique index on `(scope_key, type_key)` rejects duplicates
    pub async fn insert(pool: &SqlitePool, rule: &PrerequisiteRule) -> PersistenceResult<()> {
        let row = RuleRow::from(rule);
        sqlx::query(
            r#"
            INSERT INTO prerequisite_rules
                (id, document_type, type_key, validity_days, scope_key, client_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.document_type)
        .bind(&row.type_key)
        .bind(row.validity_days)
        .bind(&row.scope_key)
        .bind(&row.client_id)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(pool)
        .await
        .map_err(|e| map_unique(e, "Rule", &rule.unique_key()))?;
        Ok(())
    }

    /// Update type and validity; scope never changes
    pub async fn update(pool: &SqlitePool, rule: &PrerequisiteRule) -> PersistenceResult<()> {
        let row = RuleRow::from(rule);
        let result = sqlx::query(
            r#"
            UPDATE prerequisite_rules
            SET document_type = ?, type_key = ?, validity_days = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&row.document_type)
        .bind(&row.type_key)
        .bind(row.validity_days)
        .bind(row.updated_at)
        .bind(&row.id)
        .execute(pool)
        .await
        .map_err(|e| map_unique(e, "Rule", &rule.unique_key()))?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Rule", &rule.id));
        }
        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> PersistenceResult<()> {
        let result = sqlx::query("DELETE FROM prerequisite_rules WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Rule", id));
        }
        Ok(())
    }

    /// Counter bumped by the rule triggers on every write
    pub async fn version(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT version FROM rule_versions WHERE id = 1")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM prerequisite_rules")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Database initialization
// ============================================================================

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Create a connection pool.
///
/// In-memory databases are pinned to one long-lived connection; each
/// SQLite memory connection is its own database.
pub async fn create_pool(database_url: &str) -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if is_memory_url(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options.connect_with(options).await?;
    Ok(pool)
}

/// Create all tables if missing
pub async fn create_schema(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

/// Connect and make sure the schema exists
pub async fn init_database(database_url: &str) -> PersistenceResult<SqlitePool> {
    let pool = create_pool(database_url).await?;
    create_schema(&pool).await?;
    tracing::debug!(database_url, "database schema ready");
    Ok(pool)
}
