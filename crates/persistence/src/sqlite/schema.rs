//! Database schema definitions
//!
//! Row types for sqlx mapping from SQLite tables, plus conversions to the
//! domain types. Tables are created by [`SCHEMA_SQL`].

use chrono::{DateTime, NaiveDate, Utc};
use prereq_core::{Client, Document, Person, PrerequisiteRule, RuleScope, Rut};
use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, PersistenceResult};

/// Full schema, idempotent.
///
/// `(scope_key, type_key)` is unique so the duplicate-rule check and the
/// insert are one statement. Triggers bump `rule_versions` inside every
/// rule write, whichever process makes it.
pub const SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS persons (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        role TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS clients (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        portfolio TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS assignments (
        person_id TEXT NOT NULL,
        client_id TEXT NOT NULL,
        assigned_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (person_id, client_id),
        FOREIGN KEY (person_id) REFERENCES persons(id),
        FOREIGN KEY (client_id) REFERENCES clients(id)
    );

    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        person_id TEXT NOT NULL,
        document_type TEXT NOT NULL,
        name TEXT NOT NULL,
        issued_at DATE NOT NULL,
        expires_at DATE,
        uploaded_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (person_id) REFERENCES persons(id)
    );

    CREATE INDEX IF NOT EXISTS idx_documents_person ON documents(person_id);

    CREATE TABLE IF NOT EXISTS prerequisite_rules (
        id TEXT PRIMARY KEY,
        document_type TEXT NOT NULL,
        type_key TEXT NOT NULL,
        validity_days INTEGER,
        scope_key TEXT NOT NULL,
        client_id TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (scope_key, type_key)
    );

    CREATE INDEX IF NOT EXISTS idx_rules_client ON prerequisite_rules(client_id);

    CREATE TABLE IF NOT EXISTS rule_versions (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        version INTEGER NOT NULL
    );

    INSERT OR IGNORE INTO rule_versions (id, version) VALUES (1, 0);

    CREATE TRIGGER IF NOT EXISTS trg_rules_insert AFTER INSERT ON prerequisite_rules
    BEGIN
        UPDATE rule_versions SET version = version + 1 WHERE id = 1;
    END;

    CREATE TRIGGER IF NOT EXISTS trg_rules_update AFTER UPDATE ON prerequisite_rules
    BEGIN
        UPDATE rule_versions SET version = version + 1 WHERE id = 1;
    END;

    CREATE TRIGGER IF NOT EXISTS trg_rules_delete AFTER DELETE ON prerequisite_rules
    BEGIN
        UPDATE rule_versions SET version = version + 1 WHERE id = 1;
    END;
"#;

/// Row type for table `persons`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct PersonRow {
    pub id: String,
    pub name: String,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row type for table `clients`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ClientRow {
    pub id: String,
    pub name: String,
    pub portfolio: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row type for table `assignments`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AssignmentRow {
    pub person_id: String,
    pub client_id: String,
    pub assigned_at: DateTime<Utc>,
}

/// Row type for table `documents`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct DocumentRow {
    pub id: String,
    pub person_id: String,
    pub document_type: String,
    pub name: String,
    pub issued_at: NaiveDate,
    pub expires_at: Option<NaiveDate>,
    pub uploaded_at: DateTime<Utc>,
}

/// Row type for table `prerequisite_rules`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct RuleRow {
    pub id: String,
    pub document_type: String,
    pub type_key: String,
    pub validity_days: Option<i64>,
    pub scope_key: String,
    pub client_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// === Conversion implementations ===

impl From<&Person> for PersonRow {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id(),
            name: person.name.clone(),
            role: person.role.clone(),
            created_at: person.created_at,
        }
    }
}

impl TryFrom<PersonRow> for Person {
    type Error = PersistenceError;

    fn try_from(row: PersonRow) -> PersistenceResult<Self> {
        let rut = Rut::parse(&row.id).map_err(|_| PersistenceError::invalid_value("persons.id", &row.id))?;
        Ok(Person {
            rut,
            name: row.name,
            role: row.role,
            created_at: row.created_at,
        })
    }
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            name: row.name,
            portfolio: row.portfolio,
            created_at: row.created_at,
        }
    }
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            person_id: row.person_id,
            document_type: row.document_type,
            name: row.name,
            issued_at: row.issued_at,
            expires_at: row.expires_at,
            uploaded_at: row.uploaded_at,
        }
    }
}

impl From<&PrerequisiteRule> for RuleRow {
    fn from(rule: &PrerequisiteRule) -> Self {
        Self {
            id: rule.id.clone(),
            document_type: rule.document_type.clone(),
            type_key: rule.type_key(),
            validity_days: rule.validity_days.map(i64::from),
            scope_key: rule.scope.as_key(),
            client_id: rule.scope.client_id().map(str::to_string),
            created_at: rule.created_at,
            updated_at: rule.updated_at,
        }
    }
}

impl TryFrom<RuleRow> for PrerequisiteRule {
    type Error = PersistenceError;

    fn try_from(row: RuleRow) -> PersistenceResult<Self> {
        let validity_days = match row.validity_days {
            None => None,
            Some(days) => Some(u32::try_from(days).map_err(|_| {
                PersistenceError::invalid_value("prerequisite_rules.validity_days", &days.to_string())
            })?),
        };

        let scope = match (row.scope_key.as_str(), row.client_id) {
            ("global", None) => RuleScope::Global,
            (_, Some(client_id)) if row.scope_key == format!("client:{}", client_id) => {
                RuleScope::ClientSpecific(client_id)
            }
            (scope_key, _) => {
                return Err(PersistenceError::invalid_value(
                    "prerequisite_rules.scope_key",
                    scope_key,
                ))
            }
        };

        Ok(PrerequisiteRule {
            id: row.id,
            document_type: row.document_type,
            validity_days,
            scope,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
