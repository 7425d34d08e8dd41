//! # Persistence Errors
//!
//! Error types for the persistence layer, wrapping sqlx and IO errors.

use thiserror::Error;

/// Persistence layer errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    // === Database errors ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity} with id {id}")]
    AlreadyExists { entity: String, id: String },

    #[error("Duplicate key for {entity}: {key}")]
    DuplicateKey { entity: String, key: String },

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    // === Availability errors ===
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    // === Audit log errors ===
    #[error("Audit log IO error: {0}")]
    AuditIo(#[from] std::io::Error),

    #[error("Audit serialization error: {0}")]
    AuditSerialization(#[from] serde_json::Error),

    // === Conversion errors ===
    #[error("Invalid stored value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for PersistenceError
pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl PersistenceError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity: &str, id: &str) -> Self {
        Self::AlreadyExists {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn duplicate_key(entity: &str, key: &str) -> Self {
        Self::DuplicateKey {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }

    pub fn invalid_value(field: &str, value: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    pub fn is_database_error(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Unique constraint violation reported by the database
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            Self::DuplicateKey { .. } => true,
            _ => false,
        }
    }
}
