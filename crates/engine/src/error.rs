//! Engine errors
//!
//! The four outcomes callers have to tell apart. Persistence and core
//! errors are folded into them at the crate boundary.

use prereq_core::CoreError;
use prereq_persistence::PersistenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A rule for the same (scope, document type) already exists
    #[error("Duplicate rule: {key}")]
    DuplicateRule { key: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Store failed or timed out; retryable, never means "no rules"
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn duplicate_rule(key: &str) -> Self {
        Self::DuplicateRule {
            key: key.to_string(),
        }
    }

    /// Stable snake_case tag, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateRule { .. } => "duplicate_rule",
            Self::NotFound { .. } => "not_found",
            Self::DataUnavailable(_) => "data_unavailable",
            Self::InvalidInput(_) => "invalid_input",
        }
    }

    pub fn is_duplicate_rule(&self) -> bool {
        matches!(self, Self::DuplicateRule { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable(_))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    pub fn is_retryable(&self) -> bool {
        self.is_data_unavailable()
    }
}

impl From<PersistenceError> for EngineError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { entity, id } => Self::NotFound { entity, id },
            PersistenceError::DuplicateKey { key, .. } => Self::DuplicateRule { key },
            PersistenceError::AlreadyExists { entity, id } => {
                Self::InvalidInput(format!("{} already exists: {}", entity, id))
            }
            other => Self::DataUnavailable(other.to_string()),
        }
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
