//! # Error Module
//!
//! Domain errors for Prereq, built with thiserror.

use thiserror::Error;

/// Core domain errors.
///
/// Validation failures raised before anything reaches a store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    // === Identity errors ===
    #[error("Invalid RUT: {0}")]
    InvalidRut(String),

    #[error("Client id must not be empty")]
    EmptyClientId,

    // === Rule errors ===
    #[error("Document type must not be empty")]
    EmptyDocumentType,

    #[error("Validity days must be non-negative, got {0}")]
    NegativeValidity(i64),

    #[error("Validity days out of range: {0}")]
    ValidityOutOfRange(i64),

    // === Document errors ===
    #[error("Document expires before it was issued: issued {issued_at}, expires {expires_at}")]
    ExpiryBeforeIssue {
        issued_at: String,
        expires_at: String,
    },

    // === Validation errors ===
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Result type alias with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Whether the error comes from rule input validation
    pub fn is_rule_input_error(&self) -> bool {
        matches!(
            self,
            CoreError::EmptyDocumentType
                | CoreError::NegativeValidity(_)
                | CoreError::ValidityOutOfRange(_)
                | CoreError::EmptyClientId
        )
    }
}
