//! # Document Module
//!
//! Issued documents and their temporal state.
//!
//! Effective expiry is the explicit `expires_at` when present, otherwise
//! `issued_at + validity_days` from the matching rule, otherwise none.

use crate::error::{CoreError, CoreResult};
use crate::rule::{document_type_key, validate_document_type};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days before expiry during which a document counts as "por vencer".
pub const DEFAULT_WARNING_WINDOW_DAYS: i64 = 30;

/// Lifecycle state of a document on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    /// Vigente
    Valid,
    /// Por vencer
    ExpiringSoon,
    /// Vencido
    Expired,
    /// Sin fecha
    NoExpiry,
}

impl DocumentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentState::Valid => "valid",
            DocumentState::ExpiringSoon => "expiring_soon",
            DocumentState::Expired => "expired",
            DocumentState::NoExpiry => "no_expiry",
        }
    }

    /// Badge label shown in the console
    pub fn label(&self) -> &'static str {
        match self {
            DocumentState::Valid => "Vigente",
            DocumentState::ExpiringSoon => "Por vencer",
            DocumentState::Expired => "Vencido",
            DocumentState::NoExpiry => "Sin fecha",
        }
    }

    /// Whether a document in this state satisfies a requirement
    pub fn satisfies(&self) -> bool {
        !matches!(self, DocumentState::Expired)
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A document issued to a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub person_id: String,
    pub document_type: String,
    pub name: String,
    pub issued_at: NaiveDate,
    /// Explicit expiry printed on the document, overrides any rule window
    pub expires_at: Option<NaiveDate>,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        id: &str,
        person_id: &str,
        document_type: &str,
        name: &str,
        issued_at: NaiveDate,
    ) -> CoreResult<Self> {
        Ok(Self {
            id: id.to_string(),
            person_id: person_id.to_string(),
            document_type: validate_document_type(document_type)?,
            name: name.to_string(),
            issued_at,
            expires_at: None,
            uploaded_at: Utc::now(),
        })
    }

    pub fn with_expiry(mut self, expires_at: NaiveDate) -> CoreResult<Self> {
        if expires_at < self.issued_at {
            return Err(CoreError::ExpiryBeforeIssue {
                issued_at: self.issued_at.to_string(),
                expires_at: expires_at.to_string(),
            });
        }
        self.expires_at = Some(expires_at);
        Ok(self)
    }

    pub fn type_key(&self) -> String {
        document_type_key(&self.document_type)
    }

    /// Effective expiry under an optional rule window
    pub fn effective_expiry(&self, validity_days: Option<u32>) -> Option<NaiveDate> {
        effective_expiry(self.issued_at, self.expires_at, validity_days)
    }
}

/// Explicit expiry wins; otherwise issue date plus the rule window.
pub fn effective_expiry(
    issued_at: NaiveDate,
    expires_at: Option<NaiveDate>,
    validity_days: Option<u32>,
) -> Option<NaiveDate> {
    match (expires_at, validity_days) {
        (Some(explicit), _) => Some(explicit),
        (None, Some(days)) => Some(
            issued_at
                .checked_add_days(Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MAX),
        ),
        (None, None) => None,
    }
}

/// Derives document state from dates and a warning window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentStateCalculator {
    warning_window_days: i64,
}

impl Default for DocumentStateCalculator {
    fn default() -> Self {
        Self {
            warning_window_days: DEFAULT_WARNING_WINDOW_DAYS,
        }
    }
}

impl DocumentStateCalculator {
    pub fn new(warning_window_days: i64) -> Self {
        Self {
            warning_window_days: warning_window_days.max(0),
        }
    }

    pub fn warning_window_days(&self) -> i64 {
        self.warning_window_days
    }

    /// State and signed days remaining (negative when overdue)
    pub fn compute_state(
        &self,
        issued_at: NaiveDate,
        expires_at: Option<NaiveDate>,
        validity_days: Option<u32>,
        today: NaiveDate,
    ) -> (DocumentState, Option<i64>) {
        match effective_expiry(issued_at, expires_at, validity_days) {
            None => (DocumentState::NoExpiry, None),
            Some(expiry) => {
                let days_remaining = (expiry - today).num_days();
                (self.classify(days_remaining), Some(days_remaining))
            }
        }
    }

    pub fn classify(&self, days_remaining: i64) -> DocumentState {
        if days_remaining < 0 {
            DocumentState::Expired
        } else if days_remaining <= self.warning_window_days {
            DocumentState::ExpiringSoon
        } else {
            DocumentState::Valid
        }
    }

    /// Convenience for a stored document
    pub fn document_state(
        &self,
        document: &Document,
        validity_days: Option<u32>,
        today: NaiveDate,
    ) -> (DocumentState, Option<i64>) {
        self.compute_state(document.issued_at, document.expires_at, validity_days, today)
    }
}

/// `compute_state` with the default warning window
pub fn compute_state(
    issued_at: NaiveDate,
    expires_at: Option<NaiveDate>,
    validity_days: Option<u32>,
    today: NaiveDate,
) -> (DocumentState, Option<i64>) {
    DocumentStateCalculator::default().compute_state(issued_at, expires_at, validity_days, today)
}
