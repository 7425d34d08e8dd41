//! # Prereq Core
//!
//! Domain types and pure algorithms for the document prerequisite
//! compliance engine.
//!
//! - [`rule`] - prerequisite rules and the global/client override merge
//! - [`document`] - documents and the temporal state calculator
//! - [`compliance`] - per-person classification and aggregation
//! - [`person`] / [`rut`] - workers, clients, assignments, RUT validation

pub mod compliance;
pub mod document;
pub mod error;
pub mod event;
pub mod person;
pub mod rule;
pub mod rut;

pub use compliance::{
    document_status_rows, evaluate_documents, select_best_document, ComplianceResult,
    ComplianceStatus, DocumentStatusRow, PartialComplianceEntry,
};
pub use document::{
    compute_state, effective_expiry, Document, DocumentState, DocumentStateCalculator,
    DEFAULT_WARNING_WINDOW_DAYS,
};
pub use error::{CoreError, CoreResult};
pub use event::{RuleEvent, RuleEventType};
pub use person::{Assignment, Client, Person};
pub use rule::{
    document_type_key, merge_effective_rules, sort_for_display, EffectiveRule, NewRule,
    PrerequisiteRule, RulePatch, RuleScope,
};
pub use rut::Rut;
