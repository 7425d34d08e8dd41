//! # Prereq Reports
//!
//! Exports compliance data as CSV, JSON or Markdown.
//!
//! ## Exporters
//!
//! - [`CsvExporter`] - CSV with quoting, configurable delimiter
//! - [`JsonExporter`] - JSON, pretty or compact
//! - [`MarkdownExporter`] - Markdown tables
//!
//! ## Reports
//!
//! - [`ComplianceReport`] - status per person for a client
//! - [`PartialComplianceReport`] - partial persons and their faltantes
//! - [`EffectiveRulesReport`] - merged rules in display order
//! - [`DocumentStatusReport`] - one person's documents with state badges
//! - [`RuleAuditReport`] - rule mutation history
//!
//! ```rust,ignore
//! use prereq_reports::{ComplianceReport, ReportFormat};
//!
//! let report = ComplianceReport::new(Some("C1"), today, results);
//! let output = ReportFormat::Markdown.exporter().export(&report);
//! ```

pub mod compliance_report;
pub mod exporters;

pub use compliance_report::{
    ComplianceReport, DocumentStatusReport, EffectiveRulesReport, PartialComplianceReport,
    RuleAuditReport,
};
pub use exporters::{
    CsvExporter, JsonExporter, MarkdownExporter, ReportData, ReportExporter, ReportFormat,
};
