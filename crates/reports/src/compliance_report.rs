//! Compliance reports
//!
//! Report data for the compliance table, the partial-compliance listing,
//! a client's effective rules, a person's documents and the rule audit
//! trail. Rendering is left to the exporters.

use chrono::{DateTime, NaiveDate, Utc};
use prereq_core::{
    sort_for_display, ComplianceResult, ComplianceStatus, DocumentState, DocumentStatusRow,
    EffectiveRule, PartialComplianceEntry, RuleEvent,
};
use std::collections::{BTreeSet, HashMap};

use crate::exporters::ReportData;

fn join(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(", ")
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

fn scope_label(client_id: Option<&str>) -> String {
    client_id.map_or_else(|| "global".to_string(), |c| format!("client {}", c))
}

// ============================================================================
// Compliance table
// ============================================================================

/// Status per person against one client's rules
#[derive(Debug, Clone)]
pub struct ComplianceReport {
    pub title: String,
    pub client_id: Option<String>,
    pub evaluated_on: NaiveDate,
    pub results: Vec<ComplianceResult>,
    /// person_id -> display name
    pub names: HashMap<String, String>,
    pub generated_at: DateTime<Utc>,
}

impl ComplianceReport {
    pub fn new(client_id: Option<&str>, evaluated_on: NaiveDate, results: Vec<ComplianceResult>) -> Self {
        Self {
            title: format!("Compliance - {}", scope_label(client_id)),
            client_id: client_id.map(str::to_string),
            evaluated_on,
            results,
            names: HashMap::new(),
            generated_at: Utc::now(),
        }
    }

    pub fn with_names(mut self, names: HashMap<String, String>) -> Self {
        self.names = names;
        self
    }

    pub fn count(&self, status: ComplianceStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

impl ReportData for ComplianceReport {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        ["RUT", "Name", "Status", "Satisfied", "Missing", "Expired"]
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.results
            .iter()
            .map(|r| {
                vec![
                    r.person_id.clone(),
                    self.names.get(&r.person_id).cloned().unwrap_or_default(),
                    r.status.as_str().to_string(),
                    join(&r.satisfied),
                    join(&r.missing),
                    join(&r.expired),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![
            ("Evaluated On".to_string(), self.evaluated_on.to_string()),
            ("Persons".to_string(), self.results.len().to_string()),
            ("Full".to_string(), self.count(ComplianceStatus::Full).to_string()),
            ("Partial".to_string(), self.count(ComplianceStatus::Partial).to_string()),
            ("None".to_string(), self.count(ComplianceStatus::None).to_string()),
            ("Generated At".to_string(), self.generated_at.to_rfc3339()),
        ]
    }
}

// ============================================================================
// Partial compliance
// ============================================================================

/// Persons meeting some but not all requirements, with their faltantes
#[derive(Debug, Clone)]
pub struct PartialComplianceReport {
    pub title: String,
    pub client_id: String,
    pub evaluated_on: NaiveDate,
    pub entries: Vec<PartialComplianceEntry>,
    pub names: HashMap<String, String>,
}

impl PartialComplianceReport {
    pub fn new(client_id: &str, evaluated_on: NaiveDate, entries: Vec<PartialComplianceEntry>) -> Self {
        Self {
            title: format!("Partial compliance - client {}", client_id),
            client_id: client_id.to_string(),
            evaluated_on,
            entries,
            names: HashMap::new(),
        }
    }

    pub fn with_names(mut self, names: HashMap<String, String>) -> Self {
        self.names = names;
        self
    }
}

impl ReportData for PartialComplianceReport {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        vec![
            "RUT".to_string(),
            "Name".to_string(),
            "Missing".to_string(),
            "Expired".to_string(),
        ]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.entries
            .iter()
            .map(|e| {
                vec![
                    e.person_id.clone(),
                    self.names.get(&e.person_id).cloned().unwrap_or_default(),
                    e.missing.join(", "),
                    e.expired.join(", "),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        let gaps: usize = self
            .entries
            .iter()
            .map(|e| e.missing.len() + e.expired.len())
            .sum();
        vec![
            ("Client".to_string(), self.client_id.clone()),
            ("Evaluated On".to_string(), self.evaluated_on.to_string()),
            ("Partial Persons".to_string(), self.entries.len().to_string()),
            ("Faltantes".to_string(), gaps.to_string()),
        ]
    }
}

// ============================================================================
// Effective rules
// ============================================================================

/// A client's effective rules in display order
#[derive(Debug, Clone)]
pub struct EffectiveRulesReport {
    pub title: String,
    pub rules: Vec<EffectiveRule>,
}

impl EffectiveRulesReport {
    /// Sorts for display: global entries first, then by type
    pub fn new(client_id: Option<&str>, mut rules: Vec<EffectiveRule>) -> Self {
        sort_for_display(&mut rules);
        Self {
            title: format!("Effective rules - {}", scope_label(client_id)),
            rules,
        }
    }
}

impl ReportData for EffectiveRulesReport {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        vec![
            "Document Type".to_string(),
            "Validity (days)".to_string(),
            "Origin".to_string(),
            "Rule ID".to_string(),
        ]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.rules
            .iter()
            .map(|r| {
                vec![
                    r.document_type.clone(),
                    r.validity_days
                        .map_or_else(|| "no expiry".to_string(), |d| d.to_string()),
                    if r.is_global { "global" } else { "client" }.to_string(),
                    r.source_rule_id.clone(),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        let global = self.rules.iter().filter(|r| r.is_global).count();
        vec![
            ("Rules".to_string(), self.rules.len().to_string()),
            ("Global".to_string(), global.to_string()),
            ("Client".to_string(), (self.rules.len() - global).to_string()),
        ]
    }
}

// ============================================================================
// Document status
// ============================================================================

/// One person's documents with state badges
#[derive(Debug, Clone)]
pub struct DocumentStatusReport {
    pub title: String,
    pub person_id: String,
    pub evaluated_on: NaiveDate,
    pub rows: Vec<DocumentStatusRow>,
}

impl DocumentStatusReport {
    pub fn new(person_id: &str, evaluated_on: NaiveDate, rows: Vec<DocumentStatusRow>) -> Self {
        Self {
            title: format!("Documents - {}", person_id),
            person_id: person_id.to_string(),
            evaluated_on,
            rows,
        }
    }

    pub fn count(&self, state: DocumentState) -> usize {
        self.rows.iter().filter(|r| r.state == state).count()
    }
}

impl ReportData for DocumentStatusReport {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        ["Type", "Name", "Issued", "Expires", "State", "Days", "Required"]
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                vec![
                    r.document_type.clone(),
                    r.name.clone(),
                    r.issued_at.to_string(),
                    or_dash(r.effective_expiry.map(|d| d.to_string())),
                    r.state.label().to_string(),
                    or_dash(r.days_remaining.map(|d| d.to_string())),
                    if r.required { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![
            ("Evaluated On".to_string(), self.evaluated_on.to_string()),
            ("Documents".to_string(), self.rows.len().to_string()),
            (
                DocumentState::Valid.label().to_string(),
                self.count(DocumentState::Valid).to_string(),
            ),
            (
                DocumentState::ExpiringSoon.label().to_string(),
                self.count(DocumentState::ExpiringSoon).to_string(),
            ),
            (
                DocumentState::Expired.label().to_string(),
                self.count(DocumentState::Expired).to_string(),
            ),
            (
                DocumentState::NoExpiry.label().to_string(),
                self.count(DocumentState::NoExpiry).to_string(),
            ),
        ]
    }
}

// ============================================================================
// Rule audit trail
// ============================================================================

#[derive(Debug, Clone)]
pub struct RuleAuditReport {
    pub title: String,
    pub events: Vec<RuleEvent>,
}

impl RuleAuditReport {
    pub fn new(title: &str, events: Vec<RuleEvent>) -> Self {
        Self {
            title: title.to_string(),
            events,
        }
    }
}

impl ReportData for RuleAuditReport {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        ["Event", "Timestamp", "Type", "Actor", "Rule", "Scope", "Document Type", "Validity"]
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.events
            .iter()
            .map(|e| {
                vec![
                    e.event_id.clone(),
                    e.timestamp.to_rfc3339(),
                    e.event_type.as_str().to_string(),
                    e.actor_id.clone(),
                    e.rule.id.clone(),
                    e.rule.scope.as_key(),
                    e.rule.document_type.clone(),
                    or_dash(e.rule.validity_days.map(|d| d.to_string())),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![("Events".to_string(), self.events.len().to_string())]
    }
}
