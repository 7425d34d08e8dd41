//! # Compliance Module
//!
//! Classifies a person's documents against an effective rule set.

use crate::document::{Document, DocumentState, DocumentStateCalculator};
use crate::rule::{document_type_key, EffectiveRule};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Person-level outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    /// Every requirement satisfied (or no requirements)
    Full,
    /// Some satisfied, some missing or expired
    Partial,
    /// Requirements exist and none is satisfied
    None,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Full => "full",
            ComplianceStatus::Partial => "partial",
            ComplianceStatus::None => "none",
        }
    }

    /// Aggregate from the three buckets
    pub fn aggregate(
        satisfied: &BTreeSet<String>,
        missing: &BTreeSet<String>,
        expired: &BTreeSet<String>,
    ) -> Self {
        if missing.is_empty() && expired.is_empty() {
            ComplianceStatus::Full
        } else if satisfied.is_empty() {
            ComplianceStatus::None
        } else {
            ComplianceStatus::Partial
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Standing of one person against one client's effective rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub person_id: String,
    pub client_id: Option<String>,
    pub satisfied: BTreeSet<String>,
    pub missing: BTreeSet<String>,
    pub expired: BTreeSet<String>,
    pub status: ComplianceStatus,
    pub evaluated_on: NaiveDate,
}

impl ComplianceResult {
    pub fn is_full(&self) -> bool {
        self.status == ComplianceStatus::Full
    }

    pub fn is_partial(&self) -> bool {
        self.status == ComplianceStatus::Partial
    }

    /// Faltantes: missing ∪ expired
    pub fn gaps(&self) -> BTreeSet<String> {
        self.missing.union(&self.expired).cloned().collect()
    }

    pub fn required_count(&self) -> usize {
        self.satisfied.len() + self.missing.len() + self.expired.len()
    }
}

/// Row of the partial-compliance view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialComplianceEntry {
    pub person_id: String,
    pub missing: Vec<String>,
    pub expired: Vec<String>,
}

impl From<&ComplianceResult> for PartialComplianceEntry {
    fn from(result: &ComplianceResult) -> Self {
        Self {
            person_id: result.person_id.clone(),
            missing: result.missing.iter().cloned().collect(),
            expired: result.expired.iter().cloned().collect(),
        }
    }
}

/// One document with its computed state, for the document table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStatusRow {
    pub document_id: String,
    pub document_type: String,
    pub name: String,
    pub issued_at: NaiveDate,
    pub effective_expiry: Option<NaiveDate>,
    pub state: DocumentState,
    pub days_remaining: Option<i64>,
    /// Whether an effective rule requires this type
    pub required: bool,
}

/// Most favorable document: latest effective expiry, no expiry beats any
/// date, ties go to the most recent issue date.
pub fn select_best_document<'a>(
    documents: &[&'a Document],
    validity_days: Option<u32>,
) -> Option<&'a Document> {
    documents.iter().copied().max_by_key(|doc| {
        (
            doc.effective_expiry(validity_days).unwrap_or(NaiveDate::MAX),
            doc.issued_at,
        )
    })
}

fn group_by_type(documents: &[Document]) -> HashMap<String, Vec<&Document>> {
    let mut groups: HashMap<String, Vec<&Document>> = HashMap::new();
    for doc in documents {
        groups.entry(doc.type_key()).or_default().push(doc);
    }
    groups
}

/// Evaluate a person's documents against effective rules.
pub fn evaluate_documents(
    person_id: &str,
    client_id: Option<&str>,
    rules: &[EffectiveRule],
    documents: &[Document],
    calculator: &DocumentStateCalculator,
    today: NaiveDate,
) -> ComplianceResult {
    let groups = group_by_type(documents);

    let mut satisfied = BTreeSet::new();
    let mut missing = BTreeSet::new();
    let mut expired = BTreeSet::new();

    for rule in rules {
        let candidates = groups
            .get(&rule.type_key())
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        match select_best_document(candidates, rule.validity_days) {
            None => {
                missing.insert(rule.document_type.clone());
            }
            Some(doc) => {
                let (state, _) = calculator.document_state(doc, rule.validity_days, today);
                if state.satisfies() {
                    satisfied.insert(rule.document_type.clone());
                } else {
                    expired.insert(rule.document_type.clone());
                }
            }
        }
    }

    let status = ComplianceStatus::aggregate(&satisfied, &missing, &expired);

    ComplianceResult {
        person_id: person_id.to_string(),
        client_id: client_id.map(str::to_string),
        satisfied,
        missing,
        expired,
        status,
        evaluated_on: today,
    }
}

/// Every document of a person with its state under the matching rule.
///
/// Documents with no matching rule are reported with their own explicit
/// expiry only.
pub fn document_status_rows(
    rules: &[EffectiveRule],
    documents: &[Document],
    calculator: &DocumentStateCalculator,
    today: NaiveDate,
) -> Vec<DocumentStatusRow> {
    let windows: HashMap<String, Option<u32>> = rules
        .iter()
        .map(|r| (r.type_key(), r.validity_days))
        .collect();

    let mut rows: Vec<DocumentStatusRow> = documents
        .iter()
        .map(|doc| {
            let key = document_type_key(&doc.document_type);
            let validity_days = windows.get(&key).copied().flatten();
            let (state, days_remaining) = calculator.document_state(doc, validity_days, today);
            DocumentStatusRow {
                document_id: doc.id.clone(),
                document_type: doc.document_type.clone(),
                name: doc.name.clone(),
                issued_at: doc.issued_at,
                effective_expiry: doc.effective_expiry(validity_days),
                state,
                days_remaining,
                required: windows.contains_key(&key),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        a.document_type
            .to_lowercase()
            .cmp(&b.document_type.to_lowercase())
            .then_with(|| b.issued_at.cmp(&a.issued_at))
    });
    rows
}
