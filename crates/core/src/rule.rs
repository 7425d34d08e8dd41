//! # Rule Module
//!
//! Prerequisite rules, their scopes, and the merge that turns global and
//! client-scoped rules into the effective rule set for a client.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized comparison key for a document type: trimmed, lowercase.
pub fn document_type_key(document_type: &str) -> String {
    document_type.trim().to_lowercase()
}

/// Validate a document type and return its trimmed display form
pub fn validate_document_type(document_type: &str) -> CoreResult<String> {
    let trimmed = document_type.trim();
    if trimmed.is_empty() {
        return Err(CoreError::EmptyDocumentType);
    }
    Ok(trimmed.to_string())
}

/// Validate a raw validity window coming from user input
pub fn validate_validity_days(validity_days: Option<i64>) -> CoreResult<Option<u32>> {
    match validity_days {
        None => Ok(None),
        Some(days) if days < 0 => Err(CoreError::NegativeValidity(days)),
        Some(days) => u32::try_from(days)
            .map(Some)
            .map_err(|_| CoreError::ValidityOutOfRange(days)),
    }
}

/// Where a rule applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "client_id", rename_all = "snake_case")]
pub enum RuleScope {
    /// Applies to every client
    Global,
    /// Applies to one client, overriding a global rule of the same type
    ClientSpecific(String),
}

impl RuleScope {
    /// Scope from an optional client id (`None` means global)
    pub fn from_client(client_id: Option<&str>) -> Self {
        match client_id {
            Some(id) => RuleScope::ClientSpecific(id.to_string()),
            None => RuleScope::Global,
        }
    }

    pub fn client_id(&self) -> Option<&str> {
        match self {
            RuleScope::Global => None,
            RuleScope::ClientSpecific(id) => Some(id),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, RuleScope::Global)
    }

    /// Storage key: `global` or `client:<id>`
    pub fn as_key(&self) -> String {
        match self {
            RuleScope::Global => "global".to_string(),
            RuleScope::ClientSpecific(id) => format!("client:{}", id),
        }
    }

    fn validate(&self) -> CoreResult<()> {
        match self {
            RuleScope::ClientSpecific(id) if id.trim().is_empty() => Err(CoreError::EmptyClientId),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for RuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_key())
    }
}

/// A stored prerequisite rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteRule {
    pub id: String,
    pub document_type: String,
    /// Days a document stays valid from its issue date; `None` never expires
    pub validity_days: Option<u32>,
    pub scope: RuleScope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrerequisiteRule {
    /// Build a rule from validated input and an allocated id
    pub fn from_new(id: &str, new_rule: NewRule) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            document_type: new_rule.document_type,
            validity_days: new_rule.validity_days,
            scope: new_rule.scope,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn type_key(&self) -> String {
        document_type_key(&self.document_type)
    }

    /// Uniqueness key `(scope, type)` as a single string
    pub fn unique_key(&self) -> String {
        format!("{}/{}", self.scope.as_key(), self.type_key())
    }

    /// Apply a patch, validating the changed fields
    pub fn apply(&mut self, patch: &RulePatch) -> CoreResult<()> {
        let document_type = match &patch.document_type {
            Some(document_type) => validate_document_type(document_type)?,
            None => self.document_type.clone(),
        };
        let validity_days = match patch.validity_days {
            Some(validity_days) => validate_validity_days(validity_days)?,
            None => self.validity_days,
        };

        self.document_type = document_type;
        self.validity_days = validity_days;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Validated input for rule creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRule {
    pub scope: RuleScope,
    pub document_type: String,
    pub validity_days: Option<u32>,
}

impl NewRule {
    pub fn new(scope: RuleScope, document_type: &str, validity_days: Option<i64>) -> CoreResult<Self> {
        scope.validate()?;
        Ok(Self {
            scope,
            document_type: validate_document_type(document_type)?,
            validity_days: validate_validity_days(validity_days)?,
        })
    }

    pub fn unique_key(&self) -> String {
        format!("{}/{}", self.scope.as_key(), document_type_key(&self.document_type))
    }
}

/// Partial update for a rule.
///
/// `validity_days: Some(None)` clears the window (document never expires).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePatch {
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default, with = "double_option")]
    pub validity_days: Option<Option<i64>>,
}

impl RulePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_type(mut self, document_type: &str) -> Self {
        self.document_type = Some(document_type.to_string());
        self
    }

    pub fn validity_days(mut self, validity_days: Option<i64>) -> Self {
        self.validity_days = Some(validity_days);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.document_type.is_none() && self.validity_days.is_none()
    }
}

/// Distinguishes a missing field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Option<i64>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<i64>::deserialize(deserializer).map(Some)
    }
}

/// A rule as seen by one client after merging. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRule {
    pub document_type: String,
    pub validity_days: Option<u32>,
    pub is_global: bool,
    pub source_rule_id: String,
}

impl EffectiveRule {
    fn from_rule(rule: &PrerequisiteRule, is_global: bool) -> Self {
        Self {
            document_type: rule.document_type.clone(),
            validity_days: rule.validity_days,
            is_global,
            source_rule_id: rule.id.clone(),
        }
    }

    pub fn type_key(&self) -> String {
        document_type_key(&self.document_type)
    }
}

/// Merge global and client rules into the effective set.
///
/// Starts from the global set; a client rule on the same type replaces the
/// global entry entirely, any other client rule is appended.
pub fn merge_effective_rules(
    global: &[PrerequisiteRule],
    client: &[PrerequisiteRule],
) -> Vec<EffectiveRule> {
    let mut effective: Vec<EffectiveRule> = global
        .iter()
        .map(|rule| EffectiveRule::from_rule(rule, true))
        .collect();

    for rule in client {
        let key = rule.type_key();
        let entry = EffectiveRule::from_rule(rule, false);
        match effective.iter().position(|e| e.type_key() == key) {
            Some(idx) => effective[idx] = entry,
            None => effective.push(entry),
        }
    }

    effective
}

/// Presentation order: global entries first, then alphabetical by type.
pub fn sort_for_display(rules: &mut [EffectiveRule]) {
    rules.sort_by(|a, b| {
        b.is_global
            .cmp(&a.is_global)
            .then_with(|| a.type_key().cmp(&b.type_key()))
    });
}
