//! # Event Module
//!
//! Rule mutation events, appended to the JSONL audit log so every
//! administrator change to the prerequisite rules can be traced.

use crate::rule::PrerequisiteRule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of rule mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleEventType {
    RuleCreated,
    RuleUpdated,
    RuleDeleted,
}

impl RuleEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleEventType::RuleCreated => "rule_created",
            RuleEventType::RuleUpdated => "rule_updated",
            RuleEventType::RuleDeleted => "rule_deleted",
        }
    }
}

impl fmt::Display for RuleEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One administrator change to a rule. Immutable, append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEvent {
    /// EVT_000001, EVT_000002, ...
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: RuleEventType,
    /// Administrator who made the change
    pub actor_id: String,
    /// Rule state after the change (before it, for deletions)
    pub rule: PrerequisiteRule,
    /// Rule state before an update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<PrerequisiteRule>,
}

impl RuleEvent {
    pub fn new(
        event_id: String,
        event_type: RuleEventType,
        actor_id: &str,
        rule: PrerequisiteRule,
    ) -> Self {
        Self {
            event_id,
            timestamp: Utc::now(),
            event_type,
            actor_id: actor_id.to_string(),
            rule,
            previous: None,
        }
    }

    pub fn created(event_id: &str, actor_id: &str, rule: PrerequisiteRule) -> Self {
        Self::new(event_id.to_string(), RuleEventType::RuleCreated, actor_id, rule)
    }

    pub fn updated(
        event_id: &str,
        actor_id: &str,
        previous: PrerequisiteRule,
        rule: PrerequisiteRule,
    ) -> Self {
        let mut event = Self::new(event_id.to_string(), RuleEventType::RuleUpdated, actor_id, rule);
        event.previous = Some(previous);
        event
    }

    pub fn deleted(event_id: &str, actor_id: &str, rule: PrerequisiteRule) -> Self {
        Self::new(event_id.to_string(), RuleEventType::RuleDeleted, actor_id, rule)
    }

    pub fn rule_id(&self) -> &str {
        &self.rule.id
    }
}
