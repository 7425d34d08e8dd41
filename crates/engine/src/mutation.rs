//! RuleMutationService - create, update and delete prerequisite rules
//!
//! Input is validated before the store is touched. The duplicate check is
//! the store's atomic insert/update, never a separate read. Every success
//! drops the effective-rule cache and is appended to the audit log.

use prereq_core::{NewRule, PrerequisiteRule, RuleEvent, RulePatch, RuleScope};
use uuid::Uuid;

use crate::context::EngineContext;
use crate::error::{EngineError, EngineResult};

/// Actor recorded when none is given
pub const SYSTEM_ACTOR: &str = "system";

pub struct RuleMutationService<'a> {
    ctx: &'a EngineContext,
    actor_id: String,
}

impl<'a> RuleMutationService<'a> {
    pub fn new(ctx: &'a EngineContext) -> Self {
        Self {
            ctx,
            actor_id: SYSTEM_ACTOR.to_string(),
        }
    }

    /// Administrator recorded in audit events
    pub fn as_actor(mut self, actor_id: &str) -> Self {
        self.actor_id = actor_id.to_string();
        self
    }

    /// Create a rule and return its id
    pub async fn create(
        &self,
        scope: RuleScope,
        document_type: &str,
        validity_days: Option<i64>,
    ) -> EngineResult<String> {
        let new_rule = NewRule::new(scope, document_type, validity_days)?;
        let rule = PrerequisiteRule::from_new(&Uuid::new_v4().to_string(), new_rule);

        self.ctx
            .fetch("insert rule", self.ctx.rules().insert_rule(&rule))
            .await
            .inspect_err(|e| {
                if e.is_duplicate_rule() {
                    tracing::info!(key = %rule.unique_key(), "duplicate rule rejected");
                }
            })?;

        self.ctx.invalidate_cache();
        self.ctx
            .record(|event_id| RuleEvent::created(event_id, &self.actor_id, rule.clone()));

        tracing::info!(
            rule_id = %rule.id,
            scope = %rule.scope,
            document_type = %rule.document_type,
            validity_days = ?rule.validity_days,
            actor = %self.actor_id,
            "rule created"
        );
        Ok(rule.id)
    }

    /// Rename and/or change the validity window of a rule.
    ///
    /// The scope never changes. An empty patch returns the current rule
    /// without writing or auditing anything.
    pub async fn update(&self, rule_id: &str, patch: &RulePatch) -> EngineResult<PrerequisiteRule> {
        let previous = self
            .ctx
            .fetch("get rule", self.ctx.rules().get_rule(rule_id))
            .await?;

        if patch.is_empty() {
            tracing::debug!(rule_id, "empty rule patch, nothing to update");
            return Ok(previous);
        }

        let mut rule = previous.clone();
        rule.apply(patch)?;

        self.ctx
            .fetch("update rule", self.ctx.rules().update_rule(&rule))
            .await?;

        self.ctx.invalidate_cache();
        self.ctx.record(|event_id| {
            RuleEvent::updated(event_id, &self.actor_id, previous, rule.clone())
        });

        tracing::info!(
            rule_id,
            document_type = %rule.document_type,
            validity_days = ?rule.validity_days,
            actor = %self.actor_id,
            "rule updated"
        );
        Ok(rule)
    }

    /// Delete a rule that belongs to `scope`.
    ///
    /// A rule in another scope is reported as `NotFound`.
    pub async fn delete(&self, rule_id: &str, scope: &RuleScope) -> EngineResult<()> {
        let rule = self
            .ctx
            .fetch("get rule", self.ctx.rules().get_rule(rule_id))
            .await?;

        if rule.scope != *scope {
            return Err(EngineError::not_found("Rule", &format!("{} in {}", rule_id, scope)));
        }

        self.ctx
            .fetch("delete rule", self.ctx.rules().delete_rule(rule_id))
            .await?;

        self.ctx.invalidate_cache();

        tracing::info!(
            rule_id,
            scope = %rule.scope,
            document_type = %rule.document_type,
            actor = %self.actor_id,
            "rule deleted"
        );
        self.ctx
            .record(|event_id| RuleEvent::deleted(event_id, &self.actor_id, rule));
        Ok(())
    }
}
