//! RuleResolver - effective rules for a client or the global context

use prereq_core::{merge_effective_rules, EffectiveRule, RuleScope};

use crate::context::EngineContext;
use crate::error::EngineResult;

pub struct RuleResolver<'a> {
    ctx: &'a EngineContext,
}

impl<'a> RuleResolver<'a> {
    pub fn new(ctx: &'a EngineContext) -> Self {
        Self { ctx }
    }

    /// Global rules, with the client's overrides and additions merged in.
    ///
    /// Order is the merge order; use `sort_for_display` for presentation.
    pub async fn resolve_effective_rules(
        &self,
        client_id: Option<&str>,
    ) -> EngineResult<Vec<EffectiveRule>> {
        let key = RuleScope::from_client(client_id).as_key();

        let version = match self.ctx.cache() {
            Some(cache) => {
                let version = self
                    .ctx
                    .fetch("read rule version", self.ctx.rules().rules_version())
                    .await?;
                if let Some(rules) = cache.get(&key, version) {
                    tracing::debug!(scope = %key, version, "effective rules served from cache");
                    return Ok(rules);
                }
                Some(version)
            }
            None => None,
        };

        let effective = self.compute(client_id).await?;

        if let (Some(cache), Some(version)) = (self.ctx.cache(), version) {
            cache.put(&key, version, effective.clone());
        }

        tracing::debug!(scope = %key, count = effective.len(), "effective rules resolved");
        Ok(effective)
    }

    async fn compute(&self, client_id: Option<&str>) -> EngineResult<Vec<EffectiveRule>> {
        let store = self.ctx.rules();

        let global = self
            .ctx
            .fetch("list global rules", store.list_global_rules())
            .await?;

        let client = match client_id {
            Some(client_id) => {
                self.ctx
                    .fetch("list client rules", store.list_rules_for_client(client_id))
                    .await?
            }
            None => Vec::new(),
        };

        Ok(merge_effective_rules(&global, &client))
    }
}
