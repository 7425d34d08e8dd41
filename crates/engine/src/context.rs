//! Engine context - store handles, configuration, cache and audit log
//!
//! Services borrow the context, the way they borrow a database handle.

use prereq_core::{DocumentStateCalculator, RuleEvent};
use prereq_persistence::{
    DocumentStore, PersistenceResult, PersonDirectory, RuleAuditLog, RuleStore,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::EffectiveRuleCache;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

pub struct EngineContext {
    rules: Arc<dyn RuleStore>,
    documents: Arc<dyn DocumentStore>,
    directory: Arc<dyn PersonDirectory>,
    config: EngineConfig,
    calculator: DocumentStateCalculator,
    cache: Option<EffectiveRuleCache>,
    audit: Option<Arc<RuleAuditLog>>,
}

impl EngineContext {
    /// Create from separate collaborators
    pub fn new(
        rules: Arc<dyn RuleStore>,
        documents: Arc<dyn DocumentStore>,
        directory: Arc<dyn PersonDirectory>,
        config: EngineConfig,
    ) -> Self {
        let cache = config.cache_effective_rules.then(EffectiveRuleCache::new);
        Self {
            rules,
            documents,
            directory,
            calculator: DocumentStateCalculator::new(config.warning_window_days),
            config,
            cache,
            audit: None,
        }
    }

    /// Create from one store implementing every trait
    pub fn from_store<S>(store: Arc<S>, config: EngineConfig) -> Self
    where
        S: RuleStore + DocumentStore + PersonDirectory + 'static,
    {
        Self::new(store.clone(), store.clone(), store, config)
    }

    pub fn with_audit(mut self, audit: Arc<RuleAuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn rules(&self) -> &dyn RuleStore {
        self.rules.as_ref()
    }

    pub fn documents(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }

    pub fn directory(&self) -> &dyn PersonDirectory {
        self.directory.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calculator(&self) -> &DocumentStateCalculator {
        &self.calculator
    }

    pub fn cache(&self) -> Option<&EffectiveRuleCache> {
        self.cache.as_ref()
    }

    pub fn audit(&self) -> Option<&RuleAuditLog> {
        self.audit.as_deref()
    }

    /// Run a store call under the configured timeout.
    ///
    /// A timeout becomes `DataUnavailable`; store errors go through the
    /// usual persistence mapping.
    pub async fn fetch<T, F>(&self, what: &str, op: F) -> EngineResult<T>
    where
        F: Future<Output = PersistenceResult<T>>,
    {
        let limit = Duration::from_millis(self.config.store_timeout_ms);
        match tokio::time::timeout(limit, op).await {
            Ok(result) => result.map_err(EngineError::from),
            Err(_) => {
                tracing::warn!(what, timeout_ms = self.config.store_timeout_ms, "store call timed out");
                Err(EngineError::DataUnavailable(format!(
                    "{} timed out after {} ms",
                    what, self.config.store_timeout_ms
                )))
            }
        }
    }

    /// Append to the audit log when one is configured.
    ///
    /// The store write already happened; a failed append is logged, not
    /// returned.
    pub fn record(&self, build: impl FnOnce(&str) -> RuleEvent) {
        let Some(audit) = self.audit() else {
            return;
        };
        let event = build(&audit.next_event_id());
        if let Err(e) = audit.append(&event) {
            tracing::warn!(error = %e, event_id = %event.event_id, "failed to append rule event");
        }
    }

    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }
}
