//! Effective-rule cache
//!
//! Memoizes resolver output per scope key, tagged with the store's rule
//! version at the time it was computed. An entry is served only while the
//! store still reports that version, so writes made through another
//! context or process make it stale.

use dashmap::DashMap;
use prereq_core::EffectiveRule;

#[derive(Debug)]
struct CachedRules {
    version: u64,
    rules: Vec<EffectiveRule>,
}

#[derive(Debug, Default)]
pub struct EffectiveRuleCache {
    entries: DashMap<String, CachedRules>,
}

impl EffectiveRuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules cached for `key`, if they were computed at store `version`
    pub fn get(&self, key: &str, version: u64) -> Option<Vec<EffectiveRule>> {
        self.entries
            .get(key)
            .filter(|entry| entry.version == version)
            .map(|entry| entry.rules.clone())
    }

    /// Store rules computed after reading store `version`.
    ///
    /// An entry already tagged with a newer version is kept.
    pub fn put(&self, key: &str, version: u64, rules: Vec<EffectiveRule>) {
        self.entries
            .entry(key.to_string())
            .and_modify(|entry| {
                if version >= entry.version {
                    *entry = CachedRules {
                        version,
                        rules: rules.clone(),
                    };
                }
            })
            .or_insert_with(|| CachedRules { version, rules });
    }

    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
