//! Store traits - the contracts the compliance engine consumes.
//!
//! Implemented by [`crate::SqliteStore`] and [`crate::InMemoryStore`].

use async_trait::async_trait;
use prereq_core::{Client, Document, Person, PrerequisiteRule};

use crate::error::PersistenceResult;

/// Read/write access to prerequisite rules.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// All rules with `Global` scope
    async fn list_global_rules(&self) -> PersistenceResult<Vec<PrerequisiteRule>>;

    /// All rules scoped to one client (globals excluded)
    async fn list_rules_for_client(&self, client_id: &str) -> PersistenceResult<Vec<PrerequisiteRule>>;

    async fn get_rule(&self, rule_id: &str) -> PersistenceResult<PrerequisiteRule>;

    /// Insert a rule.
    ///
    /// The `(scope, type)` duplicate check and the write are one atomic
    /// operation; a collision returns `DuplicateKey` and leaves the store
    /// unchanged.
    async fn insert_rule(&self, rule: &PrerequisiteRule) -> PersistenceResult<()>;

    /// Replace a rule by id, with the same atomic duplicate check
    async fn update_rule(&self, rule: &PrerequisiteRule) -> PersistenceResult<()>;

    async fn delete_rule(&self, rule_id: &str) -> PersistenceResult<()>;

    /// Counter that changes with every successful rule write.
    ///
    /// Shared by everything writing to the same store, so cached effective
    /// rules can be checked against writes made elsewhere.
    async fn rules_version(&self) -> PersistenceResult<u64>;
}

/// Read access to issued documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_by_person(&self, person_id: &str) -> PersistenceResult<Vec<Document>>;
}

/// Read access to persons, clients and assignments.
#[async_trait]
pub trait PersonDirectory: Send + Sync {
    async fn get_person(&self, person_id: &str) -> PersistenceResult<Person>;

    async fn get_client(&self, client_id: &str) -> PersistenceResult<Client>;

    /// Persons assigned to `client_id`, or every person when `None`
    async fn list_persons(&self, client_id: Option<&str>) -> PersistenceResult<Vec<Person>>;
}
