//! In-memory store
//!
//! Keeps every record behind one `RwLock`, so the duplicate check and the
//! write of a rule mutation happen under the same write guard. Used by
//! tests and by embedders that load their data from elsewhere.

use async_trait::async_trait;
use prereq_core::{Assignment, Client, Document, Person, PrerequisiteRule};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{PersistenceError, PersistenceResult};
use crate::store::{DocumentStore, PersonDirectory, RuleStore};

#[derive(Debug, Default)]
struct MemoryState {
    rules: BTreeMap<String, PrerequisiteRule>,
    documents: Vec<Document>,
    persons: BTreeMap<String, Person>,
    clients: BTreeMap<String, Client>,
    assignments: Vec<Assignment>,
    rules_version: u64,
}

/// In-memory implementation of every store trait
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every read and write fails with `Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> PersistenceResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn read(&self) -> PersistenceResult<RwLockReadGuard<'_, MemoryState>> {
        self.check_available()?;
        self.state
            .read()
            .map_err(|_| PersistenceError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> PersistenceResult<RwLockWriteGuard<'_, MemoryState>> {
        self.check_available()?;
        self.state
            .write()
            .map_err(|_| PersistenceError::Unavailable("store lock poisoned".to_string()))
    }

    pub fn add_person(&self, person: Person) -> PersistenceResult<()> {
        let mut state = self.write()?;
        let id = person.id();
        if state.persons.contains_key(&id) {
            return Err(PersistenceError::already_exists("Person", &id));
        }
        state.persons.insert(id, person);
        Ok(())
    }

    pub fn add_client(&self, client: Client) -> PersistenceResult<()> {
        let mut state = self.write()?;
        if state.clients.contains_key(&client.id) {
            return Err(PersistenceError::already_exists("Client", &client.id));
        }
        state.clients.insert(client.id.clone(), client);
        Ok(())
    }

    pub fn assign(&self, person_id: &str, client_id: &str) -> PersistenceResult<()> {
        let mut state = self.write()?;
        if !state.persons.contains_key(person_id) {
            return Err(PersistenceError::not_found("Person", person_id));
        }
        if !state.clients.contains_key(client_id) {
            return Err(PersistenceError::not_found("Client", client_id));
        }
        let exists = state
            .assignments
            .iter()
            .any(|a| a.person_id == person_id && a.client_id == client_id);
        if !exists {
            state.assignments.push(Assignment::new(person_id, client_id));
        }
        Ok(())
    }

    pub fn add_document(&self, document: Document) -> PersistenceResult<()> {
        let mut state = self.write()?;
        if state.documents.iter().any(|d| d.id == document.id) {
            return Err(PersistenceError::already_exists("Document", &document.id));
        }
        state.documents.push(document);
        Ok(())
    }

    /// Number of stored rules, regardless of availability
    pub fn rule_count(&self) -> usize {
        self.state.read().map(|s| s.rules.len()).unwrap_or(0)
    }

    fn find_collision<'a>(
        state: &'a MemoryState,
        rule: &PrerequisiteRule,
    ) -> Option<&'a PrerequisiteRule> {
        let key = rule.unique_key();
        state
            .rules
            .values()
            .find(|existing| existing.id != rule.id && existing.unique_key() == key)
    }
}

#[async_trait]
impl RuleStore for InMemoryStore {
    async fn list_global_rules(&self) -> PersistenceResult<Vec<PrerequisiteRule>> {
        let state = self.read()?;
        Ok(state
            .rules
            .values()
            .filter(|r| r.scope.is_global())
            .cloned()
            .collect())
    }

    async fn list_rules_for_client(&self, client_id: &str) -> PersistenceResult<Vec<PrerequisiteRule>> {
        let state = self.read()?;
        Ok(state
            .rules
            .values()
            .filter(|r| r.scope.client_id() == Some(client_id))
            .cloned()
            .collect())
    }

    async fn get_rule(&self, rule_id: &str) -> PersistenceResult<PrerequisiteRule> {
        let state = self.read()?;
        state
            .rules
            .get(rule_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("Rule", rule_id))
    }

    async fn insert_rule(&self, rule: &PrerequisiteRule) -> PersistenceResult<()> {
        let mut state = self.write()?;
        if state.rules.contains_key(&rule.id) {
            return Err(PersistenceError::already_exists("Rule", &rule.id));
        }
        if Self::find_collision(&state, rule).is_some() {
            return Err(PersistenceError::duplicate_key("Rule", &rule.unique_key()));
        }
        state.rules.insert(rule.id.clone(), rule.clone());
        state.rules_version += 1;
        Ok(())
    }

    async fn update_rule(&self, rule: &PrerequisiteRule) -> PersistenceResult<()> {
        let mut state = self.write()?;
        if !state.rules.contains_key(&rule.id) {
            return Err(PersistenceError::not_found("Rule", &rule.id));
        }
        if Self::find_collision(&state, rule).is_some() {
            return Err(PersistenceError::duplicate_key("Rule", &rule.unique_key()));
        }
        state.rules.insert(rule.id.clone(), rule.clone());
        state.rules_version += 1;
        Ok(())
    }

    async fn delete_rule(&self, rule_id: &str) -> PersistenceResult<()> {
        let mut state = self.write()?;
        state
            .rules
            .remove(rule_id)
            .ok_or_else(|| PersistenceError::not_found("Rule", rule_id))?;
        state.rules_version += 1;
        Ok(())
    }

    async fn rules_version(&self) -> PersistenceResult<u64> {
        Ok(self.read()?.rules_version)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find_by_person(&self, person_id: &str) -> PersistenceResult<Vec<Document>> {
        let state = self.read()?;
        Ok(state
            .documents
            .iter()
            .filter(|d| d.person_id == person_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PersonDirectory for InMemoryStore {
    async fn get_person(&self, person_id: &str) -> PersistenceResult<Person> {
        let state = self.read()?;
        state
            .persons
            .get(person_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("Person", person_id))
    }

    async fn get_client(&self, client_id: &str) -> PersistenceResult<Client> {
        let state = self.read()?;
        state
            .clients
            .get(client_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("Client", client_id))
    }

    async fn list_persons(&self, client_id: Option<&str>) -> PersistenceResult<Vec<Person>> {
        let state = self.read()?;
        let persons = match client_id {
            None => state.persons.values().cloned().collect(),
            Some(client_id) => state
                .assignments
                .iter()
                .filter(|a| a.client_id == client_id)
                .filter_map(|a| state.persons.get(&a.person_id).cloned())
                .collect(),
        };
        Ok(persons)
    }
}
