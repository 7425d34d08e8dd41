//! `SqliteStore` - store traits over the SQLite repos

use async_trait::async_trait;
use prereq_core::{Client, Document, Person, PrerequisiteRule};
use sqlx::SqlitePool;

use crate::error::PersistenceResult;
use crate::sqlite::repos::{ClientRepo, DocumentRepo, PersonRepo, RuleRepo};
use crate::sqlite::schema::RuleRow;
use crate::store::{DocumentStore, PersonDirectory, RuleStore};

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn rules_from_rows(rows: Vec<RuleRow>) -> PersistenceResult<Vec<PrerequisiteRule>> {
    rows.into_iter().map(PrerequisiteRule::try_from).collect()
}

#[async_trait]
impl RuleStore for SqliteStore {
    async fn list_global_rules(&self) -> PersistenceResult<Vec<PrerequisiteRule>> {
        rules_from_rows(RuleRepo::get_global(&self.pool).await?)
    }

    async fn list_rules_for_client(&self, client_id: &str) -> PersistenceResult<Vec<PrerequisiteRule>> {
        rules_from_rows(RuleRepo::get_by_client(&self.pool, client_id).await?)
    }

    async fn get_rule(&self, rule_id: &str) -> PersistenceResult<PrerequisiteRule> {
        PrerequisiteRule::try_from(RuleRepo::get_by_id(&self.pool, rule_id).await?)
    }

    async fn insert_rule(&self, rule: &PrerequisiteRule) -> PersistenceResult<()> {
        RuleRepo::insert(&self.pool, rule).await
    }

    async fn update_rule(&self, rule: &PrerequisiteRule) -> PersistenceResult<()> {
        RuleRepo::update(&self.pool, rule).await
    }

    async fn delete_rule(&self, rule_id: &str) -> PersistenceResult<()> {
        RuleRepo::delete(&self.pool, rule_id).await
    }

    async fn rules_version(&self) -> PersistenceResult<u64> {
        Ok(RuleRepo::version(&self.pool).await?.max(0) as u64)
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn find_by_person(&self, person_id: &str) -> PersistenceResult<Vec<Document>> {
        let rows = DocumentRepo::get_by_person(&self.pool, person_id).await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }
}

#[async_trait]
impl PersonDirectory for SqliteStore {
    async fn get_person(&self, person_id: &str) -> PersistenceResult<Person> {
        Person::try_from(PersonRepo::get_by_id(&self.pool, person_id).await?)
    }

    async fn get_client(&self, client_id: &str) -> PersistenceResult<Client> {
        Ok(Client::from(ClientRepo::get_by_id(&self.pool, client_id).await?))
    }

    async fn list_persons(&self, client_id: Option<&str>) -> PersistenceResult<Vec<Person>> {
        let rows = match client_id {
            Some(client_id) => PersonRepo::get_by_client(&self.pool, client_id).await?,
            None => PersonRepo::get_all(&self.pool).await?,
        };
        rows.into_iter().map(Person::try_from).collect()
    }
}
