//! Integration tests for the SQLite store against an in-memory database

use chrono::NaiveDate;
use prereq_core::{Client, Document, NewRule, Person, PrerequisiteRule, RuleScope};
use prereq_persistence::{
    init_database, AssignmentRepo, ClientRepo, Database, DocumentRepo, DocumentStore,
    PersonDirectory, PersonRepo, RuleStore, SqliteStore,
};
use tempfile::TempDir;

async fn memory_store() -> SqliteStore {
    let pool = init_database("sqlite::memory:").await.unwrap();
    SqliteStore::new(pool)
}

fn rule(id: &str, scope: RuleScope, document_type: &str, days: Option<i64>) -> PrerequisiteRule {
    PrerequisiteRule::from_new(id, NewRule::new(scope, document_type, days).unwrap())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_rule_crud_round_trip() {
    let store = memory_store().await;

    let global = rule("R1", RuleScope::Global, "License", Some(365));
    let scoped = rule("R2", RuleScope::ClientSpecific("C1".into()), "license", Some(180));
    store.insert_rule(&global).await.unwrap();
    store.insert_rule(&scoped).await.unwrap();

    let globals = store.list_global_rules().await.unwrap();
    assert_eq!(globals.len(), 1);
    assert_eq!(globals[0].document_type, "License");
    assert_eq!(globals[0].validity_days, Some(365));

    let for_client = store.list_rules_for_client("C1").await.unwrap();
    assert_eq!(for_client.len(), 1);
    assert_eq!(for_client[0].scope, RuleScope::ClientSpecific("C1".into()));

    let mut updated = store.get_rule("R2").await.unwrap();
    updated.validity_days = None;
    store.update_rule(&updated).await.unwrap();
    assert_eq!(store.get_rule("R2").await.unwrap().validity_days, None);

    store.delete_rule("R2").await.unwrap();
    assert!(store.get_rule("R2").await.unwrap_err().is_not_found());
    assert!(store.delete_rule("R2").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_unique_index_rejects_duplicate_type_in_scope() {
    let store = memory_store().await;
    store
        .insert_rule(&rule("R1", RuleScope::Global, "license", None))
        .await
        .unwrap();

    let err = store
        .insert_rule(&rule("R2", RuleScope::Global, " LICENSE ", None))
        .await
        .unwrap_err();
    assert!(err.is_duplicate_key());
    assert_eq!(store.list_global_rules().await.unwrap().len(), 1);

    store
        .insert_rule(&rule("R3", RuleScope::Global, "certificate", None))
        .await
        .unwrap();
    let mut renamed = store.get_rule("R3").await.unwrap();
    renamed.document_type = "License".to_string();
    assert!(store.update_rule(&renamed).await.unwrap_err().is_duplicate_key());
}

#[tokio::test]
async fn test_update_missing_rule_is_not_found() {
    let store = memory_store().await;
    let ghost = rule("R9", RuleScope::Global, "ghost", None);
    assert!(store.update_rule(&ghost).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_persons_clients_assignments_and_documents() {
    let store = memory_store().await;
    let pool = store.pool();

    let ana = Person::parse("12.345.678-5", "Ana").unwrap().with_role("driver");
    let luis = Person::parse("11111111-1", "Luis").unwrap();
    PersonRepo::insert(pool, &ana).await.unwrap();
    PersonRepo::insert(pool, &luis).await.unwrap();
    assert!(PersonRepo::insert(pool, &ana).await.is_err());

    let client = Client::new("C1", "Minera Norte").unwrap().with_portfolio("Norte");
    ClientRepo::insert(pool, &client).await.unwrap();

    AssignmentRepo::assign(pool, "12345678-5", "C1").await.unwrap();
    AssignmentRepo::assign(pool, "12345678-5", "C1").await.unwrap();
    assert_eq!(AssignmentRepo::get_by_client(pool, "C1").await.unwrap().len(), 1);
    assert!(AssignmentRepo::assign(pool, "12345678-5", "NOPE")
        .await
        .unwrap_err()
        .is_not_found());

    let assigned = store.list_persons(Some("C1")).await.unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].id(), "12345678-5");
    assert_eq!(assigned[0].role.as_deref(), Some("driver"));
    assert_eq!(store.list_persons(None).await.unwrap().len(), 2);

    let fetched = store.get_client("C1").await.unwrap();
    assert_eq!(fetched.portfolio.as_deref(), Some("Norte"));

    let doc = Document::new("D1", "12345678-5", "license", "license.pdf", date(2026, 1, 10))
        .unwrap()
        .with_expiry(date(2027, 1, 10))
        .unwrap();
    DocumentRepo::insert(pool, &doc).await.unwrap();

    let docs = store.find_by_person("12345678-5").await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].issued_at, date(2026, 1, 10));
    assert_eq!(docs[0].expires_at, Some(date(2027, 1, 10)));
    assert!(store.find_by_person("11111111-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_database_facade_opens_file_and_audit_dir() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("prereq.db");
    let url = format!("sqlite:{}?mode=rwc", db_path.display());

    let db = Database::open(&url, temp_dir.path().join("audit")).await.unwrap();
    db.store()
        .insert_rule(&rule("R1", RuleScope::Global, "license", None))
        .await
        .unwrap();

    assert!(temp_dir.path().join("audit").is_dir());
    assert_eq!(db.store().list_global_rules().await.unwrap().len(), 1);
    assert!(db.audit_reader().read_all().unwrap().is_empty());
}

#[tokio::test]
async fn test_rules_version_follows_writes_across_connections() {
    let temp_dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}?mode=rwc", temp_dir.path().join("prereq.db").display());
    let first = SqliteStore::new(init_database(&url).await.unwrap());
    let second = SqliteStore::new(init_database(&url).await.unwrap());

    assert_eq!(first.rules_version().await.unwrap(), 0);

    first
        .insert_rule(&rule("R1", RuleScope::Global, "license", Some(365)))
        .await
        .unwrap();
    let after_insert = second.rules_version().await.unwrap();
    assert_eq!(after_insert, 1);

    // Rejected writes leave the version alone
    assert!(second
        .insert_rule(&rule("R2", RuleScope::Global, "LICENSE", None))
        .await
        .is_err());
    assert!(second.delete_rule("R9").await.is_err());
    assert_eq!(first.rules_version().await.unwrap(), after_insert);

    let mut updated = second.get_rule("R1").await.unwrap();
    updated.validity_days = Some(180);
    second.update_rule(&updated).await.unwrap();
    second.delete_rule("R1").await.unwrap();
    assert_eq!(first.rules_version().await.unwrap(), 3);
}
