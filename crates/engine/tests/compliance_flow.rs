//! Integration tests for resolver + evaluator + mutation flow
//!
//! Runs the engine against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use chrono::{Days, NaiveDate};
use prereq_core::{
    sort_for_display, Client, ComplianceStatus, Document, DocumentState, Person,
    PrerequisiteRule, RuleEventType, RulePatch, RuleScope,
};
use prereq_engine::{
    ComplianceEvaluator, EngineConfig, EngineContext, RuleMutationService, RuleResolver,
};
use prereq_persistence::{
    AuditFilter, AuditReader, Database, InMemoryStore, PersistenceResult, RuleAuditLog,
    RuleStore,
};
use tempfile::TempDir;

const ANA: &str = "12345678-5";
const LUIS: &str = "11111111-1";
const PEDRO: &str = "10000013-K";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
}

fn days_ago(days: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(days)).unwrap()
}

fn days_ahead(days: u64) -> NaiveDate {
    today().checked_add_days(Days::new(days)).unwrap()
}

fn client_c1() -> RuleScope {
    RuleScope::ClientSpecific("C1".to_string())
}

/// Store with three persons assigned to client C1
fn seeded_store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();
    store.add_person(Person::parse(ANA, "Ana").unwrap()).unwrap();
    store.add_person(Person::parse(LUIS, "Luis").unwrap()).unwrap();
    store.add_person(Person::parse(PEDRO, "Pedro").unwrap()).unwrap();
    store.add_client(Client::new("C1", "Minera Norte").unwrap()).unwrap();
    store.add_client(Client::new("C2", "Forestal Sur").unwrap()).unwrap();
    for person in [ANA, LUIS, PEDRO] {
        store.assign(person, "C1").unwrap();
    }
    Arc::new(store)
}

fn context(store: &Arc<InMemoryStore>) -> EngineContext {
    EngineContext::from_store(store.clone(), EngineConfig::default())
}

fn add_doc(store: &InMemoryStore, id: &str, person: &str, doc_type: &str, issued: NaiveDate) {
    let doc = Document::new(id, person, doc_type, &format!("{}.pdf", id), issued).unwrap();
    store.add_document(doc).unwrap();
}

fn add_doc_expiring(
    store: &InMemoryStore,
    id: &str,
    person: &str,
    doc_type: &str,
    issued: NaiveDate,
    expires: NaiveDate,
) {
    let doc = Document::new(id, person, doc_type, &format!("{}.pdf", id), issued)
        .unwrap()
        .with_expiry(expires)
        .unwrap();
    store.add_document(doc).unwrap();
}

// ============================================================================
// Resolver properties
// ============================================================================

#[tokio::test]
async fn test_override_replaces_global_entry() {
    let store = seeded_store();
    let ctx = context(&store);
    let mutations = RuleMutationService::new(&ctx);

    let global_id = mutations
        .create(RuleScope::Global, "License", Some(365))
        .await
        .unwrap();
    let override_id = mutations
        .create(client_c1(), "license", Some(180))
        .await
        .unwrap();

    let effective = RuleResolver::new(&ctx)
        .resolve_effective_rules(Some("C1"))
        .await
        .unwrap();
    assert_eq!(effective.len(), 1);
    assert_eq!(effective[0].source_rule_id, override_id);
    assert_eq!(effective[0].validity_days, Some(180));
    assert!(!effective[0].is_global);

    let global_only = RuleResolver::new(&ctx)
        .resolve_effective_rules(None)
        .await
        .unwrap();
    assert_eq!(global_only.len(), 1);
    assert_eq!(global_only[0].source_rule_id, global_id);
    assert!(global_only[0].is_global);
}

#[tokio::test]
async fn test_client_additions_sit_alongside_unrelated_globals() {
    let store = seeded_store();
    let ctx = context(&store);
    let mutations = RuleMutationService::new(&ctx);

    mutations.create(RuleScope::Global, "certificate", None).await.unwrap();
    mutations.create(RuleScope::Global, "medical exam", Some(365)).await.unwrap();
    mutations.create(client_c1(), "induction", Some(90)).await.unwrap();
    mutations
        .create(RuleScope::ClientSpecific("C2".into()), "altitude exam", None)
        .await
        .unwrap();

    let mut effective = RuleResolver::new(&ctx)
        .resolve_effective_rules(Some("C1"))
        .await
        .unwrap();
    sort_for_display(&mut effective);

    let types: Vec<&str> = effective.iter().map(|r| r.document_type.as_str()).collect();
    assert_eq!(types, vec!["certificate", "medical exam", "induction"]);
    assert!(effective[0].is_global && effective[1].is_global);
    assert!(!effective[2].is_global);
}

#[tokio::test]
async fn test_resolution_is_idempotent_without_writes() {
    let store = seeded_store();
    let ctx = context(&store);
    let mutations = RuleMutationService::new(&ctx);
    mutations.create(RuleScope::Global, "license", Some(365)).await.unwrap();
    mutations.create(client_c1(), "induction", None).await.unwrap();

    let resolver = RuleResolver::new(&ctx);
    let first = resolver.resolve_effective_rules(Some("C1")).await.unwrap();
    let second = resolver.resolve_effective_rules(Some("C1")).await.unwrap();
    assert_eq!(first, second);

    // Same answer without the cache
    let uncached = EngineContext::from_store(
        store.clone(),
        EngineConfig {
            cache_effective_rules: false,
            ..EngineConfig::default()
        },
    );
    let third = RuleResolver::new(&uncached)
        .resolve_effective_rules(Some("C1"))
        .await
        .unwrap();
    assert_eq!(first, third);
}

#[tokio::test]
async fn test_deleting_override_re_exposes_global() {
    let store = seeded_store();
    let ctx = context(&store);
    let mutations = RuleMutationService::new(&ctx);

    let global_id = mutations
        .create(RuleScope::Global, "license", Some(365))
        .await
        .unwrap();
    let override_id = mutations
        .create(client_c1(), "license", Some(180))
        .await
        .unwrap();

    // Warm the cache with the override in place
    let before = RuleResolver::new(&ctx)
        .resolve_effective_rules(Some("C1"))
        .await
        .unwrap();
    assert_eq!(before[0].source_rule_id, override_id);

    mutations.delete(&override_id, &client_c1()).await.unwrap();

    let after = RuleResolver::new(&ctx)
        .resolve_effective_rules(Some("C1"))
        .await
        .unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].source_rule_id, global_id);
    assert_eq!(after[0].validity_days, Some(365));
    assert!(after[0].is_global);
}

#[tokio::test]
async fn test_empty_rule_set_is_valid() {
    let store = seeded_store();
    let ctx = context(&store);

    let effective = RuleResolver::new(&ctx)
        .resolve_effective_rules(Some("C1"))
        .await
        .unwrap();
    assert!(effective.is_empty());
}

// ============================================================================
// Evaluator
// ============================================================================

/// Global license 365 days, C1 override 180 days, issued 100 days ago
#[tokio::test]
async fn test_scenario_override_window_applies() {
    let store = seeded_store();
    let ctx = context(&store);
    let mutations = RuleMutationService::new(&ctx);
    mutations.create(RuleScope::Global, "license", Some(365)).await.unwrap();
    mutations.create(client_c1(), "license", Some(180)).await.unwrap();
    add_doc(&store, "D1", ANA, "license", days_ago(100));

    let evaluator = ComplianceEvaluator::new(&ctx);

    let under_client = evaluator.evaluate(ANA, Some("C1"), today()).await.unwrap();
    assert_eq!(under_client.status, ComplianceStatus::Full);
    assert!(under_client.satisfied.contains("license"));

    let rows = evaluator.document_report(ANA, Some("C1"), today()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].days_remaining, Some(80));
    assert_eq!(rows[0].state, DocumentState::Valid);
    assert!(rows[0].required);

    let global_rows = evaluator.document_report(ANA, None, today()).await.unwrap();
    assert_eq!(global_rows[0].days_remaining, Some(265));
    assert_eq!(global_rows[0].state, DocumentState::Valid);
}

/// Client-only license missing, global certificate present
#[tokio::test]
async fn test_scenario_partial_when_client_requirement_missing() {
    let store = seeded_store();
    let ctx = context(&store);
    let mutations = RuleMutationService::new(&ctx);
    mutations.create(RuleScope::Global, "certificate", None).await.unwrap();
    mutations.create(client_c1(), "license", Some(365)).await.unwrap();
    add_doc(&store, "D1", ANA, "Certificate", days_ago(400));

    let result = ComplianceEvaluator::new(&ctx)
        .evaluate(ANA, Some("C1"), today())
        .await
        .unwrap();

    assert_eq!(result.status, ComplianceStatus::Partial);
    assert_eq!(result.satisfied.iter().collect::<Vec<_>>(), vec!["certificate"]);
    assert_eq!(result.missing.iter().collect::<Vec<_>>(), vec!["license"]);
    assert!(result.expired.is_empty());
}

#[tokio::test]
async fn test_no_rules_means_full_compliance() {
    let store = seeded_store();
    let ctx = context(&store);

    let result = ComplianceEvaluator::new(&ctx)
        .evaluate(ANA, Some("C1"), today())
        .await
        .unwrap();

    assert_eq!(result.status, ComplianceStatus::Full);
    assert!(result.missing.is_empty());
    assert!(result.expired.is_empty());
}

#[tokio::test]
async fn test_expiry_boundary_today_and_yesterday() {
    let store = seeded_store();
    let ctx = context(&store);
    RuleMutationService::new(&ctx)
        .create(RuleScope::Global, "license", None)
        .await
        .unwrap();

    add_doc_expiring(&store, "D1", ANA, "license", days_ago(300), today());
    add_doc_expiring(&store, "D2", LUIS, "license", days_ago(300), days_ago(1));

    let evaluator = ComplianceEvaluator::new(&ctx);

    let ana_rows = evaluator.document_report(ANA, None, today()).await.unwrap();
    assert_eq!(ana_rows[0].state, DocumentState::ExpiringSoon);
    assert_eq!(ana_rows[0].days_remaining, Some(0));
    let ana = evaluator.evaluate(ANA, None, today()).await.unwrap();
    assert_eq!(ana.status, ComplianceStatus::Full);

    let luis_rows = evaluator.document_report(LUIS, None, today()).await.unwrap();
    assert_eq!(luis_rows[0].state, DocumentState::Expired);
    assert_eq!(luis_rows[0].days_remaining, Some(-1));
    let luis = evaluator.evaluate(LUIS, None, today()).await.unwrap();
    assert_eq!(luis.status, ComplianceStatus::None);
    assert!(luis.expired.contains("license"));
}

#[tokio::test]
async fn test_most_favorable_document_wins() {
    let store = seeded_store();
    let ctx = context(&store);
    RuleMutationService::new(&ctx)
        .create(RuleScope::Global, "license", Some(365))
        .await
        .unwrap();

    // Old one expired under the window, renewal still valid
    add_doc(&store, "OLD", ANA, "license", days_ago(500));
    add_doc(&store, "NEW", ANA, "LICENSE", days_ago(10));

    let result = ComplianceEvaluator::new(&ctx)
        .evaluate(ANA, None, today())
        .await
        .unwrap();
    assert_eq!(result.status, ComplianceStatus::Full);
}

#[tokio::test]
async fn test_configured_warning_window() {
    let store = seeded_store();
    let ctx = EngineContext::from_store(
        store.clone(),
        EngineConfig {
            warning_window_days: 7,
            ..EngineConfig::default()
        },
    );
    RuleMutationService::new(&ctx)
        .create(RuleScope::Global, "license", None)
        .await
        .unwrap();
    add_doc_expiring(&store, "D1", ANA, "license", days_ago(10), days_ahead(20));

    let rows = ComplianceEvaluator::new(&ctx)
        .document_report(ANA, None, today())
        .await
        .unwrap();
    assert_eq!(rows[0].state, DocumentState::Valid);
}

#[tokio::test]
async fn test_unknown_person_is_not_found() {
    let store = seeded_store();
    let ctx = context(&store);
    let evaluator = ComplianceEvaluator::new(&ctx);

    let err = evaluator.evaluate("5126663-3", None, today()).await.unwrap_err();
    assert!(err.is_not_found());

    let err = evaluator
        .document_report("5126663-3", Some("C1"), today())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_unknown_client_is_not_found() {
    let store = seeded_store();
    let ctx = context(&store);
    RuleMutationService::new(&ctx)
        .create(RuleScope::Global, "license", None)
        .await
        .unwrap();
    add_doc(&store, "D1", ANA, "license", days_ago(5));
    let evaluator = ComplianceEvaluator::new(&ctx);

    let err = evaluator
        .evaluate(ANA, Some("NO_SUCH_CLIENT"), today())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = evaluator
        .partial_compliance("NO_SUCH_CLIENT", today())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = evaluator
        .compliance_table(Some("NO_SUCH_CLIENT"), today())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = evaluator
        .evaluate_many(&[ANA.to_string()], Some("NO_SUCH_CLIENT"), today())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = evaluator
        .document_report(ANA, Some("NO_SUCH_CLIENT"), today())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    // A known client without persons of its own is still fine
    let result = evaluator.evaluate(ANA, Some("C2"), today()).await.unwrap();
    assert_eq!(result.status, ComplianceStatus::Full);
    assert!(evaluator.partial_compliance("C2", today()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_evaluate_many_keeps_input_order() {
    let store = seeded_store();
    let ctx = context(&store);
    RuleMutationService::new(&ctx)
        .create(RuleScope::Global, "license", None)
        .await
        .unwrap();
    add_doc(&store, "D1", LUIS, "license", days_ago(5));

    let ids = vec![PEDRO.to_string(), LUIS.to_string(), ANA.to_string()];
    let results = ComplianceEvaluator::new(&ctx)
        .evaluate_many(&ids, None, today())
        .await
        .unwrap();

    let order: Vec<&str> = results.iter().map(|r| r.person_id.as_str()).collect();
    assert_eq!(order, vec![PEDRO, LUIS, ANA]);
    assert_eq!(results[1].status, ComplianceStatus::Full);
    assert_eq!(results[0].status, ComplianceStatus::None);
}

#[tokio::test]
async fn test_partial_compliance_lists_only_partial_persons() {
    let store = seeded_store();
    let ctx = context(&store);
    let mutations = RuleMutationService::new(&ctx);
    mutations.create(RuleScope::Global, "certificate", None).await.unwrap();
    mutations.create(client_c1(), "license", Some(365)).await.unwrap();
    mutations.create(client_c1(), "induction", Some(30)).await.unwrap();

    // Ana: everything valid -> Full
    add_doc(&store, "A1", ANA, "certificate", days_ago(10));
    add_doc(&store, "A2", ANA, "license", days_ago(10));
    add_doc(&store, "A3", ANA, "induction", days_ago(10));
    // Luis: certificate ok, license missing, induction expired -> Partial
    add_doc(&store, "L1", LUIS, "certificate", days_ago(10));
    add_doc(&store, "L3", LUIS, "induction", days_ago(60));
    // Pedro: nothing -> None

    let partial = ComplianceEvaluator::new(&ctx)
        .partial_compliance("C1", today())
        .await
        .unwrap();

    assert_eq!(partial.len(), 1);
    assert_eq!(partial[0].person_id, LUIS);
    assert_eq!(partial[0].missing, vec!["license".to_string()]);
    assert_eq!(partial[0].expired, vec!["induction".to_string()]);

    let table = ComplianceEvaluator::new(&ctx)
        .compliance_table(Some("C1"), today())
        .await
        .unwrap();
    assert_eq!(table.len(), 3);
}

// ============================================================================
// Mutations
// ============================================================================

/// Duplicate global license is rejected and the store keeps one rule
#[tokio::test]
async fn test_scenario_duplicate_rule_rejected() {
    let store = seeded_store();
    let ctx = context(&store);
    let mutations = RuleMutationService::new(&ctx);

    mutations.create(RuleScope::Global, "license", Some(365)).await.unwrap();
    let err = mutations
        .create(RuleScope::Global, "  LICENSE ", Some(180))
        .await
        .unwrap_err();

    assert!(err.is_duplicate_rule());
    assert_eq!(store.rule_count(), 1);
    assert_eq!(store.list_global_rules().await.unwrap()[0].validity_days, Some(365));
}

const RACERS: usize = 8;

/// Exactly one create wins; every other one is a `DuplicateRule`
fn assert_single_winner(outcomes: &[Result<String, prereq_engine::EngineError>]) {
    let created = outcomes.iter().filter(|r| r.is_ok()).count();
    let duplicates = outcomes
        .iter()
        .filter(|r| r.as_ref().is_err_and(|e| e.is_duplicate_rule()))
        .count();
    assert_eq!(created, 1);
    assert_eq!(duplicates, RACERS - 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_in_memory() {
    let store = seeded_store();
    let ctx = Arc::new(context(&store));

    let handles: Vec<_> = (0..RACERS)
        .map(|i| {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                RuleMutationService::new(&ctx)
                    .create(RuleScope::Global, "license", Some(30 + i as i64))
                    .await
            })
        })
        .collect();

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    assert_single_winner(&outcomes);
    assert_eq!(store.rule_count(), 1);
    assert_eq!(store.list_global_rules().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_sqlite_file() {
    let temp_dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}?mode=rwc", temp_dir.path().join("prereq.db").display());
    let db = Database::open(&url, temp_dir.path().join("audit")).await.unwrap();
    let store = db.store();
    let ctx = EngineContext::from_store(store.clone(), EngineConfig::default());

    // Mixed spellings normalize to the same key
    let creates = (0..RACERS).map(|i| {
        let document_type = if i % 2 == 0 { "license" } else { " LICENSE " };
        let ctx = &ctx;
        async move {
            RuleMutationService::new(ctx)
                .create(RuleScope::Global, document_type, None)
                .await
        }
    });
    let outcomes = join_all(creates).await;

    assert_single_winner(&outcomes);
    assert_eq!(store.list_global_rules().await.unwrap().len(), 1);
    assert_eq!(store.rules_version().await.unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_input_never_reaches_store() {
    let store = seeded_store();
    let ctx = context(&store);
    let mutations = RuleMutationService::new(&ctx);

    assert!(mutations
        .create(RuleScope::Global, "license", Some(-1))
        .await
        .unwrap_err()
        .is_invalid_input());
    assert!(mutations
        .create(RuleScope::Global, "   ", None)
        .await
        .unwrap_err()
        .is_invalid_input());
    assert!(mutations
        .create(RuleScope::ClientSpecific(" ".into()), "license", None)
        .await
        .unwrap_err()
        .is_invalid_input());
    assert_eq!(store.rule_count(), 0);
}

#[tokio::test]
async fn test_update_rename_collision_and_clear_validity() {
    let store = seeded_store();
    let ctx = context(&store);
    let mutations = RuleMutationService::new(&ctx);

    mutations.create(client_c1(), "license", Some(365)).await.unwrap();
    let induction = mutations.create(client_c1(), "induction", Some(30)).await.unwrap();

    let err = mutations
        .update(&induction, &RulePatch::new().document_type("License"))
        .await
        .unwrap_err();
    assert!(err.is_duplicate_rule());

    let cleared = mutations
        .update(&induction, &RulePatch::new().validity_days(None))
        .await
        .unwrap();
    assert_eq!(cleared.validity_days, None);
    assert_eq!(cleared.document_type, "induction");
    assert_eq!(cleared.scope, client_c1());

    assert!(mutations
        .update("missing", &RulePatch::new().validity_days(Some(10)))
        .await
        .unwrap_err()
        .is_not_found());
    assert!(mutations
        .update("missing", &RulePatch::new())
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_empty_patch_returns_rule_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let store = seeded_store();
    let audit = Arc::new(RuleAuditLog::open(temp_dir.path()).unwrap());
    let ctx = context(&store).with_audit(audit);
    let mutations = RuleMutationService::new(&ctx);

    let id = mutations.create(client_c1(), "license", Some(365)).await.unwrap();
    let version = store.rules_version().await.unwrap();

    let rule = mutations.update(&id, &RulePatch::new()).await.unwrap();
    assert_eq!(rule.id, id);
    assert_eq!(rule.document_type, "license");
    assert_eq!(rule.validity_days, Some(365));
    assert_eq!(rule.scope, client_c1());

    assert_eq!(store.rules_version().await.unwrap(), version);
    let events = AuditReader::new(temp_dir.path())
        .read_filtered(&AuditFilter::new().rule(&id))
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, RuleEventType::RuleCreated);
}

#[tokio::test]
async fn test_update_is_visible_through_cache() {
    let store = seeded_store();
    let ctx = context(&store);
    let mutations = RuleMutationService::new(&ctx);
    let id = mutations.create(RuleScope::Global, "license", Some(365)).await.unwrap();

    let resolver = RuleResolver::new(&ctx);
    resolver.resolve_effective_rules(None).await.unwrap();
    assert!(ctx.cache().map_or(false, |c| !c.is_empty()));

    mutations
        .update(&id, &RulePatch::new().validity_days(Some(90)))
        .await
        .unwrap();

    let effective = resolver.resolve_effective_rules(None).await.unwrap();
    assert_eq!(effective[0].validity_days, Some(90));
}

#[tokio::test]
async fn test_write_through_other_context_invalidates_cache() {
    let store = seeded_store();
    let server = context(&store);
    let admin = context(&store);

    RuleMutationService::new(&admin)
        .create(RuleScope::Global, "license", Some(365))
        .await
        .unwrap();

    let resolver = RuleResolver::new(&server);
    let before = resolver.resolve_effective_rules(Some("C1")).await.unwrap();
    assert_eq!(before[0].validity_days, Some(365));
    assert!(server.cache().map_or(false, |c| !c.is_empty()));

    let override_id = RuleMutationService::new(&admin)
        .create(client_c1(), "license", Some(180))
        .await
        .unwrap();

    let after = resolver.resolve_effective_rules(Some("C1")).await.unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].validity_days, Some(180));
    assert_eq!(after[0].source_rule_id, override_id);

    RuleMutationService::new(&admin)
        .delete(&override_id, &client_c1())
        .await
        .unwrap();

    let restored = resolver.resolve_effective_rules(Some("C1")).await.unwrap();
    assert_eq!(restored[0].validity_days, Some(365));
}

#[tokio::test]
async fn test_delete_requires_matching_scope() {
    let store = seeded_store();
    let ctx = context(&store);
    let mutations = RuleMutationService::new(&ctx);
    let id = mutations.create(client_c1(), "license", None).await.unwrap();

    let err = mutations.delete(&id, &RuleScope::Global).await.unwrap_err();
    assert!(err.is_not_found());
    let err = mutations
        .delete(&id, &RuleScope::ClientSpecific("C2".into()))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.rule_count(), 1);

    mutations.delete(&id, &client_c1()).await.unwrap();
    assert_eq!(store.rule_count(), 0);
    assert!(mutations.delete(&id, &client_c1()).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_mutations_are_audited() {
    let temp_dir = TempDir::new().unwrap();
    let store = seeded_store();
    let audit = Arc::new(RuleAuditLog::open(temp_dir.path()).unwrap());
    let ctx = context(&store).with_audit(audit);
    let mutations = RuleMutationService::new(&ctx).as_actor("admin@prereq");

    let id = mutations.create(RuleScope::Global, "license", Some(365)).await.unwrap();
    mutations
        .update(&id, &RulePatch::new().validity_days(Some(180)))
        .await
        .unwrap();
    mutations.delete(&id, &RuleScope::Global).await.unwrap();
    // Rejected mutations leave no trace
    mutations.create(RuleScope::Global, "", None).await.unwrap_err();

    let reader = AuditReader::new(temp_dir.path());
    let events = reader.read_filtered(&AuditFilter::new().rule(&id)).unwrap();
    let kinds: Vec<RuleEventType> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(
        kinds,
        vec![
            RuleEventType::RuleCreated,
            RuleEventType::RuleUpdated,
            RuleEventType::RuleDeleted
        ]
    );
    assert!(events.iter().all(|e| e.actor_id == "admin@prereq"));
    assert_eq!(
        events[1].previous.as_ref().and_then(|r| r.validity_days),
        Some(365)
    );
    assert_eq!(events[1].rule.validity_days, Some(180));
}

// ============================================================================
// Store failures
// ============================================================================

#[tokio::test]
async fn test_unavailable_store_is_not_compliance() {
    let store = seeded_store();
    let ctx = context(&store);
    RuleMutationService::new(&ctx)
        .create(RuleScope::Global, "license", None)
        .await
        .unwrap();
    add_doc(&store, "D1", ANA, "license", days_ago(1));

    store.set_unavailable(true);

    let err = ComplianceEvaluator::new(&ctx)
        .evaluate(ANA, Some("C1"), today())
        .await
        .unwrap_err();
    assert!(err.is_data_unavailable());

    let err = ComplianceEvaluator::new(&ctx)
        .partial_compliance("C1", today())
        .await
        .unwrap_err();
    assert!(err.is_data_unavailable());

    let err = RuleMutationService::new(&ctx)
        .create(RuleScope::Global, "certificate", None)
        .await
        .unwrap_err();
    assert!(err.is_data_unavailable());
}

/// Rule store that never answers in time
struct SlowRuleStore;

#[async_trait]
impl RuleStore for SlowRuleStore {
    async fn list_global_rules(&self) -> PersistenceResult<Vec<PrerequisiteRule>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }

    async fn list_rules_for_client(&self, _client_id: &str) -> PersistenceResult<Vec<PrerequisiteRule>> {
        Ok(Vec::new())
    }

    async fn get_rule(&self, rule_id: &str) -> PersistenceResult<PrerequisiteRule> {
        Err(prereq_persistence::PersistenceError::not_found("Rule", rule_id))
    }

    async fn insert_rule(&self, _rule: &PrerequisiteRule) -> PersistenceResult<()> {
        Ok(())
    }

    async fn update_rule(&self, _rule: &PrerequisiteRule) -> PersistenceResult<()> {
        Ok(())
    }

    async fn delete_rule(&self, _rule_id: &str) -> PersistenceResult<()> {
        Ok(())
    }

    async fn rules_version(&self) -> PersistenceResult<u64> {
        Ok(0)
    }
}

#[tokio::test(start_paused = true)]
async fn test_store_timeout_is_data_unavailable() {
    let store = seeded_store();
    let ctx = EngineContext::new(
        Arc::new(SlowRuleStore),
        store.clone(),
        store.clone(),
        EngineConfig {
            store_timeout_ms: 50,
            ..EngineConfig::default()
        },
    );

    let err = ComplianceEvaluator::new(&ctx)
        .evaluate(ANA, None, today())
        .await
        .unwrap_err();
    assert!(err.is_data_unavailable());
    assert!(err.to_string().contains("timed out"));
}
