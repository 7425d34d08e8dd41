//! Prerequisite rule commands

use anyhow::{Context, Result};
use prereq_core::{RulePatch, RuleScope};
use prereq_engine::{AppConfig, RuleMutationService, RuleResolver};
use prereq_persistence::AuditFilter;

use crate::db;
use crate::RuleAction;

/// Handle rule subcommands
pub async fn handle(config: &AppConfig, actor: &str, action: RuleAction) -> Result<()> {
    let db = db::open(config).await?;
    let ctx = db::engine(&db, config);
    let service = RuleMutationService::new(&ctx).as_actor(actor);

    match action {
        RuleAction::Add {
            document_type,
            client,
            validity_days,
        } => {
            let scope = RuleScope::from_client(client.as_deref());
            let rule_id = service
                .create(scope.clone(), &document_type, validity_days)
                .await
                .with_context(|| format!("Failed to create rule {}", document_type))?;

            println!("✅ Rule created: {}", rule_id);
            println!("   Scope:    {}", scope);
            println!("   Type:     {}", document_type.trim());
            println!("   Validity: {}", validity_label(validity_days));
        }
        RuleAction::Update {
            id,
            document_type,
            validity_days,
            no_expiry,
        } => {
            let mut patch = RulePatch::new();
            if let Some(document_type) = document_type.as_deref() {
                patch = patch.document_type(document_type);
            }
            if no_expiry {
                patch = patch.validity_days(None);
            } else if validity_days.is_some() {
                patch = patch.validity_days(validity_days);
            }

            let rule = service
                .update(&id, &patch)
                .await
                .with_context(|| format!("Failed to update rule {}", id))?;

            println!("✅ Rule updated: {}", rule.id);
            println!("   Scope:    {}", rule.scope);
            println!("   Type:     {}", rule.document_type);
            println!(
                "   Validity: {}",
                validity_label(rule.validity_days.map(i64::from))
            );
        }
        RuleAction::Delete { id, client } => {
            let scope = RuleScope::from_client(client.as_deref());
            service
                .delete(&id, &scope)
                .await
                .with_context(|| format!("Failed to delete rule {}", id))?;

            println!("🗑️  Rule deleted: {} ({})", id, scope);
        }
        RuleAction::List { client } => {
            let mut rules = RuleResolver::new(&ctx)
                .resolve_effective_rules(client.as_deref())
                .await?;
            prereq_core::sort_for_display(&mut rules);

            let scope = RuleScope::from_client(client.as_deref());
            if rules.is_empty() {
                println!("No rules in effect for {}", scope);
            } else {
                println!("📋 Effective rules for {}", scope);
                println!();
                println!("{:<24} {:<12} {:<8} {:<36}", "Document Type", "Validity", "Origin", "Rule");
                println!("{}", "-".repeat(82));
                for rule in rules {
                    println!(
                        "{:<24} {:<12} {:<8} {:<36}",
                        rule.document_type,
                        validity_label(rule.validity_days.map(i64::from)),
                        if rule.is_global { "global" } else { "client" },
                        rule.source_rule_id
                    );
                }
            }
        }
        RuleAction::History { rule, client } => {
            let mut filter = AuditFilter::new();
            if let Some(rule_id) = rule.as_deref() {
                filter = filter.rule(rule_id);
            }
            if let Some(client_id) = client.as_deref() {
                filter = filter.client(client_id);
            }

            let events = db.audit_reader().read_filtered(&filter)?;
            if events.is_empty() {
                println!("No rule changes recorded");
            } else {
                println!(
                    "{:<12} {:<20} {:<14} {:<12} {:<20} {:<10}",
                    "Event", "Timestamp", "Type", "Actor", "Document Type", "Validity"
                );
                println!("{}", "-".repeat(92));
                for event in events {
                    println!(
                        "{:<12} {:<20} {:<14} {:<12} {:<20} {:<10}",
                        event.event_id,
                        event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                        event.event_type.as_str(),
                        event.actor_id,
                        event.rule.document_type,
                        validity_label(event.rule.validity_days.map(i64::from)),
                    );
                }
            }
        }
    }

    db.audit().flush()?;
    db.pool().close().await;
    Ok(())
}

fn validity_label(validity_days: Option<i64>) -> String {
    match validity_days {
        Some(days) => format!("{} days", days),
        None => "no expiry".to_string(),
    }
}
