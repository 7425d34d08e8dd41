//! Compliance queries and report export

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use prereq_core::ComplianceResult;
use prereq_engine::{AppConfig, ComplianceEvaluator, RuleResolver};
use prereq_persistence::{AuditFilter, Database, PersonRepo};
use prereq_reports::{
    ComplianceReport, DocumentStatusReport, EffectiveRulesReport, PartialComplianceReport,
    ReportData, RuleAuditReport,
};
use std::collections::HashMap;
use std::path::PathBuf;

use super::person_id;
use crate::db;
use crate::{FormatArg, ReportKind};

/// Show one person's compliance, or the table for every assigned person
pub async fn show_compliance(
    config: &AppConfig,
    person: Option<&str>,
    client_id: Option<&str>,
    today: NaiveDate,
) -> Result<()> {
    let db = db::open(config).await?;
    let ctx = db::engine(&db, config);
    let evaluator = ComplianceEvaluator::new(&ctx);

    match person {
        Some(rut) => {
            let person_id = person_id(rut)?;
            let result = evaluator.evaluate(&person_id, client_id, today).await?;
            print_result(&result);
        }
        None => {
            let results = evaluator.compliance_table(client_id, today).await?;
            let names = person_names(&db).await?;
            print_table(&results, &names);
        }
    }

    db.pool().close().await;
    Ok(())
}

/// Show the persons of a client that are partially compliant
pub async fn show_partial(config: &AppConfig, client_id: &str, today: NaiveDate) -> Result<()> {
    let db = db::open(config).await?;
    let ctx = db::engine(&db, config);
    let entries = ComplianceEvaluator::new(&ctx)
        .partial_compliance(client_id, today)
        .await?;
    let names = person_names(&db).await?;

    if entries.is_empty() {
        println!("No partially compliant persons for {}", client_id);
    } else {
        println!("⚠️  Partial compliance for {} on {}", client_id, today);
        println!();
        println!("{:<14} {:<26} {:<24} {:<24}", "RUT", "Name", "Missing", "Expired");
        println!("{}", "-".repeat(90));
        for entry in entries {
            println!(
                "{:<14} {:<26} {:<24} {:<24}",
                entry.person_id,
                names.get(&entry.person_id).map(String::as_str).unwrap_or("-"),
                join_or_dash(entry.missing.iter()),
                join_or_dash(entry.expired.iter()),
            );
        }
    }

    db.pool().close().await;
    Ok(())
}

/// Generate a report
pub async fn generate_report(
    config: &AppConfig,
    kind: ReportKind,
    format: FormatArg,
    client_id: Option<&str>,
    person: Option<&str>,
    output: Option<PathBuf>,
    today: NaiveDate,
) -> Result<()> {
    let db = db::open(config).await?;
    let ctx = db::engine(&db, config);
    let evaluator = ComplianceEvaluator::new(&ctx);

    let report: Box<dyn ReportData> = match kind {
        ReportKind::Compliance => {
            let results = evaluator.compliance_table(client_id, today).await?;
            let names = person_names(&db).await?;
            Box::new(ComplianceReport::new(client_id, today, results).with_names(names))
        }
        ReportKind::Partial => {
            let Some(client_id) = client_id else {
                bail!("--client is required for the partial report");
            };
            let entries = evaluator.partial_compliance(client_id, today).await?;
            let names = person_names(&db).await?;
            Box::new(PartialComplianceReport::new(client_id, today, entries).with_names(names))
        }
        ReportKind::Rules => {
            let rules = RuleResolver::new(&ctx)
                .resolve_effective_rules(client_id)
                .await?;
            Box::new(EffectiveRulesReport::new(client_id, rules))
        }
        ReportKind::Documents => {
            let Some(rut) = person else {
                bail!("--person is required for the documents report");
            };
            let person_id = person_id(rut)?;
            let rows = evaluator
                .document_report(&person_id, client_id, today)
                .await?;
            Box::new(DocumentStatusReport::new(&person_id, today, rows))
        }
        ReportKind::Audit => {
            let mut filter = AuditFilter::new();
            if let Some(client_id) = client_id {
                filter = filter.client(client_id);
            }
            let events = db.audit_reader().read_filtered(&filter)?;
            Box::new(RuleAuditReport::new("Rule Change History", events))
        }
    };

    let content = format.to_report_format().exporter().export(report.as_ref());

    match output {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("📄 Report written to {}", path.display());
        }
        None => print!("{}", content),
    }

    db.pool().close().await;
    Ok(())
}

async fn person_names(db: &Database) -> Result<HashMap<String, String>> {
    let rows = PersonRepo::get_all(db.pool()).await?;
    Ok(rows.into_iter().map(|row| (row.id, row.name)).collect())
}

fn print_result(result: &ComplianceResult) {
    let scope = result.client_id.as_deref().unwrap_or("global rules");
    let icon = match result.status {
        prereq_core::ComplianceStatus::Full => "✅",
        prereq_core::ComplianceStatus::Partial => "⚠️ ",
        prereq_core::ComplianceStatus::None => "❌",
    };

    println!("{} {} against {}: {}", icon, result.person_id, scope, result.status);
    println!("   Evaluated on: {}", result.evaluated_on);
    println!("   Required:     {}", result.required_count());
    println!("   Satisfied:    {}", join_or_dash(result.satisfied.iter()));
    println!("   Missing:      {}", join_or_dash(result.missing.iter()));
    println!("   Expired:      {}", join_or_dash(result.expired.iter()));
}

fn print_table(results: &[ComplianceResult], names: &HashMap<String, String>) {
    if results.is_empty() {
        println!("No persons to evaluate");
        return;
    }

    println!("{:<14} {:<26} {:<8} {:<30}", "RUT", "Name", "Status", "Gaps");
    println!("{}", "-".repeat(80));
    for result in results {
        let gaps = result.gaps();
        println!(
            "{:<14} {:<26} {:<8} {:<30}",
            result.person_id,
            names.get(&result.person_id).map(String::as_str).unwrap_or("-"),
            result.status.as_str(),
            join_or_dash(gaps.iter()),
        );
    }
}

fn join_or_dash<'a>(items: impl Iterator<Item = &'a String>) -> String {
    let joined = items.map(String::as_str).collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}
