//! Persons, clients, assignments and documents

use anyhow::{Context, Result};
use chrono::NaiveDate;
use prereq_core::{Client, Document, Person};
use prereq_engine::{AppConfig, ComplianceEvaluator};
use prereq_persistence::{AssignmentRepo, ClientRepo, DocumentRepo, PersonRepo};

use super::person_id;
use crate::db;
use crate::{ClientAction, DocumentAction, PersonAction};

/// Handle person subcommands
pub async fn handle_person(config: &AppConfig, action: PersonAction) -> Result<()> {
    let db = db::open(config).await?;
    let pool = db.pool();

    match action {
        PersonAction::Add { rut, name, role } => {
            let mut person = Person::parse(&rut, &name)?;
            if let Some(role) = role.as_deref() {
                person = person.with_role(role);
            }
            PersonRepo::insert(pool, &person)
                .await
                .context("Failed to register person")?;

            println!("✅ Person registered");
            println!("   RUT:  {}", person.rut.formatted());
            println!("   Name: {}", person.name);
            if let Some(role) = &person.role {
                println!("   Role: {}", role);
            }
        }
        PersonAction::List { client } => {
            let rows = match client.as_deref() {
                Some(client_id) => PersonRepo::get_by_client(pool, client_id).await?,
                None => PersonRepo::get_all(pool).await?,
            };

            if rows.is_empty() {
                println!("No persons found");
            } else {
                println!("{:<14} {:<30} {:<16}", "RUT", "Name", "Role");
                println!("{}", "-".repeat(62));
                for row in rows {
                    println!(
                        "{:<14} {:<30} {:<16}",
                        row.id,
                        row.name,
                        row.role.as_deref().unwrap_or("-")
                    );
                }
            }
        }
    }

    pool.close().await;
    Ok(())
}

/// Handle client subcommands
pub async fn handle_client(config: &AppConfig, action: ClientAction) -> Result<()> {
    let db = db::open(config).await?;
    let pool = db.pool();

    match action {
        ClientAction::Add {
            id,
            name,
            portfolio,
        } => {
            let mut client = Client::new(&id, &name)?;
            if let Some(portfolio) = portfolio.as_deref() {
                client = client.with_portfolio(portfolio);
            }
            ClientRepo::insert(pool, &client)
                .await
                .context("Failed to register client")?;

            println!("✅ Client registered: {}", client);
        }
        ClientAction::List => {
            let rows = ClientRepo::get_all(pool).await?;

            if rows.is_empty() {
                println!("No clients found");
            } else {
                println!("{:<12} {:<30} {:<16}", "ID", "Name", "Portfolio");
                println!("{}", "-".repeat(60));
                for row in rows {
                    println!(
                        "{:<12} {:<30} {:<16}",
                        row.id,
                        row.name,
                        row.portfolio.as_deref().unwrap_or("-")
                    );
                }
            }
        }
    }

    pool.close().await;
    Ok(())
}

/// Assign a person to a client
pub async fn assign(config: &AppConfig, rut: &str, client_id: &str) -> Result<()> {
    let person_id = person_id(rut)?;
    let db = db::open(config).await?;

    AssignmentRepo::assign(db.pool(), &person_id, client_id)
        .await
        .context("Failed to assign person")?;

    println!("✅ {} assigned to {}", person_id, client_id);
    db.pool().close().await;
    Ok(())
}

/// Handle document subcommands
pub async fn handle_document(
    config: &AppConfig,
    action: DocumentAction,
    today: NaiveDate,
) -> Result<()> {
    let db = db::open(config).await?;

    match action {
        DocumentAction::Add {
            rut,
            document_type,
            issued,
            expires,
            name,
        } => {
            let person_id = person_id(&rut)?;
            PersonRepo::get_by_id(db.pool(), &person_id)
                .await
                .with_context(|| format!("Unknown person {}", person_id))?;

            let id = format!("DOC-{}", uuid::Uuid::new_v4().simple());
            let name = name.unwrap_or_else(|| format!("{}.pdf", document_type));
            let mut document = Document::new(&id, &person_id, &document_type, &name, issued)?;
            if let Some(expires) = expires {
                document = document.with_expiry(expires)?;
            }
            DocumentRepo::insert(db.pool(), &document)
                .await
                .context("Failed to record document")?;

            println!("✅ Document recorded: {}", id);
            println!("   Person: {}", person_id);
            println!("   Type:   {}", document.document_type);
            println!("   Issued: {}", document.issued_at);
            if let Some(expires) = document.expires_at {
                println!("   Expiry: {}", expires);
            }
        }
        DocumentAction::List { rut, client } => {
            let person_id = person_id(&rut)?;
            let ctx = db::engine(&db, config);
            let rows = ComplianceEvaluator::new(&ctx)
                .document_report(&person_id, client.as_deref(), today)
                .await?;

            if rows.is_empty() {
                println!("No documents for {}", person_id);
            } else {
                println!(
                    "{:<14} {:<20} {:<12} {:<12} {:<12} {:>6}",
                    "Type", "Name", "Issued", "Expiry", "State", "Days"
                );
                println!("{}", "-".repeat(82));
                for row in rows {
                    let marker = if row.required { "*" } else { " " };
                    println!(
                        "{}{:<13} {:<20} {:<12} {:<12} {:<12} {:>6}",
                        marker,
                        row.document_type,
                        row.name,
                        row.issued_at,
                        row.effective_expiry
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        row.state.label(),
                        row.days_remaining
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    );
                }
                println!();
                println!("* required by the effective rules");
            }
        }
    }

    db.pool().close().await;
    Ok(())
}
