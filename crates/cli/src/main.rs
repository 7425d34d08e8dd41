//! Prereq CLI - personnel documents and prerequisite compliance
//!
//! Usage:
//! ```bash
//! prereq init
//! prereq person add 12.345.678-5 "Ana Rojas" --role driver
//! prereq client add C1 "Minera Norte" --portfolio Norte
//! prereq assign 12345678-5 C1
//! prereq rule add license --validity-days 365
//! prereq rule add license --client C1 --validity-days 180
//! prereq document add 12345678-5 license --issued 2026-01-10
//! prereq compliance --person 12345678-5 --client C1
//! prereq partial --client C1
//! prereq report compliance --client C1 --format md --output compliance.md
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use prereq_engine::{AppConfig, ConfigLoader};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod db;

use commands::{compliance, directory, rules};

/// Prereq - document prerequisite compliance for personnel and clients
#[derive(Parser)]
#[command(name = "prereq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides database_url)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Rule audit directory (overrides audit_dir)
    #[arg(long, global = true)]
    pub audit_dir: Option<PathBuf>,

    /// Evaluation date (YYYY-MM-DD), defaults to today
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,

    /// Administrator recorded in the rule audit log
    #[arg(long, global = true, default_value = "admin")]
    pub actor: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database schema and audit directory
    Init {
        /// Delete an existing database file first
        #[arg(long)]
        force: bool,
    },

    /// Show record counts
    Status,

    /// Worker management
    Person {
        #[command(subcommand)]
        action: PersonAction,
    },

    /// Client management
    Client {
        #[command(subcommand)]
        action: ClientAction,
    },

    /// Assign a person to a client
    Assign {
        /// Person RUT
        rut: String,
        /// Client ID
        client: String,
    },

    /// Document records
    Document {
        #[command(subcommand)]
        action: DocumentAction,
    },

    /// Prerequisite rules
    Rule {
        #[command(subcommand)]
        action: RuleAction,
    },

    /// Compliance of one person, or the table for a client
    Compliance {
        /// Person RUT; omit for every person assigned to --client
        #[arg(long, short)]
        person: Option<String>,
        /// Client ID; omit for global rules only
        #[arg(long)]
        client: Option<String>,
    },

    /// Persons meeting some but not all of a client's requirements
    Partial {
        #[arg(long)]
        client: String,
    },

    /// Export a report
    Report {
        /// What to report on
        kind: ReportKind,
        #[arg(long, default_value = "md")]
        format: FormatArg,
        #[arg(long)]
        client: Option<String>,
        /// Person RUT (documents report)
        #[arg(long)]
        person: Option<String>,
        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum PersonAction {
    /// Register a worker
    Add {
        /// RUT, e.g. 12.345.678-5
        rut: String,
        name: String,
        #[arg(long)]
        role: Option<String>,
    },
    /// List workers
    List {
        /// Only persons assigned to this client
        #[arg(long)]
        client: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ClientAction {
    /// Register a client
    Add {
        id: String,
        name: String,
        /// Portfolio (cartera)
        #[arg(long)]
        portfolio: Option<String>,
    },
    /// List clients
    List,
}

#[derive(Subcommand)]
pub enum DocumentAction {
    /// Record an issued document
    Add {
        /// Person RUT
        rut: String,
        /// Document type, e.g. license
        document_type: String,
        /// Issue date (YYYY-MM-DD)
        #[arg(long)]
        issued: NaiveDate,
        /// Explicit expiry date (YYYY-MM-DD)
        #[arg(long)]
        expires: Option<NaiveDate>,
        /// File name shown in listings
        #[arg(long)]
        name: Option<String>,
    },
    /// List a person's documents with their state
    List {
        rut: String,
        /// Apply this client's rule windows
        #[arg(long)]
        client: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum RuleAction {
    /// Create a rule (global unless --client)
    Add {
        document_type: String,
        #[arg(long)]
        client: Option<String>,
        /// Days a document stays valid after issue; omit for no expiry
        #[arg(long, allow_negative_numbers = true)]
        validity_days: Option<i64>,
    },
    /// Rename a rule or change its validity window
    Update {
        id: String,
        #[arg(long = "type")]
        document_type: Option<String>,
        #[arg(long, allow_negative_numbers = true, conflicts_with = "no_expiry")]
        validity_days: Option<i64>,
        /// Clear the validity window
        #[arg(long)]
        no_expiry: bool,
    },
    /// Delete a rule from a scope (global unless --client)
    Delete {
        id: String,
        #[arg(long)]
        client: Option<String>,
    },
    /// Effective rules for a client (global when omitted)
    List {
        #[arg(long)]
        client: Option<String>,
    },
    /// Rule change history from the audit log
    History {
        #[arg(long)]
        rule: Option<String>,
        #[arg(long)]
        client: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportKind {
    Compliance,
    Partial,
    Rules,
    Documents,
    Audit,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
    Md,
}

impl FormatArg {
    pub fn to_report_format(self) -> prereq_reports::ReportFormat {
        match self {
            FormatArg::Csv => prereq_reports::ReportFormat::Csv,
            FormatArg::Json => prereq_reports::ReportFormat::Json,
            FormatArg::Md => prereq_reports::ReportFormat::Markdown,
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// File configuration with command-line overrides applied
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = ConfigLoader::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(db) = &cli.db {
        config.database_url = format!("sqlite:{}?mode=rwc", db.display());
    }
    if let Some(audit_dir) = &cli.audit_dir {
        config.audit_dir = audit_dir.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    tracing::debug!(database_url = %config.database_url, %today, "starting");

    match cli.command {
        Commands::Init { force } => {
            db::init(&config, force).await?;
        }

        Commands::Status => {
            db::show_status(&config).await?;
        }

        Commands::Person { action } => {
            directory::handle_person(&config, action).await?;
        }

        Commands::Client { action } => {
            directory::handle_client(&config, action).await?;
        }

        Commands::Assign { rut, client } => {
            directory::assign(&config, &rut, &client).await?;
        }

        Commands::Document { action } => {
            directory::handle_document(&config, action, today).await?;
        }

        Commands::Rule { action } => {
            rules::handle(&config, &cli.actor, action).await?;
        }

        Commands::Compliance { person, client } => {
            compliance::show_compliance(&config, person.as_deref(), client.as_deref(), today)
                .await?;
        }

        Commands::Partial { client } => {
            compliance::show_partial(&config, &client, today).await?;
        }

        Commands::Report {
            kind,
            format,
            client,
            person,
            output,
        } => {
            compliance::generate_report(
                &config,
                kind,
                format,
                client.as_deref(),
                person.as_deref(),
                output,
                today,
            )
            .await?;
        }
    }

    Ok(())
}
