//! Organizio CLI - Command-line front end for the local declutter store

mod commands;

use clap::{Parser, Subcommand};
use organizio::config;
use organizio::output::OutputMode;
use organizio::storage::SqliteStore;
use organizio::{Category, Gateway, Theme};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "organizio")]
#[command(version)]
#[command(about = "Local digital-declutter store - emails, accounts, passwords, social media and privacy settings")]
#[command(long_about = r#"
Organizio keeps the inventory of your digital life in a local SQLite file:
  • Email addresses and online accounts, with importance and last use
  • Password hygiene notes (never the passwords themselves)
  • Social media accounts and privacy settings to review
  • Preferences, feature flags and an opt-in analytics log

Entities: email, account, password, social-account, privacy-setting

Example usage:
  organizio init
  organizio add email -s service=Gmail -s email=me@example.com -s importance=4
  organizio list emails
  organizio flags set bulk_actions true
  organizio call get-accounts
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to the database file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database (if needed) and show where it lives
    Init {
        /// Also write a config file pointing at this database
        #[arg(long)]
        write_config: bool,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show row counts per table
    Stats,

    /// List stored records
    List {
        /// Entity or list name (e.g. emails, social-accounts)
        entity: String,
    },

    /// Add a record
    Add {
        entity: String,

        /// Field assignment, repeatable
        #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Change fields of a record
    Edit {
        entity: String,

        id: i64,

        /// Field assignment, repeatable
        #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Delete a record
    Remove {
        entity: String,

        id: i64,
    },

    /// Show or change preferences
    Prefs {
        #[command(subcommand)]
        action: Option<PrefsAction>,
    },

    /// Show or toggle feature flags
    Flags {
        #[command(subcommand)]
        action: Option<FlagsAction>,
    },

    /// Inspect the opt-in analytics log
    Analytics {
        #[command(subcommand)]
        action: AnalyticsAction,
    },

    /// Export everything as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Send a named request and print the JSON reply
    Call {
        /// Request name (e.g. get-emails, save-preferences)
        name: String,

        /// JSON arguments: an array, or a single value
        args: Option<String>,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Update theme and/or analytics opt-in
    Set {
        #[arg(long)]
        theme: Option<Theme>,

        #[arg(long)]
        analytics: Option<bool>,
    },
}

#[derive(Subcommand)]
enum FlagsAction {
    /// Switch a feature on or off
    Set {
        name: String,

        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Subcommand)]
enum AnalyticsAction {
    /// Events, most recent first
    List,
    /// Totals per event type
    Summary,
    /// Delete every event
    Clear,
    /// Record an event (only kept when analytics is enabled)
    Log {
        event_type: String,
        /// Event payload as JSON
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        let level = config
            .as_ref()
            .and_then(|c| c.log_level.as_deref())
            .unwrap_or("info");
        EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = OutputMode::from_flag(cli.json);
    let db_path = config::resolve_database_path(cli.database.as_deref(), config.as_ref());
    tracing::debug!("Using database {}", db_path.display());

    let store = SqliteStore::open(&db_path)?;
    let gateway = Gateway::new(store)?;

    let result = run(&gateway, cli.command, &db_path, cli.config, output_mode).await;
    gateway.shutdown().await;
    result
}

async fn run(
    gateway: &Gateway,
    command: Commands,
    db_path: &std::path::Path,
    config_path: Option<PathBuf>,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    match command {
        Commands::Init { write_config, force } => {
            commands::run_init(gateway, db_path, config_path, write_config, force, output_mode).await
        }

        Commands::Stats => commands::run_stats(gateway, output_mode).await,

        Commands::List { entity } => {
            let category: Category = entity.parse()?;
            commands::run_list(gateway, category, output_mode).await
        }

        Commands::Add { entity, set } => {
            let category: Category = entity.parse()?;
            let fields = commands::parse_assignments(&set)?;
            commands::run_add(gateway, category, fields, output_mode).await
        }

        Commands::Edit { entity, id, set } => {
            let category: Category = entity.parse()?;
            let fields = commands::parse_assignments(&set)?;
            if fields.is_empty() {
                anyhow::bail!("nothing to change; pass at least one -s key=value");
            }
            commands::run_edit(gateway, category, id, fields, output_mode).await
        }

        Commands::Remove { entity, id } => {
            let category: Category = entity.parse()?;
            commands::run_remove(gateway, category, id, output_mode).await
        }

        Commands::Prefs { action } => match action {
            None => commands::run_show_prefs(gateway, output_mode).await,
            Some(PrefsAction::Set { theme, analytics }) => {
                commands::run_set_prefs(gateway, theme, analytics, output_mode).await
            }
        },

        Commands::Flags { action } => match action {
            None => commands::run_show_flags(gateway, output_mode).await,
            Some(FlagsAction::Set { name, enabled }) => {
                commands::run_set_flag(gateway, &name, enabled, output_mode).await
            }
        },

        Commands::Analytics { action } => match action {
            AnalyticsAction::List => commands::run_analytics_list(gateway, output_mode).await,
            AnalyticsAction::Summary => commands::run_analytics_summary(gateway, output_mode).await,
            AnalyticsAction::Clear => commands::run_analytics_clear(gateway, output_mode).await,
            AnalyticsAction::Log { event_type, data } => {
                commands::run_analytics_log(gateway, &event_type, data, output_mode).await
            }
        },

        Commands::Export { out } => commands::run_export(gateway, out, output_mode).await,

        Commands::Call { name, args } => commands::run_call(gateway, &name, args).await,
    }
}
