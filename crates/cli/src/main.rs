mod author;
mod commands;
mod config;
mod database;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use elif_revisions::{init_registry, BackendRegistry, RevisionManager};

use commands::*;
use config::{ProjectConfig, DEFAULT_CONFIG_FILE};
use database::DatabaseArgs;
use logging::{init_logging, LoggingConfig};

#[derive(Parser)]
#[command(name = "elif-revisions")]
#[command(about = "Ordered, at-most-once SQL revisions")]
#[command(version)]
struct Cli {
    /// Path to the project config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Show debug logs and skipped revisions
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config file, the revisions directory and the revision log
    Init {
        #[command(flatten)]
        database: DatabaseArgs,
    },

    /// Add a new revision
    Add {
        /// Category to put the revision under
        #[arg(short, long)]
        category: Option<String>,

        /// Comment describing the revision
        comment: Option<String>,
    },

    /// List local revisions
    Ls {
        /// Only list revisions in this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Print local revisions
    Cat {
        /// Only print the SQL
        #[arg(long)]
        sql: bool,

        #[arg(required = true)]
        slugs: Vec<String>,
    },

    /// Perform revisions against a database
    Run {
        #[command(flatten)]
        database: DatabaseArgs,

        /// Revisions to perform, all local revisions when omitted
        slugs: Vec<String>,
    },

    /// Show the revisions performed in a database
    Log {
        #[command(flatten)]
        database: DatabaseArgs,

        /// Number of revisions to show, all when 0
        #[arg(short = 'n', long, default_value_t = 0)]
        limit: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a performed revision, the latest when no slug is given
    Show {
        #[command(flatten)]
        database: DatabaseArgs,

        slug: Option<String>,
    },

    /// Write the revisions performed in a database to the revisions directory
    Sync {
        #[command(flatten)]
        database: DatabaseArgs,
    },

    /// Manage named database connections
    Db {
        #[command(subcommand)]
        db_command: DbCommands,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Add or replace a named database
    Set {
        name: String,

        /// Database type, inferred from the DSN when omitted
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,

        dsn: String,
    },

    /// List named databases
    Ls,

    /// Remove named databases
    Rm {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };
    if let Err(err) = init_logging(logging.with_json(cli.log_json)) {
        anyhow::bail!("failed to initialize logging: {}", err);
    }

    init_registry(BackendRegistry::with_builtin())?;

    let config = ProjectConfig::load(&cli.config)?;
    let manager = RevisionManager::with_config(config.revision_config());

    match cli.command {
        Commands::Init { database } => {
            let target = if database.dsn.is_some() || database.db.is_some() {
                Some(database.resolve(&config)?)
            } else {
                None
            };
            init::run(&cli.config, &config, target).await?;
        }
        Commands::Add { category, comment } => {
            add::run(&manager, category.as_deref(), comment.as_deref())?;
        }
        Commands::Ls { category } => {
            ls::run(&manager, category.as_deref())?;
        }
        Commands::Cat { sql, slugs } => {
            cat::run(&manager, &slugs, sql)?;
        }
        Commands::Run { database, slugs } => {
            let target = database.resolve(&config)?;
            run::run(&manager, &target, &slugs, cli.verbose).await?;
        }
        Commands::Log {
            database,
            limit,
            json,
        } => {
            let target = database.resolve(&config)?;
            log::run(&target, limit, json).await?;
        }
        Commands::Show { database, slug } => {
            let target = database.resolve(&config)?;
            show::run(&target, slug.as_deref()).await?;
        }
        Commands::Sync { database } => {
            let target = database.resolve(&config)?;
            sync::run(&manager, &target).await?;
        }
        Commands::Db { db_command } => match db_command {
            DbCommands::Set { name, kind, dsn } => {
                db::set(&cli.config, config, &name, kind.as_deref(), &dsn)?;
            }
            DbCommands::Ls => {
                db::ls(&config)?;
            }
            DbCommands::Rm { names } => {
                db::rm(&cli.config, config, &names)?;
            }
        },
    }

    Ok(())
}
