//! oxide-rebuild CLI
//!
//! Command-line tool for planning and applying SQLite migrations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_rebuild::io::{load_model, load_operations};
use oxide_rebuild::prelude::*;

/// Plans and applies SQLite migrations, rebuilding tables where needed.
#[derive(Parser)]
#[command(name = "oxide-rebuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SQL for an operation batch without touching the database.
    Plan {
        /// JSON file with the operation batch.
        #[arg(short, long)]
        operations: PathBuf,

        /// JSON file with the target model.
        #[arg(short, long)]
        model: PathBuf,
    },

    /// Apply an operation batch as a named migration.
    Migrate {
        /// App the migration belongs to.
        #[arg(short, long)]
        app: String,

        /// Migration name.
        #[arg(short, long)]
        name: String,

        /// JSON file with the operation batch.
        #[arg(short, long)]
        operations: PathBuf,

        /// JSON file with the target model.
        #[arg(short, long)]
        model: PathBuf,

        /// Migrations that must be applied first, as `app/name`.
        #[arg(long = "depends-on", value_parser = parse_dependency)]
        depends_on: Vec<(String, String)>,

        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Show migration status.
    ShowMigrations {
        /// App name to show (all if not specified).
        #[arg(short, long)]
        app: Option<String>,
    },

    /// Initialize the migrations system (create history table).
    Init,
}

fn parse_dependency(value: &str) -> std::result::Result<(String, String), String> {
    value
        .split_once('/')
        .filter(|(app, name)| !app.is_empty() && !name.is_empty())
        .map(|(app, name)| (app.to_string(), name.to_string()))
        .ok_or_else(|| format!("expected app/name, got '{value}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Planning needs no database
    if let Commands::Plan { operations, model } = &cli.command {
        let operations = load_operations(operations)?;
        let target = load_model(model)?;
        let commands =
            OperationRewriter::new().generate_commands(&SqliteDialect::new(), &operations, &target)?;
        for command in commands {
            println!("{};", command.sql);
        }
        return Ok(());
    }

    // Connect to database
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&cli.database)
        .await?;

    let executor = MigrationExecutor::new(pool, SqliteDialect::new());

    match cli.command {
        Commands::Plan { .. } => {}

        Commands::Init => {
            info!("Initializing migrations system...");
            executor.init().await?;
            info!("Migrations table created successfully.");
        }

        Commands::Migrate {
            app,
            name,
            operations,
            model,
            depends_on,
            dry_run,
        } => {
            let mut migration = ExecutableMigration::new(app, name)
                .operations(load_operations(&operations)?)
                .target(load_model(&model)?);
            for (dep_app, dep_name) in depends_on {
                migration = migration.depends_on(dep_app, dep_name);
            }

            let executor = executor.dry_run(dry_run);
            if dry_run {
                info!("Dry run mode - SQL will be printed but not executed.");
            }

            executor.init().await?;
            executor.apply(&migration).await?;
        }

        Commands::ShowMigrations { app } => {
            executor.init().await?;

            let applied = match &app {
                Some(app) => executor.history().get_applied_for_app(app).await?,
                None => executor.history().get_applied().await?,
            };

            if applied.is_empty() {
                info!("No migrations have been applied yet.");
            } else {
                println!("\nApplied migrations:");
                println!("{:-<60}", "");

                for migration in &applied {
                    println!(
                        " [X] {}/{} ({})",
                        migration.app,
                        migration.name,
                        migration.applied_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
                println!();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dependency() {
        assert_eq!(
            parse_dependency("users/0001_initial"),
            Ok(("users".to_string(), "0001_initial".to_string()))
        );
        assert!(parse_dependency("users").is_err());
        assert!(parse_dependency("/0001").is_err());
    }

    #[test]
    fn test_cli_parses_migrate() {
        let cli = Cli::try_parse_from([
            "oxide-rebuild",
            "--database",
            "sqlite::memory:",
            "migrate",
            "--app",
            "users",
            "--name",
            "0002_drop_email",
            "--operations",
            "ops.json",
            "--model",
            "model.json",
            "--depends-on",
            "users/0001_initial",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Migrate {
                app,
                depends_on,
                dry_run,
                ..
            } => {
                assert_eq!(app, "users");
                assert_eq!(depends_on, vec![("users".to_string(), "0001_initial".to_string())]);
                assert!(dry_run);
            }
            _ => panic!("Expected migrate command"),
        }
    }
}
