use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use leafplate_api::{db, migrator::Migrator};

const DEFAULT_DATABASE_URL: &str = "sqlite://leafplate.db?mode=rwc";

/// Applies or rolls back the schema migrations
#[derive(Parser)]
#[command(name = "migration", version)]
struct Cli {
    /// Database URL; falls back to APP__DATABASE_URL, then DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations (default)
    Up {
        #[arg(short, long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        #[arg(short, long, default_value_t = 1)]
        steps: u32,
    },
    /// List applied and pending migrations
    Status,
    /// Drop every table and reapply all migrations
    Fresh,
}

fn database_url(explicit: Option<String>) -> String {
    explicit
        .or_else(|| std::env::var("APP__DATABASE_URL").ok())
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    leafplate_api::config::init_tracing("info", false);

    let cli = Cli::parse();
    let url = database_url(cli.database_url);
    info!("Connecting to database: {}", url);

    let conn = db::establish_connection(&url)
        .await
        .context("failed to connect to database")?;

    match cli.command.unwrap_or(Command::Up { steps: None }) {
        Command::Up { steps } => {
            Migrator::up(&conn, steps).await?;
            info!("Migrations applied");
        }
        Command::Down { steps } => {
            Migrator::down(&conn, Some(steps)).await?;
            info!("Rolled back {} migration(s)", steps);
        }
        Command::Status => {
            for migration in Migrator::get_applied_migrations(&conn).await? {
                println!("applied  {}", migration.name());
            }
            for migration in Migrator::get_pending_migrations(&conn).await? {
                println!("pending  {}", migration.name());
            }
        }
        Command::Fresh => {
            Migrator::fresh(&conn).await?;
            info!("Database recreated");
        }
    }

    db::close_pool(conn).await?;
    Ok(())
}
