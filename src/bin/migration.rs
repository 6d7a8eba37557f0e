//! Applies or rolls back the schema migrations.
//!
//! Run with: cargo run --bin migration -- up

use clap::{Parser, Subcommand};
use packing_report_api::{
    db::{establish_connection_with_config, DbConfig},
    migrator::Migrator,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

#[derive(Parser)]
#[command(name = "migration", about = "Packing report schema migrations")]
struct Cli {
    /// Database to migrate
    #[arg(
        long,
        env = "APP__DATABASE_URL",
        default_value = "sqlite://packing_reports.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply every pending migration (default)
    Up,
    /// Roll back the most recent migrations
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Drop everything and re-apply all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let db = establish_connection_with_config(&DbConfig {
        url: cli.database_url.clone(),
        max_connections: 1,
        ..Default::default()
    })
    .await?;

    match cli.command.unwrap_or(Command::Up) {
        Command::Up => {
            info!("Applying pending migrations");
            Migrator::up(&db, None).await?;
        }
        Command::Down { steps } => {
            info!(steps, "Rolling back migrations");
            Migrator::down(&db, Some(steps)).await?;
        }
        Command::Fresh => {
            info!("Recreating schema from scratch");
            Migrator::fresh(&db).await?;
        }
    }

    info!("Migration completed successfully");
    Ok(())
}
