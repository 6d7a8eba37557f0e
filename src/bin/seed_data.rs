//! Seed data script - loads the sample clients and yarn qualities
//!
//! Run with: cargo run --bin seed-data
//!
//! Names that already exist are skipped, so the script can be re-run safely.

use clap::Parser;
use packing_report_api::{
    db::{establish_connection_with_config, run_migrations, DbConfig},
    services::seed::SeedService,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "seed-data", about = "Load sample clients and qualities")]
struct Cli {
    #[arg(
        long,
        env = "APP__DATABASE_URL",
        default_value = "sqlite://packing_reports.db?mode=rwc"
    )]
    database_url: String,

    /// Do not run pending migrations first
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    info!("=== Packing Report API Seed Data ===");

    let db = establish_connection_with_config(&DbConfig {
        url: cli.database_url.clone(),
        max_connections: 1,
        ..Default::default()
    })
    .await?;

    if !cli.skip_migrations {
        run_migrations(&db).await?;
    }

    let summary = SeedService::new(Arc::new(db), None).seed().await?;

    info!(
        "Inserted {} clients and {} qualities",
        summary.clients, summary.qualities
    );
    info!("Try: curl http://localhost:8080/api/v1/clients");
    Ok(())
}
