use dotenvy::dotenv;
use mfg_ledger::{
    config::{
        database,
        settings::{self, Config},
    },
    core::notifications,
    errors::Result,
    service::ErpService,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the catalog configuration
    let config = settings::load_default_config().unwrap_or_else(|e| {
        warn!("{}; starting without catalog seeds", e);
        Config::default()
    });

    // 4. Connect and make sure the schema exists
    if database::get_database_url().starts_with("sqlite://data/") {
        std::fs::create_dir_all("data")?;
    }
    let db = database::create_connection()
        .await
        .inspect(|_| info!("Database connected."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Seed catalog products
    let service = ErpService::new(db);
    service
        .seed_catalog(&config)
        .await
        .inspect(|seeded| info!("Catalog seeded: {} new products.", seeded))
        .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;

    // 6. Report what needs attention
    let summary = notifications::summary(&service.database).await?;
    info!(
        "Ledger ready: {} products low on stock, {} quotes pending, {} production orders pending",
        summary.low_stock_count, summary.pending_quotes_count, summary.pending_production_count
    );

    Ok(())
}
