use dotenvy::dotenv;
use supplier_portal::{
    config::{database, settings},
    core::{notify::TracingNotifier, purchase_request, supplier},
    entities::PurchaseRequestStatus,
    errors::Result,
};
use tracing::{error, info};
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

    // 3. Load config.toml (defaults when absent)
    let app_config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed suppliers listed in config.toml
    let notifier = TracingNotifier::new(app_config.notifications.sender_email.clone());
    let seeded = supplier::seed_suppliers(
        &db,
        &app_config.suppliers,
        &notifier,
        &app_config.notifications,
    )
    .await
    .inspect_err(|e| error!("Failed to seed suppliers: {}", e))?;
    info!("Seeded {} new supplier(s).", seeded);

    // 6. Report the current workload
    let suppliers = supplier::list_suppliers(&db).await?;
    let pending = purchase_request::list_pending(&db).await?;
    let in_progress =
        purchase_request::list_by_status(&db, PurchaseRequestStatus::InProgress).await?;
    let completed = purchase_request::list_completed(&db).await?;
    info!(
        "{} supplier(s); requests: {} pending, {} in progress, {} completed",
        suppliers.len(),
        pending.len(),
        in_progress.len(),
        completed.len()
    );

    Ok(())
}
