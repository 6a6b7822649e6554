use anyhow::Result;
use chrono::Utc;
use sea_orm::Database;
use tracing::{info, warn};

/// One-shot materializing pass over every due subscription, for cron-style
/// setups that do not keep the server's internal timer running.
pub async fn process_subscriptions(database_url: &str) -> Result<()> {
    info!("Processing due subscriptions");
    let db = Database::connect(database_url).await?;

    let report = compute::recurring::process_due(&db, Utc::now().date_naive(), None).await?;

    info!(
        processed = report.processed_count,
        errors = report.errors.len(),
        "subscription processing finished"
    );
    for failure in &report.errors {
        warn!(
            subscription_id = failure.subscription_id,
            subscription = %failure.subscription_name,
            message = %failure.message,
            "subscription failed to process"
        );
    }

    Ok(())
}
