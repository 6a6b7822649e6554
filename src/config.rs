use anyhow::Result;
use sea_orm::Database;
use std::time::Duration;

use crate::schemas::AppState;

/// Initialize application state from the environment
pub async fn initialize_app_state() -> Result<AppState> {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://finbook.db".to_string());
    initialize_app_state_with_url(&database_url).await
}

/// Initialize application state against a specific database URL
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;
    Ok(AppState { db })
}

/// Get bind address from environment or use default
pub fn get_bind_address() -> String {
    std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
}

/// Interval between background subscription-processing runs (default: 1 hour)
pub fn get_processing_interval() -> Duration {
    let secs = std::env::var("SUBSCRIPTION_PROCESS_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3600);
    Duration::from_secs(secs)
}
