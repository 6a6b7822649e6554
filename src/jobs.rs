use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::schemas::AppState;

/// Spawns the background subscription processor.
///
/// One task per process, ticking on a fixed interval (first run fires
/// immediately). Each tick runs the materializing processor for all users.
/// Ticks run sequentially within this task; if another process races the
/// same store, the conditional advance inside the engine keeps a due date
/// from firing twice.
pub fn spawn_subscription_processor(state: AppState, interval: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "starting subscription processor");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let today = Utc::now().date_naive();
            match compute::recurring::process_due(&state.db, today, None).await {
                Ok(report) => {
                    if report.processed_count > 0 || !report.errors.is_empty() {
                        info!(
                            processed = report.processed_count,
                            errors = report.errors.len(),
                            "subscription processing run finished"
                        );
                    }
                    for failure in &report.errors {
                        warn!(
                            subscription_id = failure.subscription_id,
                            subscription = %failure.subscription_name,
                            message = %failure.message,
                            "subscription failed to process"
                        );
                    }
                }
                Err(err) => {
                    error!(error = %err, "subscription processing run failed");
                }
            }
        }
    })
}
