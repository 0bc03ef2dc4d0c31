//! Periodic no-show sweep.
//!
//! Marks SCHEDULED assignments whose grace deadline has passed as NO_SHOW.
//! Runs on a fixed interval using `tokio::time::interval` until cancelled.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::handlers::sweep;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300); // 5 minutes

/// Run the no-show sweep loop until `cancel` is triggered.
pub async fn run(pool: PgPool, grace_minutes: i64, cancel: CancellationToken) {
    tracing::info!(
        grace_minutes,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "No-show sweep started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("No-show sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep::run_no_show_sweep(&pool, grace_minutes).await {
                    Ok(result) => {
                        if !result.marked.is_empty() {
                            tracing::info!(marked = result.marked.len(), "No-show sweep: assignments marked");
                        } else {
                            tracing::debug!("No-show sweep: nothing overdue");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "No-show sweep failed");
                    }
                }
            }
        }
    }
}
