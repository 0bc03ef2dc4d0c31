//! Periodic schedule housekeeping: auto-archive of long-finished
//! PUBLISHED schedules and cleanup of stale drafts.

use std::time::Duration;

use sqlx::PgPool;
use staffhub_db::repositories::ShiftScheduleRepo;
use tokio_util::sync::CancellationToken;

use crate::config::AttendancePolicy;
use crate::handlers::sweep;

/// How often housekeeping runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the housekeeping loop until `cancel` is triggered.
pub async fn run(pool: PgPool, policy: AttendancePolicy, cancel: CancellationToken) {
    tracing::info!(
        auto_archive_days = policy.auto_archive_days,
        draft_cleanup_days = policy.draft_cleanup_days,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Schedule housekeeping started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Schedule housekeeping stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep::run_auto_archive(&pool, policy.auto_archive_days).await {
                    Ok(result) if !result.archived.is_empty() => {
                        tracing::info!(archived = result.archived.len(), "Housekeeping: schedules archived");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Housekeeping: auto-archive failed");
                    }
                }

                let cutoff = chrono::Utc::now()
                    - chrono::Duration::days(policy.draft_cleanup_days);
                match ShiftScheduleRepo::cleanup_old_drafts(&pool, cutoff).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Housekeeping: stale drafts removed");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Housekeeping: draft cleanup failed");
                    }
                }
            }
        }
    }
}
