//! Handlers exposing the idempotent sweeps.
//!
//! The sweeps themselves carry no scheduling policy; any external trigger
//! (cron, the built-in background runner, an operator) may invoke them,
//! and re-running is always safe. Individual item failures are logged and
//! skipped, never abort the sweep.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use staffhub_core::audit::action_types;
use staffhub_core::permissions::Capability;
use staffhub_core::types::DbId;
use staffhub_core::violation::{self, AssignmentSnapshot, DetectionPolicy};
use staffhub_db::models::violation::{CreateViolation, DetectionSummary};
use staffhub_db::repositories::{ShiftAssignmentRepo, ShiftScheduleRepo, ViolationRepo};

use crate::error::AppResult;
use crate::handlers::record_audit;
use crate::middleware::identity::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// No-show sweep
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct NoShowSweepResult {
    pub marked: Vec<DbId>,
    pub failed: usize,
}

/// Mark SCHEDULED assignments past their grace deadline as NO_SHOW.
pub async fn run_no_show_sweep(
    pool: &staffhub_db::DbPool,
    grace_minutes: i64,
) -> Result<NoShowSweepResult, sqlx::Error> {
    let cutoff = (Utc::now() - chrono::Duration::minutes(grace_minutes)).naive_utc();
    let candidates = ShiftAssignmentRepo::find_no_show_candidates(pool, cutoff).await?;

    let mut marked = Vec::new();
    let mut failed = 0;
    for candidate in candidates {
        match ShiftAssignmentRepo::mark_no_show(pool, candidate.id).await {
            Ok(Some(_)) => {
                marked.push(candidate.id);
                let _ = record_audit(
                    pool,
                    None,
                    action_types::ASSIGNMENT_NO_SHOW,
                    "shift_assignment",
                    candidate.id,
                    None,
                )
                .await;
            }
            // Someone checked in or cancelled while we swept.
            Ok(None) => {}
            Err(err) => {
                failed += 1;
                tracing::error!(assignment_id = candidate.id, error = %err, "No-show mark failed");
            }
        }
    }
    Ok(NoShowSweepResult { marked, failed })
}

/// POST /api/v1/sweeps/no-show
pub async fn no_show_sweep(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::RunSweeps)?;

    let result =
        run_no_show_sweep(&state.pool, state.config.attendance.no_show_grace_minutes).await?;

    tracing::info!(
        user_id = auth.user_id,
        marked = result.marked.len(),
        failed = result.failed,
        "No-show sweep finished"
    );
    Ok(Json(DataResponse { data: result }))
}

// ---------------------------------------------------------------------------
// Violation detection sweep
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DetectQuery {
    pub date: NaiveDate,
}

/// Derive violations for every COMPLETED or NO_SHOW assignment on a date.
///
/// Idempotent: the unique (assignment, rule) constraint makes re-detected
/// hits no-ops, counted as `skipped_existing`.
pub async fn run_detection(
    pool: &staffhub_db::DbPool,
    date: NaiveDate,
    policy: &DetectionPolicy,
) -> Result<DetectionSummary, sqlx::Error> {
    let assignments = ShiftAssignmentRepo::list_detectable_for_date(pool, date).await?;

    let mut summary = DetectionSummary {
        assignments_scanned: assignments.len(),
        ..Default::default()
    };

    for assignment in &assignments {
        let Some(status) = staffhub_core::assignment::AssignmentStatus::parse(&assignment.status)
        else {
            summary.failed += 1;
            continue;
        };
        let snapshot = AssignmentSnapshot {
            status,
            date: assignment.assignment_date,
            planned_start: assignment.planned_start,
            planned_end: assignment.planned_end,
            check_in: assignment.check_in_at,
            check_out: assignment.check_out_at,
        };

        for hit in violation::detect(&snapshot, policy) {
            let create = CreateViolation {
                assignment_id: assignment.id,
                employee_id: assignment.employee_id,
                violation_type: hit.violation_type.as_str().to_string(),
                violation_date: assignment.assignment_date,
                severity: hit.severity.as_str().to_string(),
                deviation_minutes: hit.deviation_minutes,
            };
            match ViolationRepo::create_if_absent(pool, &create).await {
                Ok(Some(created)) => {
                    match hit.violation_type {
                        staffhub_core::violation::ViolationType::Late => summary.late += 1,
                        staffhub_core::violation::ViolationType::EarlyLeave => {
                            summary.early_leave += 1
                        }
                        _ => summary.absent += 1,
                    }
                    let _ = record_audit(
                        pool,
                        None,
                        action_types::VIOLATION_DETECT,
                        "attendance_violation",
                        created.id,
                        Some(json!({
                            "assignment_id": assignment.id,
                            "type": created.violation_type,
                        })),
                    )
                    .await;
                }
                Ok(None) => summary.skipped_existing += 1,
                Err(err) => {
                    summary.failed += 1;
                    tracing::error!(
                        assignment_id = assignment.id,
                        error = %err,
                        "Violation insert failed"
                    );
                }
            }
        }
    }

    Ok(summary)
}

/// POST /api/v1/sweeps/detect-violations
pub async fn detect_violations(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DetectQuery>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::RunSweeps)?;

    let policy = state.config.attendance.detection_policy();
    let summary = run_detection(&state.pool, query.date, &policy).await?;

    tracing::info!(
        user_id = auth.user_id,
        date = %query.date,
        scanned = summary.assignments_scanned,
        late = summary.late,
        early_leave = summary.early_leave,
        absent = summary.absent,
        "Detection sweep finished"
    );
    Ok(Json(DataResponse { data: summary }))
}

// ---------------------------------------------------------------------------
// Schedule housekeeping sweeps
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ArchiveSweepResult {
    pub archived: Vec<DbId>,
}

/// Archive PUBLISHED schedules whose end date is older than the configured
/// window.
pub async fn run_auto_archive(
    pool: &staffhub_db::DbPool,
    days: i64,
) -> Result<ArchiveSweepResult, sqlx::Error> {
    let cutoff = Utc::now().date_naive() - chrono::Duration::days(days);
    let archived = ShiftScheduleRepo::auto_archive(pool, cutoff).await?;
    for &id in &archived {
        let _ = record_audit(
            pool,
            None,
            action_types::SCHEDULE_ARCHIVE,
            "shift_schedule",
            id,
            None,
        )
        .await;
    }
    Ok(ArchiveSweepResult { archived })
}

/// POST /api/v1/sweeps/archive-schedules
pub async fn archive_schedules(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::RunSweeps)?;

    let result = run_auto_archive(&state.pool, state.config.attendance.auto_archive_days).await?;

    tracing::info!(
        user_id = auth.user_id,
        archived = result.archived.len(),
        "Auto-archive sweep finished"
    );
    Ok(Json(DataResponse { data: result }))
}

#[derive(Debug, Serialize)]
pub struct CleanupSweepResult {
    pub deleted: u64,
}

/// POST /api/v1/sweeps/cleanup-drafts
pub async fn cleanup_drafts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::RunSweeps)?;

    let cutoff =
        Utc::now() - chrono::Duration::days(state.config.attendance.draft_cleanup_days);
    let deleted = ShiftScheduleRepo::cleanup_old_drafts(&state.pool, cutoff).await?;

    tracing::info!(user_id = auth.user_id, deleted, "Draft cleanup sweep finished");
    Ok(Json(DataResponse {
        data: CleanupSweepResult { deleted },
    }))
}
