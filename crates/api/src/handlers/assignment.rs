//! Handlers for shift assignments: conflict checking, creation, the
//! check-in/check-out state machine, and cancellation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;

use staffhub_core::assignment::{self, AssignmentStatus};
use staffhub_core::audit::action_types;
use staffhub_core::error::CoreError;
use staffhub_core::permissions::Capability;
use staffhub_core::shift_time::TimeWindow;
use staffhub_core::types::DbId;
use staffhub_db::models::shift_assignment::{
    BulkCreateRequest, BulkItemOutcome, CancelRequest, CheckRequest, ConflictReport,
    CreateShiftAssignment, ShiftAssignment,
};
use staffhub_db::repositories::{
    AbsenceRepo, CreateOutcome, ShiftAssignmentRepo, ShiftTemplateRepo,
};

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::identity::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Conflict check
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ConflictCheckQuery {
    pub employee_id: DbId,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// GET /api/v1/assignments/conflict-check
///
/// Advisory read-only check; creation re-runs the same check inside its
/// transaction, so a clean answer here is not a reservation.
pub async fn conflict_check(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ConflictCheckQuery>,
) -> AppResult<impl IntoResponse> {
    TimeWindow::new(query.start, query.end)?;

    let conflicts = ShiftAssignmentRepo::find_conflicts(
        &state.pool,
        query.employee_id,
        query.date,
        query.start,
        query.end,
        &[],
    )
    .await?;
    let absences =
        AbsenceRepo::list_covering(&state.pool, query.employee_id, query.date).await?;
    let absence_conflict = !absences.is_empty();

    Ok(Json(DataResponse {
        data: ConflictReport {
            has_conflict: !conflicts.is_empty() || absence_conflict,
            conflicts,
            absence_conflict,
        },
    }))
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

async fn create_one(
    state: &AppState,
    auth: &AuthUser,
    input: &CreateShiftAssignment,
) -> Result<ShiftAssignment, AppError> {
    let template = ShiftTemplateRepo::find_by_id(&state.pool, input.template_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ShiftTemplate",
            id: input.template_id,
        })?;
    if !template.is_active {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Template {} is deactivated",
            template.id
        ))));
    }

    let outcome = ShiftAssignmentRepo::create_checked(
        &state.pool,
        input.employee_id,
        None,
        &template,
        input.date,
        auth.user_id,
        input.notes.as_deref(),
    )
    .await?;

    match outcome {
        CreateOutcome::Created(created) => {
            record_audit(
                &state.pool,
                Some(auth.user_id),
                action_types::ASSIGNMENT_CREATE,
                "shift_assignment",
                created.id,
                Some(json!({
                    "employee_id": created.employee_id,
                    "date": created.assignment_date,
                })),
            )
            .await?;
            Ok(created)
        }
        CreateOutcome::Conflicting(conflicts) => {
            let ids: Vec<DbId> = conflicts.iter().map(|c| c.id).collect();
            Err(AppError::Core(CoreError::Conflict(format!(
                "Window overlaps existing assignments {ids:?}"
            ))))
        }
        CreateOutcome::AbsenceConflict => Err(AppError::Core(CoreError::Conflict(
            "An approved absence covers this date".into(),
        ))),
    }
}

/// POST /api/v1/assignments
pub async fn create_assignment(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateShiftAssignment>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::AssignShifts)?;

    let created = create_one(&state, &auth, &input).await?;

    tracing::info!(
        user_id = auth.user_id,
        assignment_id = created.id,
        employee_id = created.employee_id,
        date = %created.assignment_date,
        "Assignment created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// POST /api/v1/assignments/bulk
///
/// Validates each item independently; partial failure is reported per
/// item, never rolled back as a whole.
pub async fn bulk_create_assignments(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<BulkCreateRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::AssignShifts)?;

    let mut outcomes = Vec::with_capacity(input.items.len());
    for (index, item) in input.items.iter().enumerate() {
        match create_one(&state, &auth, item).await {
            Ok(created) => outcomes.push(BulkItemOutcome {
                index,
                succeeded: true,
                assignment_id: Some(created.id),
                error_code: None,
                error: None,
            }),
            Err(err) => {
                let code = match &err {
                    AppError::Core(CoreError::Conflict(_)) => "CONFLICT",
                    AppError::Core(CoreError::Validation(_)) => "VALIDATION_ERROR",
                    AppError::Core(CoreError::NotFound { .. }) => "NOT_FOUND",
                    _ => "INTERNAL_ERROR",
                };
                outcomes.push(BulkItemOutcome {
                    index,
                    succeeded: false,
                    assignment_id: None,
                    error_code: Some(code.to_string()),
                    error: Some(err.to_string()),
                });
            }
        }
    }

    let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
    tracing::info!(
        user_id = auth.user_id,
        total = outcomes.len(),
        succeeded,
        "Bulk assignment creation finished"
    );
    Ok(Json(DataResponse { data: outcomes }))
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// GET /api/v1/assignments/{id}
pub async fn get_assignment(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = fetch_assignment(&state, id).await?;
    Ok(Json(DataResponse { data: found }))
}

#[derive(Debug, Deserialize)]
pub struct ListAssignmentsQuery {
    pub employee_id: DbId,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// GET /api/v1/assignments
pub async fn list_assignments(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListAssignmentsQuery>,
) -> AppResult<impl IntoResponse> {
    let assignments = ShiftAssignmentRepo::list_for_employee(
        &state.pool,
        query.employee_id,
        query.from,
        query.to,
    )
    .await?;
    Ok(Json(DataResponse { data: assignments }))
}

// ---------------------------------------------------------------------------
// Check-in / check-out / cancel
// ---------------------------------------------------------------------------

async fn fetch_assignment(state: &AppState, id: DbId) -> Result<ShiftAssignment, AppError> {
    ShiftAssignmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "ShiftAssignment",
                id,
            })
        })
}

/// Zero rows from a CAS update: distinguish "gone" from "moved on".
fn stale_or_invalid(current: &ShiftAssignment, expected: AssignmentStatus) -> AppError {
    match AssignmentStatus::parse(&current.status) {
        Some(status) if status == expected => AppError::Core(CoreError::StaleState(format!(
            "Assignment {} changed concurrently; re-fetch and retry",
            current.id
        ))),
        Some(status) => AppError::Core(CoreError::InvalidTransition(format!(
            "Assignment {} is {}, expected {}",
            current.id,
            status.as_str(),
            expected.as_str()
        ))),
        None => AppError::InternalError(format!(
            "Assignment {} has unknown status '{}'",
            current.id, current.status
        )),
    }
}

/// POST /api/v1/assignments/{id}/check-in
pub async fn check_in(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CheckRequest>,
) -> AppResult<impl IntoResponse> {
    let existing = fetch_assignment(&state, id).await?;
    auth.require_self_or(existing.employee_id, Capability::AssignShifts)?;

    let current = AssignmentStatus::parse(&existing.status)
        .ok_or_else(|| AppError::InternalError(format!("Unknown status '{}'", existing.status)))?;
    current.validate_transition(AssignmentStatus::CheckedIn)?;

    let now = Utc::now();
    let updated = ShiftAssignmentRepo::check_in(&state.pool, id, now, input.location.as_deref())
        .await?;
    let Some(updated) = updated else {
        let current = fetch_assignment(&state, id).await?;
        return Err(stale_or_invalid(&current, AssignmentStatus::Scheduled));
    };

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::ASSIGNMENT_CHECK_IN,
        "shift_assignment",
        id,
        None,
    )
    .await?;

    tracing::info!(user_id = auth.user_id, assignment_id = id, "Checked in");
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/assignments/{id}/check-out
pub async fn check_out(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CheckRequest>,
) -> AppResult<impl IntoResponse> {
    let existing = fetch_assignment(&state, id).await?;
    auth.require_self_or(existing.employee_id, Capability::AssignShifts)?;

    let current = AssignmentStatus::parse(&existing.status)
        .ok_or_else(|| AppError::InternalError(format!("Unknown status '{}'", existing.status)))?;
    current.validate_transition(AssignmentStatus::CheckedOut)?;

    let check_in_at = existing.check_in_at.ok_or_else(|| {
        AppError::Core(CoreError::InvalidTransition(
            "Cannot check out before checking in".into(),
        ))
    })?;
    let template = ShiftTemplateRepo::find_by_id(&state.pool, existing.template_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ShiftTemplate",
            id: existing.template_id,
        })?;

    let now = Utc::now();
    let break_minutes = if template.has_break {
        template.break_minutes.unwrap_or(0)
    } else {
        0
    };
    let close = assignment::close_out(
        check_in_at,
        now,
        break_minutes,
        template.regular_minutes(),
        template.overtime_eligible,
    )?;

    let updated = ShiftAssignmentRepo::check_out(
        &state.pool,
        id,
        now,
        input.location.as_deref(),
        &close,
    )
    .await?;
    let Some(updated) = updated else {
        let current = fetch_assignment(&state, id).await?;
        return Err(stale_or_invalid(&current, AssignmentStatus::CheckedIn));
    };

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::ASSIGNMENT_CHECK_OUT,
        "shift_assignment",
        id,
        Some(json!({ "worked_minutes": close.worked_minutes })),
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        assignment_id = id,
        worked_minutes = close.worked_minutes,
        is_overtime = close.is_overtime,
        "Checked out"
    );
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/assignments/{id}/cancel
///
/// Soft-cancel with a mandatory reason; valid from any non-terminal state.
pub async fn cancel_assignment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CancelRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::AssignShifts)?;
    if input.reason.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "A cancellation reason is required".into(),
        )));
    }

    let existing = fetch_assignment(&state, id).await?;
    let current = AssignmentStatus::parse(&existing.status)
        .ok_or_else(|| AppError::InternalError(format!("Unknown status '{}'", existing.status)))?;
    current.validate_transition(AssignmentStatus::Cancelled)?;

    let updated =
        ShiftAssignmentRepo::cancel(&state.pool, id, current.as_str(), &input.reason).await?;
    let Some(updated) = updated else {
        let now = fetch_assignment(&state, id).await?;
        return Err(stale_or_invalid(&now, current));
    };

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::ASSIGNMENT_CANCEL,
        "shift_assignment",
        id,
        Some(json!({ "reason": input.reason })),
    )
    .await?;

    tracing::info!(user_id = auth.user_id, assignment_id = id, "Assignment cancelled");
    Ok(Json(DataResponse { data: updated }))
}
