//! Handlers for attendance violation queries and manual resolution.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use staffhub_core::audit::action_types;
use staffhub_core::error::CoreError;
use staffhub_core::permissions::Capability;
use staffhub_core::types::DbId;
use staffhub_core::violation::ViolationStatus;
use staffhub_db::models::violation::{
    AttendanceViolation, EscalateViolationRequest, ResolveViolationRequest,
};
use staffhub_db::repositories::ViolationRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::identity::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

async fn fetch_violation(state: &AppState, id: DbId) -> Result<AttendanceViolation, AppError> {
    ViolationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "AttendanceViolation",
                id,
            })
        })
}

fn parse_status(violation: &AttendanceViolation) -> Result<ViolationStatus, AppError> {
    ViolationStatus::parse(&violation.status).ok_or_else(|| {
        AppError::InternalError(format!("Unknown violation status '{}'", violation.status))
    })
}

#[derive(Debug, Deserialize)]
pub struct ListViolationsQuery {
    pub status: Option<String>,
    pub employee_id: Option<DbId>,
}

/// GET /api/v1/violations
///
/// Employees see their own; reviewers may filter by any employee or
/// status.
pub async fn list_violations(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListViolationsQuery>,
) -> AppResult<impl IntoResponse> {
    let violations = match (query.employee_id, &query.status) {
        (Some(employee_id), _) => {
            auth.require_self_or(employee_id, Capability::ReviewViolations)?;
            ViolationRepo::list_for_employee(&state.pool, employee_id).await?
        }
        (None, Some(status)) => {
            auth.require(Capability::ReviewViolations)?;
            if ViolationStatus::parse(status).is_none() {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "Unknown violation status '{status}'"
                ))));
            }
            ViolationRepo::list_by_status(&state.pool, status).await?
        }
        (None, None) => ViolationRepo::list_for_employee(&state.pool, auth.user_id).await?,
    };
    Ok(Json(DataResponse { data: violations }))
}

#[derive(Debug, Deserialize)]
pub struct OverdueQuery {
    /// Days since detection; defaults to the explanation SLA.
    pub days: Option<i64>,
}

/// GET /api/v1/violations/overdue
///
/// Violations past the review SLA with no explanation submitted.
pub async fn list_overdue(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<OverdueQuery>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ReviewViolations)?;
    let days = query
        .days
        .unwrap_or(state.config.attendance.explanation_sla_days);
    let cutoff = chrono::Utc::now() - chrono::Duration::days(days);
    let overdue = ViolationRepo::find_overdue(&state.pool, cutoff).await?;
    Ok(Json(DataResponse { data: overdue }))
}

/// GET /api/v1/violations/{id}
pub async fn get_violation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = fetch_violation(&state, id).await?;
    auth.require_self_or(found.employee_id, Capability::ReviewViolations)?;
    Ok(Json(DataResponse { data: found }))
}

/// POST /api/v1/violations/{id}/request-explanation
///
/// Surface an OPEN violation to the employee: OPEN -> PENDING_EXPLANATION.
pub async fn request_explanation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ReviewViolations)?;

    let existing = fetch_violation(&state, id).await?;
    let current = parse_status(&existing)?;
    current.validate_transition(ViolationStatus::PendingExplanation)?;

    let updated = ViolationRepo::update_status(
        &state.pool,
        id,
        current.as_str(),
        ViolationStatus::PendingExplanation.as_str(),
    )
    .await?
    .ok_or_else(|| CoreError::StaleState(format!("Violation {id} changed concurrently")))?;

    tracing::info!(user_id = auth.user_id, violation_id = id, "Explanation requested");
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/violations/{id}/resolve
///
/// Manual resolution without fault; the violation stops charging payroll.
pub async fn resolve_violation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ResolveViolationRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ReviewViolations)?;

    let existing = fetch_violation(&state, id).await?;
    let current = parse_status(&existing)?;
    current.validate_transition(ViolationStatus::Resolved)?;

    let updated = ViolationRepo::resolve(
        &state.pool,
        id,
        current.as_str(),
        auth.user_id,
        input.notes.as_deref(),
    )
    .await?
    .ok_or_else(|| CoreError::StaleState(format!("Violation {id} changed concurrently")))?;

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::VIOLATION_RESOLVE,
        "attendance_violation",
        id,
        input.notes.as_ref().map(|n| json!({ "notes": n })),
    )
    .await?;

    tracing::info!(user_id = auth.user_id, violation_id = id, "Violation resolved");
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/violations/{id}/escalate
///
/// For repeated or serious cases; notes are mandatory.
pub async fn escalate_violation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<EscalateViolationRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ReviewViolations)?;
    if input.notes.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Escalation notes are required".into(),
        )));
    }

    let existing = fetch_violation(&state, id).await?;
    let current = parse_status(&existing)?;
    current.validate_transition(ViolationStatus::Escalated)?;

    let updated =
        ViolationRepo::escalate(&state.pool, id, current.as_str(), auth.user_id, &input.notes)
            .await?
            .ok_or_else(|| {
                CoreError::StaleState(format!("Violation {id} changed concurrently"))
            })?;

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::VIOLATION_ESCALATE,
        "attendance_violation",
        id,
        Some(json!({ "notes": input.notes })),
    )
    .await?;

    tracing::info!(user_id = auth.user_id, violation_id = id, "Violation escalated");
    Ok(Json(DataResponse { data: updated }))
}
