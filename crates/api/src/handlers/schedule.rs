//! Handlers for the schedule lifecycle: CRUD, publish/archive/cancel, and
//! the bulk generators.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::json;

use staffhub_core::audit::action_types;
use staffhub_core::error::CoreError;
use staffhub_core::permissions::Capability;
use staffhub_core::schedule::{
    self, PlannedAssignment, ScheduleStatus, ScheduleType, WeekdayRule,
};
use staffhub_core::types::DbId;
use staffhub_db::models::shift_assignment::BulkItemOutcome;
use staffhub_db::models::shift_schedule::{
    CopyScheduleRequest, CreateShiftSchedule, GenerateScheduleRequest, ShiftSchedule,
    UpdateShiftSchedule, WeekdayRuleInput,
};
use staffhub_db::models::shift_template::ShiftTemplate;
use staffhub_db::repositories::{
    CreateOutcome, ShiftAssignmentRepo, ShiftScheduleRepo, ShiftTemplateRepo,
};

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::identity::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

async fn fetch_schedule(state: &AppState, id: DbId) -> Result<ShiftSchedule, AppError> {
    ShiftScheduleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "ShiftSchedule",
                id,
            })
        })
}

fn parse_status(schedule: &ShiftSchedule) -> Result<ScheduleStatus, AppError> {
    ScheduleStatus::parse(&schedule.status).ok_or_else(|| {
        AppError::InternalError(format!("Unknown schedule status '{}'", schedule.status))
    })
}

/// POST /api/v1/schedules
pub async fn create_schedule(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateShiftSchedule>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManageSchedules)?;
    if ScheduleType::parse(&input.schedule_type).is_none() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown schedule type '{}'",
            input.schedule_type
        ))));
    }
    if input.end_date < input.start_date {
        return Err(AppError::Core(CoreError::Validation(
            "Schedule end date precedes start date".into(),
        )));
    }

    let created = ShiftScheduleRepo::create(&state.pool, &input, auth.user_id).await?;
    tracing::info!(user_id = auth.user_id, schedule_id = created.id, "Schedule created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

#[derive(Debug, Deserialize)]
pub struct ListSchedulesQuery {
    pub status: Option<String>,
    /// PUBLISHED schedules starting within this many days.
    pub upcoming_days: Option<i64>,
}

/// GET /api/v1/schedules
pub async fn list_schedules(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListSchedulesQuery>,
) -> AppResult<impl IntoResponse> {
    let schedules = if let Some(days) = query.upcoming_days {
        let today = chrono::Utc::now().date_naive();
        ShiftScheduleRepo::find_upcoming(&state.pool, today, days).await?
    } else if let Some(status) = &query.status {
        if ScheduleStatus::parse(status).is_none() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown schedule status '{status}'"
            ))));
        }
        ShiftScheduleRepo::list_by_status(&state.pool, status).await?
    } else {
        ShiftScheduleRepo::list_all(&state.pool).await?
    };
    Ok(Json(DataResponse { data: schedules }))
}

/// GET /api/v1/schedules/{id}
pub async fn get_schedule(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = fetch_schedule(&state, id).await?;
    Ok(Json(DataResponse { data: found }))
}

/// GET /api/v1/schedules/{id}/assignments
pub async fn list_schedule_assignments(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    fetch_schedule(&state, id).await?;
    let assignments = ShiftAssignmentRepo::list_for_schedule(&state.pool, id).await?;
    Ok(Json(DataResponse { data: assignments }))
}

/// PUT /api/v1/schedules/{id}
///
/// Structural edits are a DRAFT-only operation.
pub async fn update_schedule(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateShiftSchedule>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManageSchedules)?;

    let existing = fetch_schedule(&state, id).await?;
    if !parse_status(&existing)?.is_editable() {
        return Err(AppError::Core(CoreError::InvalidTransition(format!(
            "Schedule {} is {} and cannot be edited",
            id, existing.status
        ))));
    }

    let updated = ShiftScheduleRepo::update_draft(&state.pool, id, &input)
        .await?
        .ok_or_else(|| {
            CoreError::StaleState(format!("Schedule {id} changed concurrently"))
        })?;

    tracing::info!(user_id = auth.user_id, schedule_id = id, "Schedule updated");
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/schedules/{id}
///
/// Only DRAFT schedules owning zero assignments may be deleted.
pub async fn delete_schedule(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManageSchedules)?;

    let existing = fetch_schedule(&state, id).await?;
    if !parse_status(&existing)?.is_editable() {
        return Err(AppError::Core(CoreError::InvalidTransition(format!(
            "Schedule {} is {} and cannot be deleted",
            id, existing.status
        ))));
    }
    let owned = ShiftAssignmentRepo::count_for_schedule(&state.pool, id).await?;
    if owned > 0 {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Schedule {id} owns {owned} assignments; cancel it instead"
        ))));
    }

    if !ShiftScheduleRepo::delete_draft(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::StaleState(format!(
            "Schedule {id} changed concurrently"
        ))));
    }

    tracing::info!(user_id = auth.user_id, schedule_id = id, "Schedule deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Lifecycle transitions
// ---------------------------------------------------------------------------

/// POST /api/v1/schedules/{id}/publish
///
/// Re-validates every contained assignment against other schedules before
/// the DRAFT -> PUBLISHED move; drafts may have been edited concurrently.
pub async fn publish_schedule(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManageSchedules)?;

    let existing = fetch_schedule(&state, id).await?;
    parse_status(&existing)?.validate_transition(ScheduleStatus::Published)?;

    let conflicts = ShiftAssignmentRepo::find_cross_schedule_conflicts(&state.pool, id).await?;
    if !conflicts.is_empty() {
        let ids: Vec<DbId> = conflicts.iter().map(|c| c.id).collect();
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Assignments {ids:?} conflict with other schedules"
        ))));
    }

    let published = ShiftScheduleRepo::publish(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::StaleState(format!("Schedule {id} changed concurrently")))?;

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::SCHEDULE_PUBLISH,
        "shift_schedule",
        id,
        None,
    )
    .await?;

    tracing::info!(user_id = auth.user_id, schedule_id = id, "Schedule published");
    Ok(Json(DataResponse { data: published }))
}

/// POST /api/v1/schedules/{id}/archive
pub async fn archive_schedule(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManageSchedules)?;

    let existing = fetch_schedule(&state, id).await?;
    parse_status(&existing)?.validate_transition(ScheduleStatus::Archived)?;

    let archived = ShiftScheduleRepo::archive(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::StaleState(format!("Schedule {id} changed concurrently")))?;

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::SCHEDULE_ARCHIVE,
        "shift_schedule",
        id,
        None,
    )
    .await?;

    tracing::info!(user_id = auth.user_id, schedule_id = id, "Schedule archived");
    Ok(Json(DataResponse { data: archived }))
}

#[derive(Debug, Deserialize)]
pub struct CancelScheduleRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct CancelScheduleResponse {
    pub schedule: ShiftSchedule,
    pub assignments_cancelled: u64,
}

/// POST /api/v1/schedules/{id}/cancel
///
/// Cascades a soft-cancel to every non-terminal assignment the schedule
/// owns, in the same transaction.
pub async fn cancel_schedule(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CancelScheduleRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManageSchedules)?;
    if input.reason.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "A cancellation reason is required".into(),
        )));
    }

    let existing = fetch_schedule(&state, id).await?;
    parse_status(&existing)?.validate_transition(ScheduleStatus::Cancelled)?;

    let (schedule, assignments_cancelled) =
        ShiftScheduleRepo::cancel_cascading(&state.pool, id, &input.reason)
            .await?
            .ok_or_else(|| {
                CoreError::StaleState(format!("Schedule {id} changed concurrently"))
            })?;

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::SCHEDULE_CANCEL,
        "shift_schedule",
        id,
        Some(json!({
            "reason": input.reason,
            "assignments_cancelled": assignments_cancelled,
        })),
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        schedule_id = id,
        assignments_cancelled,
        "Schedule cancelled"
    );
    Ok(Json(DataResponse {
        data: CancelScheduleResponse {
            schedule,
            assignments_cancelled,
        },
    }))
}

// ---------------------------------------------------------------------------
// Bulk generation
// ---------------------------------------------------------------------------

fn parse_weekday(name: &str) -> Result<Weekday, AppError> {
    match name.to_ascii_lowercase().as_str() {
        "monday" => Ok(Weekday::Mon),
        "tuesday" => Ok(Weekday::Tue),
        "wednesday" => Ok(Weekday::Wed),
        "thursday" => Ok(Weekday::Thu),
        "friday" => Ok(Weekday::Fri),
        "saturday" => Ok(Weekday::Sat),
        "sunday" => Ok(Weekday::Sun),
        other => Err(AppError::Core(CoreError::Validation(format!(
            "Unknown weekday '{other}'"
        )))),
    }
}

async fn resolve_rules(
    state: &AppState,
    inputs: &[WeekdayRuleInput],
) -> Result<(Vec<WeekdayRule>, Vec<ShiftTemplate>), AppError> {
    let mut rules = Vec::with_capacity(inputs.len());
    let mut templates = Vec::new();
    for input in inputs {
        let weekday = parse_weekday(&input.weekday)?;
        if !templates.iter().any(|t: &ShiftTemplate| t.id == input.template_id) {
            let template = ShiftTemplateRepo::find_by_id(&state.pool, input.template_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "ShiftTemplate",
                    id: input.template_id,
                })?;
            templates.push(template);
        }
        rules.push(WeekdayRule {
            employee_id: input.employee_id,
            template_id: input.template_id,
            weekday,
        });
    }
    Ok((rules, templates))
}

#[derive(Debug, Serialize)]
pub struct GeneratedScheduleResponse {
    pub schedule: ShiftSchedule,
    pub outcomes: Vec<BulkItemOutcome>,
}

/// Expand planned assignments into a DRAFT schedule, one critical section
/// per item; failures are reported per item.
async fn materialise(
    state: &AppState,
    auth: &AuthUser,
    schedule: &ShiftSchedule,
    planned: &[PlannedAssignment],
    templates: &[ShiftTemplate],
) -> Result<Vec<BulkItemOutcome>, AppError> {
    let mut outcomes = Vec::with_capacity(planned.len());
    for (index, item) in planned.iter().enumerate() {
        let template = templates
            .iter()
            .find(|t| t.id == item.template_id)
            .expect("resolved before expansion");

        let outcome = ShiftAssignmentRepo::create_checked(
            &state.pool,
            item.employee_id,
            Some(schedule.id),
            template,
            item.date,
            auth.user_id,
            None,
        )
        .await?;

        outcomes.push(match outcome {
            CreateOutcome::Created(created) => BulkItemOutcome {
                index,
                succeeded: true,
                assignment_id: Some(created.id),
                error_code: None,
                error: None,
            },
            CreateOutcome::Conflicting(conflicts) => BulkItemOutcome {
                index,
                succeeded: false,
                assignment_id: None,
                error_code: Some("CONFLICT".to_string()),
                error: Some(format!(
                    "Window overlaps {} existing assignment(s)",
                    conflicts.len()
                )),
            },
            CreateOutcome::AbsenceConflict => BulkItemOutcome {
                index,
                succeeded: false,
                assignment_id: None,
                error_code: Some("CONFLICT".to_string()),
                error: Some("An approved absence covers this date".to_string()),
            },
        });
    }
    Ok(outcomes)
}

async fn generate(
    auth: AuthUser,
    state: AppState,
    input: GenerateScheduleRequest,
    schedule_type: ScheduleType,
    range: (NaiveDate, NaiveDate),
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManageSchedules)?;

    let (rules, templates) = resolve_rules(&state, &input.rules).await?;
    let planned = schedule::expand_range(range.0, range.1, &rules)?;

    let created = ShiftScheduleRepo::create(
        &state.pool,
        &CreateShiftSchedule {
            name: input.name,
            schedule_type: schedule_type.as_str().to_string(),
            start_date: range.0,
            end_date: range.1,
        },
        auth.user_id,
    )
    .await?;

    let outcomes = materialise(&state, &auth, &created, &planned, &templates).await?;

    let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
    tracing::info!(
        user_id = auth.user_id,
        schedule_id = created.id,
        planned = planned.len(),
        succeeded,
        "Schedule generated"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: GeneratedScheduleResponse {
                schedule: created,
                outcomes,
            },
        }),
    ))
}

/// POST /api/v1/schedules/generate-weekly
pub async fn generate_weekly(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<GenerateScheduleRequest>,
) -> AppResult<impl IntoResponse> {
    let range = schedule::weekly_range(input.start_date);
    generate(auth, state, input, ScheduleType::Weekly, range).await
}

/// POST /api/v1/schedules/generate-monthly
pub async fn generate_monthly(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<GenerateScheduleRequest>,
) -> AppResult<impl IntoResponse> {
    let range = schedule::monthly_range(input.start_date);
    generate(auth, state, input, ScheduleType::Monthly, range).await
}

/// POST /api/v1/schedules/{id}/copy
///
/// Clones the source schedule's assignment pattern onto a new date range,
/// preserving each assignment's day offset. Always lands in DRAFT.
pub async fn copy_schedule(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CopyScheduleRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManageSchedules)?;

    let source = fetch_schedule(&state, id).await?;
    let source_assignments = ShiftAssignmentRepo::list_for_schedule(&state.pool, id).await?;

    let span_days = (source.end_date - source.start_date).num_days();
    let new_end = input.new_start_date + chrono::Days::new(span_days as u64);

    let created = ShiftScheduleRepo::create(
        &state.pool,
        &CreateShiftSchedule {
            name: input.name,
            schedule_type: source.schedule_type.clone(),
            start_date: input.new_start_date,
            end_date: new_end,
        },
        auth.user_id,
    )
    .await?;

    let mut planned = Vec::new();
    let mut templates: Vec<ShiftTemplate> = Vec::new();
    for assignment in &source_assignments {
        if assignment.status == "CANCELLED" {
            continue;
        }
        let offset = (assignment.assignment_date - source.start_date).num_days().max(0);
        let date = input.new_start_date + chrono::Days::new(offset as u64);
        if !templates.iter().any(|t| t.id == assignment.template_id) {
            let template = ShiftTemplateRepo::find_by_id(&state.pool, assignment.template_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "ShiftTemplate",
                    id: assignment.template_id,
                })?;
            templates.push(template);
        }
        planned.push(PlannedAssignment {
            employee_id: assignment.employee_id,
            template_id: assignment.template_id,
            date,
        });
    }

    let outcomes = materialise(&state, &auth, &created, &planned, &templates).await?;

    tracing::info!(
        user_id = auth.user_id,
        source_schedule_id = id,
        schedule_id = created.id,
        copied = planned.len(),
        "Schedule copied"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: GeneratedScheduleResponse {
                schedule: created,
                outcomes,
            },
        }),
    ))
}
