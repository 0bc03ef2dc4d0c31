//! Handlers for the shift template catalog.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveTime;
use serde::Deserialize;

use staffhub_core::error::CoreError;
use staffhub_core::permissions::Capability;
use staffhub_core::template;
use staffhub_core::types::DbId;
use staffhub_db::models::shift_template::{CreateShiftTemplate, UpdateShiftTemplate};
use staffhub_db::repositories::ShiftTemplateRepo;

use crate::error::AppResult;
use crate::middleware::identity::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/templates
pub async fn create_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateShiftTemplate>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManageTemplates)?;
    template::validate_shape(
        input.start_time,
        input.end_time,
        input.has_break,
        input.break_minutes,
    )?;

    let created = ShiftTemplateRepo::create(&state.pool, &input).await?;

    tracing::info!(user_id = auth.user_id, template_id = created.id, "Template created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

#[derive(Debug, Deserialize)]
pub struct ListTemplatesQuery {
    /// Include deactivated templates.
    #[serde(default)]
    pub all: bool,
    /// Only overtime-eligible templates.
    #[serde(default)]
    pub overtime_eligible: bool,
}

/// GET /api/v1/templates
pub async fn list_templates(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListTemplatesQuery>,
) -> AppResult<impl IntoResponse> {
    let templates = if query.overtime_eligible {
        ShiftTemplateRepo::list_overtime_eligible(&state.pool).await?
    } else if query.all {
        ShiftTemplateRepo::list_all(&state.pool).await?
    } else {
        ShiftTemplateRepo::list_active(&state.pool).await?
    };
    Ok(Json(DataResponse { data: templates }))
}

#[derive(Debug, Deserialize)]
pub struct OverlappingQuery {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// GET /api/v1/templates/overlapping
///
/// Active templates whose window overlaps `[start, end)`, used for
/// cross-template overlap warnings in schedule tooling.
pub async fn list_overlapping_templates(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<OverlappingQuery>,
) -> AppResult<impl IntoResponse> {
    staffhub_core::shift_time::TimeWindow::new(query.start, query.end)?;
    let templates =
        ShiftTemplateRepo::list_overlapping(&state.pool, query.start, query.end).await?;
    Ok(Json(DataResponse { data: templates }))
}

/// GET /api/v1/templates/{id}
pub async fn get_template(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = ShiftTemplateRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ShiftTemplate",
            id,
        })?;
    Ok(Json(DataResponse { data: found }))
}

/// PUT /api/v1/templates/{id}
pub async fn update_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateShiftTemplate>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManageTemplates)?;

    let existing = ShiftTemplateRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ShiftTemplate",
            id,
        })?;

    // Validate the merged shape before writing anything.
    template::validate_shape(
        input.start_time.unwrap_or(existing.start_time),
        input.end_time.unwrap_or(existing.end_time),
        input.has_break.unwrap_or(existing.has_break),
        input.break_minutes.or(existing.break_minutes),
    )?;

    let updated = ShiftTemplateRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ShiftTemplate",
            id,
        })?;

    tracing::info!(user_id = auth.user_id, template_id = id, "Template updated");
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/templates/{id}/deactivate
///
/// A visibility flag only; past assignments keep their planned windows.
pub async fn deactivate_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManageTemplates)?;

    let updated = ShiftTemplateRepo::deactivate(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ShiftTemplate",
            id,
        })?;

    tracing::info!(user_id = auth.user_id, template_id = id, "Template deactivated");
    Ok(Json(DataResponse { data: updated }))
}
