//! Handlers for shift swap requests.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use staffhub_core::assignment::AssignmentStatus;
use staffhub_core::audit::action_types;
use staffhub_core::error::CoreError;
use staffhub_core::permissions::Capability;
use staffhub_core::swap::{self, SwapStatus};
use staffhub_core::types::DbId;
use staffhub_db::models::swap::{CreateSwapRequest, DecideSwapRequest, ShiftSwapRequest};
use staffhub_db::repositories::{ShiftAssignmentRepo, SwapDecisionOutcome, SwapRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::identity::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

async fn fetch_swap(state: &AppState, id: DbId) -> Result<ShiftSwapRequest, AppError> {
    SwapRepo::find_by_id(&state.pool, id).await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "ShiftSwapRequest",
            id,
        })
    })
}

/// POST /api/v1/swaps
///
/// The requester must own the offered assignment; both sides must still be
/// SCHEDULED and belong to different employees.
pub async fn create_swap(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSwapRequest>,
) -> AppResult<impl IntoResponse> {
    let requester = ShiftAssignmentRepo::find_by_id(&state.pool, input.requester_assignment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ShiftAssignment",
            id: input.requester_assignment_id,
        })?;
    let target = ShiftAssignmentRepo::find_by_id(&state.pool, input.target_assignment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ShiftAssignment",
            id: input.target_assignment_id,
        })?;

    auth.require_self_or(requester.employee_id, Capability::ReviewSwaps)?;
    swap::validate_swap_pair(requester.employee_id, target.employee_id)
        .map_err(AppError::Core)?;
    for side in [&requester, &target] {
        if AssignmentStatus::parse(&side.status) != Some(AssignmentStatus::Scheduled) {
            return Err(AppError::Core(CoreError::InvalidTransition(format!(
                "Assignment {} is {} and cannot be swapped",
                side.id, side.status
            ))));
        }
    }

    let created = SwapRepo::create(&state.pool, &input, auth.user_id).await?;

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::SWAP_REQUEST,
        "shift_swap_request",
        created.id,
        Some(json!({
            "requester_assignment_id": input.requester_assignment_id,
            "target_assignment_id": input.target_assignment_id,
        })),
    )
    .await?;

    tracing::info!(user_id = auth.user_id, swap_id = created.id, "Swap requested");
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

#[derive(Debug, Deserialize)]
pub struct ListSwapsQuery {
    pub status: Option<String>,
}

/// GET /api/v1/swaps
pub async fn list_swaps(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListSwapsQuery>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ReviewSwaps)?;
    let status = query.status.as_deref().unwrap_or("PENDING");
    if SwapStatus::parse(status).is_none() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown swap status '{status}'"
        ))));
    }
    let swaps = SwapRepo::list_by_status(&state.pool, status).await?;
    Ok(Json(DataResponse { data: swaps }))
}

/// GET /api/v1/swaps/{id}
pub async fn get_swap(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = fetch_swap(&state, id).await?;
    Ok(Json(DataResponse { data: found }))
}

/// POST /api/v1/swaps/{id}/approve
///
/// Conflict detection re-runs for both employees inside the approval
/// transaction before any employee ids move.
pub async fn approve_swap(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<DecideSwapRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ReviewSwaps)?;

    let existing = fetch_swap(&state, id).await?;
    SwapStatus::parse(&existing.status)
        .ok_or_else(|| AppError::InternalError(format!("Unknown swap status '{}'", existing.status)))?
        .validate_transition(SwapStatus::Approved)?;

    let outcome = SwapRepo::approve(&state.pool, id, auth.user_id, input.notes.as_deref()).await?;
    let approved = match outcome {
        SwapDecisionOutcome::Approved(request) => request,
        SwapDecisionOutcome::Conflicting(conflicts) => {
            let ids: Vec<DbId> = conflicts.iter().map(|c| c.id).collect();
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Swap would double-book against assignments {ids:?}"
            ))));
        }
        SwapDecisionOutcome::Stale => {
            return Err(AppError::Core(CoreError::StaleState(format!(
                "Swap request {id} or its assignments changed concurrently"
            ))))
        }
    };

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::SWAP_DECIDE,
        "shift_swap_request",
        id,
        Some(json!({ "decision": "APPROVED" })),
    )
    .await?;

    tracing::info!(user_id = auth.user_id, swap_id = id, "Swap approved");
    Ok(Json(DataResponse { data: approved }))
}

/// POST /api/v1/swaps/{id}/reject
pub async fn reject_swap(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<DecideSwapRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ReviewSwaps)?;

    let rejected =
        SwapRepo::close(&state.pool, id, "REJECTED", auth.user_id, input.notes.as_deref())
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::InvalidTransition(format!(
                    "Swap request {id} is no longer PENDING"
                )))
            })?;

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::SWAP_DECIDE,
        "shift_swap_request",
        id,
        Some(json!({ "decision": "REJECTED" })),
    )
    .await?;

    tracing::info!(user_id = auth.user_id, swap_id = id, "Swap rejected");
    Ok(Json(DataResponse { data: rejected }))
}

/// POST /api/v1/swaps/{id}/cancel
///
/// The requester may withdraw a PENDING request.
pub async fn cancel_swap(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let existing = fetch_swap(&state, id).await?;
    auth.require_self_or(existing.requested_by, Capability::ReviewSwaps)?;

    let cancelled = SwapRepo::close(&state.pool, id, "CANCELLED", auth.user_id, None)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::InvalidTransition(format!(
                "Swap request {id} is no longer PENDING"
            )))
        })?;

    tracing::info!(user_id = auth.user_id, swap_id = id, "Swap cancelled");
    Ok(Json(DataResponse { data: cancelled }))
}
