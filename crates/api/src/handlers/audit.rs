//! Handlers for reading and verifying the audit log.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use staffhub_core::permissions::Capability;
use staffhub_core::types::DbId;
use staffhub_db::repositories::AuditLogRepo;

use crate::error::AppResult;
use crate::middleware::identity::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/audit/{entity_type}/{entity_id}
pub async fn list_for_entity(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ReviewViolations)?;
    let entries = AuditLogRepo::list_for_entity(&state.pool, &entity_type, entity_id).await?;
    Ok(Json(DataResponse { data: entries }))
}

#[derive(Debug, Serialize)]
pub struct ChainVerification {
    pub intact: bool,
    /// Id of the first tampered entry, when the chain is broken.
    pub first_tampered_id: Option<DbId>,
}

/// GET /api/v1/audit/verify
///
/// Recomputes the whole integrity hash chain.
pub async fn verify_chain(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::RunSweeps)?;
    let first_tampered_id = AuditLogRepo::verify_chain(&state.pool).await?;
    Ok(Json(DataResponse {
        data: ChainVerification {
            intact: first_tampered_id.is_none(),
            first_tampered_id,
        },
    }))
}
