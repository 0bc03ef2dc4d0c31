//! Handlers for the explanation and evidence workflow.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use staffhub_core::audit::action_types;
use staffhub_core::error::CoreError;
use staffhub_core::explanation::{ExplanationStatus, ReviewDecision};
use staffhub_core::permissions::Capability;
use staffhub_core::types::DbId;
use serde::Serialize;
use staffhub_db::models::explanation::{
    CreateEvidenceRequest, ExplanationEvidence, ReviewExplanationRequest,
    SubmitExplanationRequest, ViolationExplanation,
};
use staffhub_db::repositories::{
    EvidenceRepo, ExplanationRepo, ReviewOutcome, SubmitOutcome, ViolationRepo,
};

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::identity::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

async fn fetch_explanation(state: &AppState, id: DbId) -> Result<ViolationExplanation, AppError> {
    ExplanationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "ViolationExplanation",
                id,
            })
        })
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// POST /api/v1/violations/{violation_id}/explanations
///
/// Only the affected employee may submit, and only one explanation may be
/// awaiting review at a time.
pub async fn submit_explanation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(violation_id): Path<DbId>,
    Json(input): Json<SubmitExplanationRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::SubmitExplanations)?;
    if input.explanation_text.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Explanation text is required".into(),
        )));
    }

    let violation = ViolationRepo::find_by_id(&state.pool, violation_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "AttendanceViolation",
            id: violation_id,
        })?;
    if violation.employee_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the affected employee may submit an explanation".into(),
        )));
    }

    let outcome =
        ExplanationRepo::submit(&state.pool, violation_id, auth.user_id, &input.explanation_text)
            .await?;
    let explanation = match outcome {
        SubmitOutcome::Created(explanation) => explanation,
        SubmitOutcome::PendingExists => {
            return Err(AppError::Core(CoreError::Conflict(
                "An explanation is already awaiting review for this violation".into(),
            )))
        }
        SubmitOutcome::ViolationClosed(status) => {
            return Err(AppError::Core(CoreError::InvalidTransition(format!(
                "Violation is {status} and no longer accepts explanations"
            ))))
        }
    };

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::EXPLANATION_SUBMIT,
        "violation_explanation",
        explanation.id,
        Some(json!({ "violation_id": violation_id })),
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        violation_id,
        explanation_id = explanation.id,
        "Explanation submitted"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: explanation })))
}

/// GET /api/v1/violations/{violation_id}/explanations
pub async fn list_explanations(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(violation_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let violation = ViolationRepo::find_by_id(&state.pool, violation_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "AttendanceViolation",
            id: violation_id,
        })?;
    auth.require_self_or(violation.employee_id, Capability::ReviewViolations)?;

    let explanations = ExplanationRepo::list_for_violation(&state.pool, violation_id).await?;
    Ok(Json(DataResponse { data: explanations }))
}

/// PUT /api/v1/explanations/{id}
///
/// The submitter may amend the text while the explanation is undecided.
pub async fn update_explanation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SubmitExplanationRequest>,
) -> AppResult<impl IntoResponse> {
    if input.explanation_text.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Explanation text is required".into(),
        )));
    }

    let existing = fetch_explanation(&state, id).await?;
    if existing.submitted_by != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the submitter may edit an explanation".into(),
        )));
    }

    let updated =
        ExplanationRepo::update_text(&state.pool, id, auth.user_id, &input.explanation_text)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::InvalidTransition(
                    "Explanation has been reviewed and can no longer be edited".into(),
                ))
            })?;

    tracing::info!(user_id = auth.user_id, explanation_id = id, "Explanation updated");
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/explanations/{id}
///
/// Permitted while SUBMITTED or NEEDS_MORE_INFO; evidence metadata is
/// deleted with it.
pub async fn delete_explanation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let existing = fetch_explanation(&state, id).await?;
    auth.require_self_or(existing.submitted_by, Capability::ReviewViolations)?;

    let status = ExplanationStatus::parse(&existing.status).ok_or_else(|| {
        AppError::InternalError(format!("Unknown explanation status '{}'", existing.status))
    })?;
    if !status.is_deletable() {
        return Err(AppError::Core(CoreError::InvalidTransition(format!(
            "Explanation is {} and can no longer be deleted",
            existing.status
        ))));
    }

    if !ExplanationRepo::delete_pending(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::StaleState(format!(
            "Explanation {id} changed concurrently"
        ))));
    }

    tracing::info!(user_id = auth.user_id, explanation_id = id, "Explanation deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

async fn review(
    auth: AuthUser,
    state: AppState,
    id: DbId,
    decision: ReviewDecision,
    notes: Option<String>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ReviewViolations)?;
    if decision.requires_notes() && notes.as_deref().map_or(true, |n| n.trim().is_empty()) {
        return Err(AppError::Core(CoreError::Validation(
            "Review notes are required for a rejection".into(),
        )));
    }

    // Guard with a typed error before attempting the CAS.
    let existing = fetch_explanation(&state, id).await?;
    let status = ExplanationStatus::parse(&existing.status).ok_or_else(|| {
        AppError::InternalError(format!("Unknown explanation status '{}'", existing.status))
    })?;
    staffhub_core::explanation::validate_reviewable(status)?;

    let outcome =
        ExplanationRepo::review(&state.pool, id, decision, auth.user_id, notes.as_deref()).await?;
    let explanation = match outcome {
        ReviewOutcome::Decided(explanation) => explanation,
        ReviewOutcome::Stale => {
            return Err(AppError::Core(CoreError::StaleState(format!(
                "Explanation {id} changed concurrently"
            ))))
        }
    };

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::EXPLANATION_REVIEW,
        "violation_explanation",
        id,
        Some(json!({
            "decision": explanation.status,
            "violation_id": explanation.violation_id,
        })),
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        explanation_id = id,
        decision = %explanation.status,
        "Explanation reviewed"
    );
    Ok(Json(DataResponse { data: explanation }))
}

/// POST /api/v1/explanations/{id}/approve
pub async fn approve_explanation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewExplanationRequest>,
) -> AppResult<impl IntoResponse> {
    review(auth, state, id, ReviewDecision::Approve, input.notes).await
}

/// POST /api/v1/explanations/{id}/reject
pub async fn reject_explanation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewExplanationRequest>,
) -> AppResult<impl IntoResponse> {
    review(auth, state, id, ReviewDecision::Reject, input.notes).await
}

/// POST /api/v1/explanations/{id}/request-more-info
pub async fn request_more_info(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewExplanationRequest>,
) -> AppResult<impl IntoResponse> {
    review(auth, state, id, ReviewDecision::NeedsMoreInfo, input.notes).await
}

// ---------------------------------------------------------------------------
// Evidence metadata
// ---------------------------------------------------------------------------

/// Evidence metadata plus the download capability the file store resolves.
#[derive(Debug, Serialize)]
pub struct EvidenceResponse {
    #[serde(flatten)]
    pub evidence: ExplanationEvidence,
    pub download_url: String,
}

impl From<ExplanationEvidence> for EvidenceResponse {
    fn from(evidence: ExplanationEvidence) -> Self {
        let download_url = evidence.download_url();
        EvidenceResponse {
            evidence,
            download_url,
        }
    }
}

/// POST /api/v1/explanations/{id}/evidence
///
/// Registers metadata for a file already stored with the file-store
/// collaborator; no bytes pass through this service.
pub async fn add_evidence(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    headers: HeaderMap,
    Json(input): Json<CreateEvidenceRequest>,
) -> AppResult<impl IntoResponse> {
    let explanation = fetch_explanation(&state, id).await?;
    if explanation.submitted_by != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the submitter may attach evidence".into(),
        )));
    }
    let status = ExplanationStatus::parse(&explanation.status).ok_or_else(|| {
        AppError::InternalError(format!("Unknown explanation status '{}'", explanation.status))
    })?;
    if !status.is_pending() {
        return Err(AppError::Core(CoreError::InvalidTransition(format!(
            "Explanation is {} and no longer accepts evidence",
            explanation.status
        ))));
    }

    // The gateway terminates the connection; the original client address
    // arrives in x-forwarded-for.
    let upload_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string());
    let evidence = EvidenceRepo::create(&state.pool, id, &input, upload_ip.as_deref()).await?;

    tracing::info!(
        user_id = auth.user_id,
        explanation_id = id,
        evidence_id = evidence.id,
        "Evidence registered"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: EvidenceResponse::from(evidence),
        }),
    ))
}

/// GET /api/v1/explanations/{id}/evidence
pub async fn list_evidence(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let explanation = fetch_explanation(&state, id).await?;
    auth.require_self_or(explanation.submitted_by, Capability::ReviewViolations)?;

    let evidence: Vec<EvidenceResponse> = EvidenceRepo::list_for_explanation(&state.pool, id)
        .await?
        .into_iter()
        .map(EvidenceResponse::from)
        .collect();
    Ok(Json(DataResponse { data: evidence }))
}

/// POST /api/v1/evidence/{id}/verify
///
/// Independent of the explanation's approval state.
pub async fn verify_evidence(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ReviewViolations)?;

    let verified = EvidenceRepo::verify(&state.pool, id, auth.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ExplanationEvidence",
            id,
        })?;

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::EVIDENCE_VERIFY,
        "explanation_evidence",
        id,
        None,
    )
    .await?;

    tracing::info!(user_id = auth.user_id, evidence_id = id, "Evidence verified");
    Ok(Json(DataResponse { data: verified }))
}

/// DELETE /api/v1/evidence/{id}
pub async fn delete_evidence(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let evidence = EvidenceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ExplanationEvidence",
            id,
        })?;
    let explanation = fetch_explanation(&state, evidence.explanation_id).await?;
    auth.require_self_or(explanation.submitted_by, Capability::ReviewViolations)?;

    if !EvidenceRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::StaleState(format!(
            "Evidence {id} changed concurrently"
        ))));
    }

    tracing::info!(user_id = auth.user_id, evidence_id = id, "Evidence deleted");
    Ok(StatusCode::NO_CONTENT)
}
