//! Violation explanation and evidence metadata models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use staffhub_core::types::{DbId, Timestamp};

/// A row from the `violation_explanations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ViolationExplanation {
    pub id: DbId,
    pub violation_id: DbId,
    pub submitted_by: DbId,
    pub explanation_text: String,
    pub status: String,
    pub submitted_at: Timestamp,
    pub reviewed_by: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub review_notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for submitting an explanation.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitExplanationRequest {
    pub explanation_text: String,
}

/// Request body for a review decision.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewExplanationRequest {
    pub notes: Option<String>,
}

/// A row from the `explanation_evidence` table.
///
/// Only metadata lives here; the bytes are with the file-store
/// collaborator and are reachable through `download_url`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExplanationEvidence {
    pub id: DbId,
    pub explanation_id: DbId,
    pub file_name: String,
    pub description: Option<String>,
    pub evidence_type: String,
    pub stored_name: String,
    pub uploaded_at: Timestamp,
    pub upload_ip: Option<String>,
    pub verified: bool,
    pub verified_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ExplanationEvidence {
    /// Download capability handed to clients; the file store resolves it.
    pub fn download_url(&self) -> String {
        format!("/files/{}", self.stored_name)
    }
}

/// Request body for registering evidence metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvidenceRequest {
    pub file_name: String,
    pub description: Option<String>,
    pub evidence_type: String,
    pub stored_name: String,
}
