//! Repository for the `explanation_evidence` table. Metadata only; the
//! bytes live with the file-store collaborator.

use sqlx::PgPool;
use staffhub_core::types::DbId;

use crate::models::explanation::{CreateEvidenceRequest, ExplanationEvidence};

const EVIDENCE_COLUMNS: &str = "\
    id, explanation_id, file_name, description, evidence_type, stored_name, \
    uploaded_at, upload_ip, verified, verified_by, created_at, updated_at";

pub struct EvidenceRepo;

impl EvidenceRepo {
    /// Register uploaded evidence metadata against an explanation.
    pub async fn create(
        pool: &PgPool,
        explanation_id: DbId,
        input: &CreateEvidenceRequest,
        upload_ip: Option<&str>,
    ) -> Result<ExplanationEvidence, sqlx::Error> {
        let query = format!(
            "INSERT INTO explanation_evidence \
                 (explanation_id, file_name, description, evidence_type, stored_name, upload_ip) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {EVIDENCE_COLUMNS}"
        );
        sqlx::query_as::<_, ExplanationEvidence>(&query)
            .bind(explanation_id)
            .bind(&input.file_name)
            .bind(&input.description)
            .bind(&input.evidence_type)
            .bind(&input.stored_name)
            .bind(upload_ip)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ExplanationEvidence>, sqlx::Error> {
        let query = format!("SELECT {EVIDENCE_COLUMNS} FROM explanation_evidence WHERE id = $1");
        sqlx::query_as::<_, ExplanationEvidence>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_explanation(
        pool: &PgPool,
        explanation_id: DbId,
    ) -> Result<Vec<ExplanationEvidence>, sqlx::Error> {
        let query = format!(
            "SELECT {EVIDENCE_COLUMNS} FROM explanation_evidence \
             WHERE explanation_id = $1 ORDER BY uploaded_at, id"
        );
        sqlx::query_as::<_, ExplanationEvidence>(&query)
            .bind(explanation_id)
            .fetch_all(pool)
            .await
    }

    /// Mark evidence as verified by a reviewer. Independent of the
    /// explanation's review outcome.
    pub async fn verify(
        pool: &PgPool,
        id: DbId,
        verified_by: DbId,
    ) -> Result<Option<ExplanationEvidence>, sqlx::Error> {
        let query = format!(
            "UPDATE explanation_evidence SET \
                 verified = TRUE, verified_by = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {EVIDENCE_COLUMNS}"
        );
        sqlx::query_as::<_, ExplanationEvidence>(&query)
            .bind(id)
            .bind(verified_by)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM explanation_evidence WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
