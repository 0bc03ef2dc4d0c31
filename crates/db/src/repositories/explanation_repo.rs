//! Repository for the `violation_explanations` table.
//!
//! Submission and review each run as one transaction that moves both the
//! explanation and its violation, so the pair can never drift apart.

use sqlx::PgPool;
use staffhub_core::explanation::ReviewDecision;
use staffhub_core::types::DbId;

use crate::models::explanation::ViolationExplanation;

const EXPLANATION_COLUMNS: &str = "\
    id, violation_id, submitted_by, explanation_text, status, submitted_at, \
    reviewed_by, reviewed_at, review_notes, created_at, updated_at";

/// Outcome of a submission attempt.
#[derive(Debug)]
pub enum SubmitOutcome {
    Created(ViolationExplanation),
    /// A SUBMITTED explanation is already awaiting review.
    PendingExists,
    /// The violation cannot accept explanations in its current status.
    ViolationClosed(String),
}

/// Outcome of a review decision.
#[derive(Debug)]
pub enum ReviewOutcome {
    Decided(ViolationExplanation),
    /// The explanation was no longer SUBMITTED (lost a race or already
    /// decided).
    Stale,
}

pub struct ExplanationRepo;

impl ExplanationRepo {
    /// Submit an explanation for a violation.
    ///
    /// At most one SUBMITTED explanation may exist per violation;
    /// resubmission after NEEDS_MORE_INFO creates a fresh row while the
    /// old one stays in history. Moves the violation to PENDING_REVIEW.
    pub async fn submit(
        pool: &PgPool,
        violation_id: DbId,
        submitted_by: DbId,
        explanation_text: &str,
    ) -> Result<SubmitOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let violation_status: Option<String> = sqlx::query_scalar(
            "SELECT status FROM attendance_violations WHERE id = $1 FOR UPDATE",
        )
        .bind(violation_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(violation_status) = violation_status else {
            tx.rollback().await?;
            return Err(sqlx::Error::RowNotFound);
        };

        if !matches!(violation_status.as_str(), "OPEN" | "PENDING_EXPLANATION") {
            tx.rollback().await?;
            return Ok(SubmitOutcome::ViolationClosed(violation_status));
        }

        let pending_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS ( \
                 SELECT 1 FROM violation_explanations \
                 WHERE violation_id = $1 AND status = 'SUBMITTED')",
        )
        .bind(violation_id)
        .fetch_one(&mut *tx)
        .await?;

        if pending_exists {
            tx.rollback().await?;
            return Ok(SubmitOutcome::PendingExists);
        }

        let query = format!(
            "INSERT INTO violation_explanations (violation_id, submitted_by, explanation_text) \
             VALUES ($1, $2, $3) \
             RETURNING {EXPLANATION_COLUMNS}"
        );
        let explanation = sqlx::query_as::<_, ViolationExplanation>(&query)
            .bind(violation_id)
            .bind(submitted_by)
            .bind(explanation_text)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE attendance_violations SET status = 'PENDING_REVIEW', updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(violation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(SubmitOutcome::Created(explanation))
    }

    /// Apply a review decision to a SUBMITTED explanation, moving the
    /// violation to the status the decision dictates.
    pub async fn review(
        pool: &PgPool,
        id: DbId,
        decision: ReviewDecision,
        reviewed_by: DbId,
        notes: Option<&str>,
    ) -> Result<ReviewOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE violation_explanations SET \
                 status = $3, reviewed_by = $4, reviewed_at = NOW(), \
                 review_notes = $5, updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {EXPLANATION_COLUMNS}"
        );
        let explanation = sqlx::query_as::<_, ViolationExplanation>(&query)
            .bind(id)
            .bind("SUBMITTED")
            .bind(decision.explanation_status().as_str())
            .bind(reviewed_by)
            .bind(notes)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(explanation) = explanation else {
            tx.rollback().await?;
            return Ok(ReviewOutcome::Stale);
        };

        let violation_update = match decision {
            ReviewDecision::Approve => {
                "UPDATE attendance_violations SET \
                     status = 'RESOLVED', resolved_at = NOW(), resolved_by = $2, \
                     resolution_notes = $3, updated_at = NOW() \
                 WHERE id = $1"
            }
            ReviewDecision::Reject | ReviewDecision::NeedsMoreInfo => {
                "UPDATE attendance_violations SET \
                     status = 'PENDING_EXPLANATION', updated_at = NOW() \
                 WHERE id = $1"
            }
        };
        let mut update = sqlx::query(violation_update).bind(explanation.violation_id);
        if matches!(decision, ReviewDecision::Approve) {
            update = update.bind(reviewed_by).bind(notes);
        }
        update.execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(ReviewOutcome::Decided(explanation))
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ViolationExplanation>, sqlx::Error> {
        let query = format!("SELECT {EXPLANATION_COLUMNS} FROM violation_explanations WHERE id = $1");
        sqlx::query_as::<_, ViolationExplanation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All explanations for a violation, newest first (the first row is
    /// the authoritative one for payroll).
    pub async fn list_for_violation(
        pool: &PgPool,
        violation_id: DbId,
    ) -> Result<Vec<ViolationExplanation>, sqlx::Error> {
        let query = format!(
            "SELECT {EXPLANATION_COLUMNS} FROM violation_explanations \
             WHERE violation_id = $1 ORDER BY submitted_at DESC, id DESC"
        );
        sqlx::query_as::<_, ViolationExplanation>(&query)
            .bind(violation_id)
            .fetch_all(pool)
            .await
    }

    /// Update the text of a still-undecided explanation owned by
    /// `submitted_by`.
    pub async fn update_text(
        pool: &PgPool,
        id: DbId,
        submitted_by: DbId,
        explanation_text: &str,
    ) -> Result<Option<ViolationExplanation>, sqlx::Error> {
        let query = format!(
            "UPDATE violation_explanations SET explanation_text = $3, updated_at = NOW() \
             WHERE id = $1 AND submitted_by = $2 \
               AND status IN ('SUBMITTED', 'NEEDS_MORE_INFO') \
             RETURNING {EXPLANATION_COLUMNS}"
        );
        sqlx::query_as::<_, ViolationExplanation>(&query)
            .bind(id)
            .bind(submitted_by)
            .bind(explanation_text)
            .fetch_optional(pool)
            .await
    }

    /// Delete a still-undecided explanation; evidence rows cascade.
    pub async fn delete_pending(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM violation_explanations \
             WHERE id = $1 AND status IN ('SUBMITTED', 'NEEDS_MORE_INFO')",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
