//! Repository for the `shift_swap_requests` table.
//!
//! Approval is the delicate path: both (employee, date) advisory locks are
//! taken in sorted order, both assignments are re-read under `FOR UPDATE`,
//! conflict detection runs for each employee against the window they would
//! take over, and only then are the employee ids exchanged.

use sqlx::PgPool;
use staffhub_core::types::DbId;

use crate::models::shift_assignment::ConflictRef;
use crate::models::swap::{CreateSwapRequest, ShiftSwapRequest};
use crate::repositories::shift_assignment_repo::{advisory_lock_key, ShiftAssignmentRepo};

const SWAP_COLUMNS: &str = "\
    id, requester_assignment_id, target_assignment_id, requested_by, reason, \
    status, decided_by, decided_at, decision_notes, created_at, updated_at";

/// Outcome of a swap approval.
#[derive(Debug)]
pub enum SwapDecisionOutcome {
    Approved(ShiftSwapRequest),
    /// One of the employees would end up double-booked.
    Conflicting(Vec<ConflictRef>),
    /// The request or an assignment changed state under us.
    Stale,
}

pub struct SwapRepo;

impl SwapRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateSwapRequest,
        requested_by: DbId,
    ) -> Result<ShiftSwapRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO shift_swap_requests \
                 (requester_assignment_id, target_assignment_id, requested_by, reason) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {SWAP_COLUMNS}"
        );
        sqlx::query_as::<_, ShiftSwapRequest>(&query)
            .bind(input.requester_assignment_id)
            .bind(input.target_assignment_id)
            .bind(requested_by)
            .bind(&input.reason)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ShiftSwapRequest>, sqlx::Error> {
        let query = format!("SELECT {SWAP_COLUMNS} FROM shift_swap_requests WHERE id = $1");
        sqlx::query_as::<_, ShiftSwapRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_status(
        pool: &PgPool,
        status: &str,
    ) -> Result<Vec<ShiftSwapRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {SWAP_COLUMNS} FROM shift_swap_requests \
             WHERE status = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, ShiftSwapRequest>(&query)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// PENDING -> REJECTED or CANCELLED.
    pub async fn close(
        pool: &PgPool,
        id: DbId,
        new_status: &str,
        decided_by: DbId,
        notes: Option<&str>,
    ) -> Result<Option<ShiftSwapRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE shift_swap_requests SET \
                 status = $2, decided_by = $3, decided_at = NOW(), \
                 decision_notes = $4, updated_at = NOW() \
             WHERE id = $1 AND status = 'PENDING' \
             RETURNING {SWAP_COLUMNS}"
        );
        sqlx::query_as::<_, ShiftSwapRequest>(&query)
            .bind(id)
            .bind(new_status)
            .bind(decided_by)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    /// Approve a PENDING swap: re-check conflicts for both employees under
    /// both advisory locks, then exchange the employee ids.
    pub async fn approve(
        pool: &PgPool,
        id: DbId,
        decided_by: DbId,
        notes: Option<&str>,
    ) -> Result<SwapDecisionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Claim the request first so concurrent approvals serialise on it.
        let query = format!(
            "UPDATE shift_swap_requests SET \
                 status = 'APPROVED', decided_by = $2, decided_at = NOW(), \
                 decision_notes = $3, updated_at = NOW() \
             WHERE id = $1 AND status = 'PENDING' \
             RETURNING {SWAP_COLUMNS}"
        );
        let request = sqlx::query_as::<_, ShiftSwapRequest>(&query)
            .bind(id)
            .bind(decided_by)
            .bind(notes)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(request) = request else {
            tx.rollback().await?;
            return Ok(SwapDecisionOutcome::Stale);
        };

        #[derive(sqlx::FromRow)]
        struct SwapSide {
            id: DbId,
            employee_id: DbId,
            assignment_date: chrono::NaiveDate,
            planned_start: chrono::NaiveTime,
            planned_end: chrono::NaiveTime,
            status: String,
        }

        let sides = sqlx::query_as::<_, SwapSide>(
            "SELECT id, employee_id, assignment_date, planned_start, planned_end, status \
             FROM shift_assignments WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(vec![
            request.requester_assignment_id,
            request.target_assignment_id,
        ])
        .fetch_all(&mut *tx)
        .await?;

        if sides.len() != 2 || sides.iter().any(|s| s.status != "SCHEDULED") {
            tx.rollback().await?;
            return Ok(SwapDecisionOutcome::Stale);
        }
        let (a, b) = (&sides[0], &sides[1]);

        // Both critical sections, in sorted key order to avoid deadlocks.
        let mut keys = [
            advisory_lock_key(a.employee_id, a.assignment_date),
            advisory_lock_key(b.employee_id, b.assignment_date),
            advisory_lock_key(a.employee_id, b.assignment_date),
            advisory_lock_key(b.employee_id, a.assignment_date),
        ];
        keys.sort_unstable();
        for key in keys {
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }

        // Each employee must be free for the window they would take over,
        // ignoring the two assignments being exchanged.
        let exclude = [a.id, b.id];
        let mut conflicts = ShiftAssignmentRepo::find_conflicts(
            &mut *tx,
            a.employee_id,
            b.assignment_date,
            b.planned_start,
            b.planned_end,
            &exclude,
        )
        .await?;
        conflicts.extend(
            ShiftAssignmentRepo::find_conflicts(
                &mut *tx,
                b.employee_id,
                a.assignment_date,
                a.planned_start,
                a.planned_end,
                &exclude,
            )
            .await?,
        );
        if !conflicts.is_empty() {
            tx.rollback().await?;
            return Ok(SwapDecisionOutcome::Conflicting(conflicts));
        }

        sqlx::query(
            "UPDATE shift_assignments SET employee_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(a.id)
        .bind(b.employee_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE shift_assignments SET employee_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(b.id)
        .bind(a.employee_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(SwapDecisionOutcome::Approved(request))
    }
}
