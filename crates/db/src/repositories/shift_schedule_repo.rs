//! Repository for the `shift_schedules` table.
//!
//! Status moves are compare-and-swap UPDATEs guarded on the expected prior
//! status; cancellation cascades a soft-cancel to the schedule's
//! non-terminal assignments in the same transaction.

use chrono::NaiveDate;
use sqlx::PgPool;
use staffhub_core::types::DbId;

use crate::models::shift_schedule::{CreateShiftSchedule, ShiftSchedule, UpdateShiftSchedule};
use crate::repositories::ShiftAssignmentRepo;

const SCHEDULE_COLUMNS: &str = "\
    id, name, schedule_type, status, start_date, end_date, created_by, \
    published_at, cancel_reason, created_at, updated_at";

pub struct ShiftScheduleRepo;

impl ShiftScheduleRepo {
    /// Create a schedule; always lands in DRAFT.
    pub async fn create(
        pool: &PgPool,
        input: &CreateShiftSchedule,
        created_by: DbId,
    ) -> Result<ShiftSchedule, sqlx::Error> {
        let query = format!(
            "INSERT INTO shift_schedules (name, schedule_type, start_date, end_date, created_by) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SCHEDULE_COLUMNS}"
        );
        sqlx::query_as::<_, ShiftSchedule>(&query)
            .bind(&input.name)
            .bind(&input.schedule_type)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ShiftSchedule>, sqlx::Error> {
        let query = format!("SELECT {SCHEDULE_COLUMNS} FROM shift_schedules WHERE id = $1");
        sqlx::query_as::<_, ShiftSchedule>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_status(
        pool: &PgPool,
        status: &str,
    ) -> Result<Vec<ShiftSchedule>, sqlx::Error> {
        let query = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM shift_schedules \
             WHERE status = $1 ORDER BY start_date DESC, id"
        );
        sqlx::query_as::<_, ShiftSchedule>(&query)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<ShiftSchedule>, sqlx::Error> {
        let query =
            format!("SELECT {SCHEDULE_COLUMNS} FROM shift_schedules ORDER BY start_date DESC, id");
        sqlx::query_as::<_, ShiftSchedule>(&query).fetch_all(pool).await
    }

    /// Structural update; the handler guarantees the schedule is DRAFT. The
    /// status guard here closes the race with a concurrent publish.
    pub async fn update_draft(
        pool: &PgPool,
        id: DbId,
        input: &UpdateShiftSchedule,
    ) -> Result<Option<ShiftSchedule>, sqlx::Error> {
        let query = format!(
            "UPDATE shift_schedules SET \
                 name = COALESCE($2, name), \
                 start_date = COALESCE($3, start_date), \
                 end_date = COALESCE($4, end_date), \
                 updated_at = NOW() \
             WHERE id = $1 AND status = 'DRAFT' \
             RETURNING {SCHEDULE_COLUMNS}"
        );
        sqlx::query_as::<_, ShiftSchedule>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.start_date)
            .bind(input.end_date)
            .fetch_optional(pool)
            .await
    }

    /// Delete a DRAFT schedule. The handler has already checked it owns no
    /// assignments; the guards re-check both under the delete.
    pub async fn delete_draft(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM shift_schedules \
             WHERE id = $1 AND status = 'DRAFT' \
               AND NOT EXISTS \
                   (SELECT 1 FROM shift_assignments WHERE schedule_id = $1)",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// DRAFT -> PUBLISHED.
    pub async fn publish(pool: &PgPool, id: DbId) -> Result<Option<ShiftSchedule>, sqlx::Error> {
        let query = format!(
            "UPDATE shift_schedules SET \
                 status = 'PUBLISHED', published_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'DRAFT' \
             RETURNING {SCHEDULE_COLUMNS}"
        );
        sqlx::query_as::<_, ShiftSchedule>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// PUBLISHED -> ARCHIVED.
    pub async fn archive(pool: &PgPool, id: DbId) -> Result<Option<ShiftSchedule>, sqlx::Error> {
        let query = format!(
            "UPDATE shift_schedules SET status = 'ARCHIVED', updated_at = NOW() \
             WHERE id = $1 AND status = 'PUBLISHED' \
             RETURNING {SCHEDULE_COLUMNS}"
        );
        sqlx::query_as::<_, ShiftSchedule>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// DRAFT or PUBLISHED -> CANCELLED, cascading a soft-cancel to every
    /// non-terminal assignment the schedule owns. Returns the updated
    /// schedule and the number of assignments cancelled.
    pub async fn cancel_cascading(
        pool: &PgPool,
        id: DbId,
        reason: &str,
    ) -> Result<Option<(ShiftSchedule, u64)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE shift_schedules SET \
                 status = 'CANCELLED', cancel_reason = $2, updated_at = NOW() \
             WHERE id = $1 AND status IN ('DRAFT', 'PUBLISHED') \
             RETURNING {SCHEDULE_COLUMNS}"
        );
        let schedule = sqlx::query_as::<_, ShiftSchedule>(&query)
            .bind(id)
            .bind(reason)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(schedule) = schedule else {
            tx.rollback().await?;
            return Ok(None);
        };

        let cancelled =
            ShiftAssignmentRepo::cancel_all_for_schedule(&mut tx, id, reason).await?;

        tx.commit().await?;
        Ok(Some((schedule, cancelled)))
    }

    /// Archive every PUBLISHED schedule whose end date is before `cutoff`.
    /// Returns the archived ids.
    pub async fn auto_archive(pool: &PgPool, cutoff: NaiveDate) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE shift_schedules SET status = 'ARCHIVED', updated_at = NOW() \
             WHERE status = 'PUBLISHED' AND end_date < $1 \
             RETURNING id",
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await
    }

    /// Delete DRAFT schedules not touched since `cutoff`, along with their
    /// assignments (drafts own only SCHEDULED ones). Returns deleted count.
    pub async fn cleanup_old_drafts(pool: &PgPool, cutoff: chrono::DateTime<chrono::Utc>) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "DELETE FROM shift_assignments WHERE schedule_id IN \
                 (SELECT id FROM shift_schedules \
                  WHERE status = 'DRAFT' AND updated_at < $1)",
        )
        .bind(cutoff)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            "DELETE FROM shift_schedules WHERE status = 'DRAFT' AND updated_at < $1",
        )
        .bind(cutoff)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// PUBLISHED schedules starting within the next `days_ahead` days.
    pub async fn find_upcoming(
        pool: &PgPool,
        today: NaiveDate,
        days_ahead: i64,
    ) -> Result<Vec<ShiftSchedule>, sqlx::Error> {
        let horizon = today + chrono::Days::new(days_ahead.max(0) as u64);
        let query = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM shift_schedules \
             WHERE status = 'PUBLISHED' \
               AND start_date >= $1 AND start_date <= $2 \
             ORDER BY start_date, id"
        );
        sqlx::query_as::<_, ShiftSchedule>(&query)
            .bind(today)
            .bind(horizon)
            .fetch_all(pool)
            .await
    }
}
