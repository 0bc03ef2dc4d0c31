//! Repository for the `shift_assignments` table.
//!
//! Creation runs the conflict check and the insert inside one transaction,
//! serialised per (employee, date) with a Postgres advisory transaction
//! lock, so two concurrent requests can never both pass the check. Status
//! transitions are compare-and-swap UPDATEs guarded on the expected prior
//! status; zero affected rows means the caller lost a race.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{PgPool, Postgres, Transaction};
use staffhub_core::assignment::CloseOut;
use staffhub_core::types::{DbId, Timestamp};

use crate::models::shift_assignment::{ConflictRef, ShiftAssignment};
use crate::models::shift_template::ShiftTemplate;

const ASSIGNMENT_COLUMNS: &str = "\
    id, employee_id, schedule_id, template_id, assignment_date, planned_start, \
    planned_end, status, check_in_at, check_in_location, check_out_at, \
    check_out_location, worked_minutes, regular_minutes, overtime_minutes, \
    is_overtime, assigned_by, notes, cancel_reason, created_at, updated_at";

const CONFLICT_COLUMNS: &str = "id, assignment_date, planned_start, planned_end, status";

/// Outcome of a conflict-checked create.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(ShiftAssignment),
    /// The proposed window overlaps these existing assignments.
    Conflicting(Vec<ConflictRef>),
    /// An approved absence covers the whole day.
    AbsenceConflict,
}

/// Stable advisory-lock key for one (employee, date) pair.
///
/// Collisions only coarsen serialisation, so a cheap mix is enough.
pub fn advisory_lock_key(employee_id: DbId, date: NaiveDate) -> i64 {
    (employee_id << 20) ^ i64::from(date.num_days_from_ce())
}

pub struct ShiftAssignmentRepo;

impl ShiftAssignmentRepo {
    // -----------------------------------------------------------------------
    // Conflict detection
    // -----------------------------------------------------------------------

    /// Non-cancelled assignments of `employee_id` on `date` whose planned
    /// window overlaps `[start, end)`. Half-open: touching boundaries are
    /// not a conflict. All conflicts are returned, not just the first.
    pub async fn find_conflicts<'e, E>(
        executor: E,
        employee_id: DbId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        exclude_ids: &[DbId],
    ) -> Result<Vec<ConflictRef>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {CONFLICT_COLUMNS} FROM shift_assignments \
             WHERE employee_id = $1 AND assignment_date = $2 \
               AND status <> 'CANCELLED' \
               AND planned_start < $4 AND $3 < planned_end \
               AND NOT (id = ANY($5)) \
             ORDER BY planned_start, id"
        );
        sqlx::query_as::<_, ConflictRef>(&query)
            .bind(employee_id)
            .bind(date)
            .bind(start)
            .bind(end)
            .bind(exclude_ids)
            .fetch_all(executor)
            .await
    }

    /// Whether an approved absence covers `date` for `employee_id`.
    pub async fn has_absence<'e, E>(
        executor: E,
        employee_id: DbId,
        date: NaiveDate,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                 SELECT 1 FROM approved_absences \
                 WHERE employee_id = $1 AND start_date <= $2 AND end_date >= $2)",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_one(executor)
        .await
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create an assignment after re-running the conflict check inside the
    /// same transaction, serialised per (employee, date).
    pub async fn create_checked(
        pool: &PgPool,
        employee_id: DbId,
        schedule_id: Option<DbId>,
        template: &ShiftTemplate,
        date: NaiveDate,
        assigned_by: DbId,
        notes: Option<&str>,
    ) -> Result<CreateOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let outcome = Self::create_checked_in_tx(
            &mut tx,
            employee_id,
            schedule_id,
            template,
            date,
            assigned_by,
            notes,
        )
        .await?;
        match outcome {
            CreateOutcome::Created(_) => tx.commit().await?,
            _ => tx.rollback().await?,
        }
        Ok(outcome)
    }

    /// Transaction-scoped variant used by bulk generation, which manages
    /// one transaction per item.
    pub async fn create_checked_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        employee_id: DbId,
        schedule_id: Option<DbId>,
        template: &ShiftTemplate,
        date: NaiveDate,
        assigned_by: DbId,
        notes: Option<&str>,
    ) -> Result<CreateOutcome, sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(advisory_lock_key(employee_id, date))
            .execute(&mut **tx)
            .await?;

        if Self::has_absence(&mut **tx, employee_id, date).await? {
            return Ok(CreateOutcome::AbsenceConflict);
        }

        let conflicts = Self::find_conflicts(
            &mut **tx,
            employee_id,
            date,
            template.start_time,
            template.end_time,
            &[],
        )
        .await?;
        if !conflicts.is_empty() {
            return Ok(CreateOutcome::Conflicting(conflicts));
        }

        let query = format!(
            "INSERT INTO shift_assignments \
                 (employee_id, schedule_id, template_id, assignment_date, \
                  planned_start, planned_end, assigned_by, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, ShiftAssignment>(&query)
            .bind(employee_id)
            .bind(schedule_id)
            .bind(template.id)
            .bind(date)
            .bind(template.start_time)
            .bind(template.end_time)
            .bind(assigned_by)
            .bind(notes)
            .fetch_one(&mut **tx)
            .await?;

        Ok(CreateOutcome::Created(created))
    }

    // -----------------------------------------------------------------------
    // Status transitions (compare-and-swap)
    // -----------------------------------------------------------------------

    /// SCHEDULED -> CHECKED_IN. Returns `None` when the stored status no
    /// longer matches.
    pub async fn check_in(
        pool: &PgPool,
        id: DbId,
        at: Timestamp,
        location: Option<&str>,
    ) -> Result<Option<ShiftAssignment>, sqlx::Error> {
        let query = format!(
            "UPDATE shift_assignments SET \
                 status = 'CHECKED_IN', \
                 check_in_at = $2, \
                 check_in_location = $3, \
                 updated_at = NOW() \
             WHERE id = $1 AND status = 'SCHEDULED' \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        sqlx::query_as::<_, ShiftAssignment>(&query)
            .bind(id)
            .bind(at)
            .bind(location)
            .fetch_optional(pool)
            .await
    }

    /// CHECKED_IN -> COMPLETED, recording the check-out and the derived
    /// worked-minute figures in one write.
    pub async fn check_out(
        pool: &PgPool,
        id: DbId,
        at: Timestamp,
        location: Option<&str>,
        close_out: &CloseOut,
    ) -> Result<Option<ShiftAssignment>, sqlx::Error> {
        let query = format!(
            "UPDATE shift_assignments SET \
                 status = 'COMPLETED', \
                 check_out_at = $2, \
                 check_out_location = $3, \
                 worked_minutes = $4, \
                 regular_minutes = $5, \
                 overtime_minutes = $6, \
                 is_overtime = $7, \
                 updated_at = NOW() \
             WHERE id = $1 AND status = 'CHECKED_IN' \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        sqlx::query_as::<_, ShiftAssignment>(&query)
            .bind(id)
            .bind(at)
            .bind(location)
            .bind(close_out.worked_minutes)
            .bind(close_out.regular_minutes)
            .bind(close_out.overtime_minutes)
            .bind(close_out.is_overtime)
            .fetch_optional(pool)
            .await
    }

    /// Soft-cancel from the expected prior status, recording the reason.
    pub async fn cancel(
        pool: &PgPool,
        id: DbId,
        expected_status: &str,
        reason: &str,
    ) -> Result<Option<ShiftAssignment>, sqlx::Error> {
        let query = format!(
            "UPDATE shift_assignments SET \
                 status = 'CANCELLED', \
                 cancel_reason = $3, \
                 updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        sqlx::query_as::<_, ShiftAssignment>(&query)
            .bind(id)
            .bind(expected_status)
            .bind(reason)
            .fetch_optional(pool)
            .await
    }

    /// SCHEDULED -> NO_SHOW, used by the grace-deadline sweep.
    pub async fn mark_no_show(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ShiftAssignment>, sqlx::Error> {
        let query = format!(
            "UPDATE shift_assignments SET status = 'NO_SHOW', updated_at = NOW() \
             WHERE id = $1 AND status = 'SCHEDULED' \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        sqlx::query_as::<_, ShiftAssignment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Soft-cancel every non-terminal assignment of a schedule. Returns the
    /// number of assignments cancelled.
    pub async fn cancel_all_for_schedule(
        tx: &mut Transaction<'_, Postgres>,
        schedule_id: DbId,
        reason: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE shift_assignments SET \
                 status = 'CANCELLED', cancel_reason = $2, updated_at = NOW() \
             WHERE schedule_id = $1 \
               AND status IN ('SCHEDULED', 'CHECKED_IN', 'CHECKED_OUT')",
        )
        .bind(schedule_id)
        .bind(reason)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ShiftAssignment>, sqlx::Error> {
        let query = format!("SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments WHERE id = $1");
        sqlx::query_as::<_, ShiftAssignment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an employee's assignments in an inclusive date range.
    pub async fn list_for_employee(
        pool: &PgPool,
        employee_id: DbId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ShiftAssignment>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments \
             WHERE employee_id = $1 AND assignment_date BETWEEN $2 AND $3 \
             ORDER BY assignment_date, planned_start"
        );
        sqlx::query_as::<_, ShiftAssignment>(&query)
            .bind(employee_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_schedule(
        pool: &PgPool,
        schedule_id: DbId,
    ) -> Result<Vec<ShiftAssignment>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments \
             WHERE schedule_id = $1 ORDER BY assignment_date, planned_start, id"
        );
        sqlx::query_as::<_, ShiftAssignment>(&query)
            .bind(schedule_id)
            .fetch_all(pool)
            .await
    }

    pub async fn count_for_schedule(pool: &PgPool, schedule_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM shift_assignments WHERE schedule_id = $1")
            .bind(schedule_id)
            .fetch_one(pool)
            .await
    }

    /// SCHEDULED assignments whose planned end plus the grace period has
    /// passed without a check-in. `cutoff` is `now - grace` in UTC.
    pub async fn find_no_show_candidates(
        pool: &PgPool,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<ShiftAssignment>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments \
             WHERE status = 'SCHEDULED' AND (assignment_date + planned_end) < $1 \
             ORDER BY assignment_date, id"
        );
        sqlx::query_as::<_, ShiftAssignment>(&query)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// COMPLETED and NO_SHOW assignments on `date`, the detection sweep's
    /// input set.
    pub async fn list_detectable_for_date(
        pool: &PgPool,
        date: NaiveDate,
    ) -> Result<Vec<ShiftAssignment>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments \
             WHERE assignment_date = $1 AND status IN ('COMPLETED', 'NO_SHOW') \
             ORDER BY id"
        );
        sqlx::query_as::<_, ShiftAssignment>(&query)
            .bind(date)
            .fetch_all(pool)
            .await
    }

    /// COMPLETED assignments of one employee inside an inclusive date
    /// range, the payroll aggregation input.
    pub async fn list_completed_for_period(
        pool: &PgPool,
        employee_id: DbId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ShiftAssignment>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments \
             WHERE employee_id = $1 AND status = 'COMPLETED' \
               AND assignment_date BETWEEN $2 AND $3 \
             ORDER BY assignment_date, id"
        );
        sqlx::query_as::<_, ShiftAssignment>(&query)
            .bind(employee_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// Assignments of a schedule that overlap assignments belonging to
    /// other schedules (or none), re-validated at publish time.
    pub async fn find_cross_schedule_conflicts(
        pool: &PgPool,
        schedule_id: DbId,
    ) -> Result<Vec<ConflictRef>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT a.{} FROM shift_assignments a \
             JOIN shift_assignments b \
               ON a.employee_id = b.employee_id \
              AND a.assignment_date = b.assignment_date \
              AND a.id <> b.id \
              AND a.planned_start < b.planned_end \
              AND b.planned_start < a.planned_end \
             WHERE a.schedule_id = $1 \
               AND (b.schedule_id IS DISTINCT FROM $1) \
               AND a.status <> 'CANCELLED' AND b.status <> 'CANCELLED' \
             ORDER BY a.assignment_date, a.planned_start, a.id",
            CONFLICT_COLUMNS.replace(", ", ", a."),
        );
        sqlx::query_as::<_, ConflictRef>(&query)
            .bind(schedule_id)
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_key_is_stable_and_distinguishes_inputs() {
        let d1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(advisory_lock_key(7, d1), advisory_lock_key(7, d1));
        assert_ne!(advisory_lock_key(7, d1), advisory_lock_key(7, d2));
        assert_ne!(advisory_lock_key(7, d1), advisory_lock_key(8, d1));
    }
}
