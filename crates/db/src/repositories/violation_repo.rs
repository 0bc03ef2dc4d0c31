//! Repository for the `attendance_violations` table.
//!
//! Detection idempotence rests on the `uq_violation_assignment_rule`
//! constraint: inserting an already-detected (assignment, rule) pair is a
//! no-op, so sweeps can re-run freely.

use chrono::NaiveDate;
use sqlx::PgPool;
use staffhub_core::types::{DbId, Timestamp};

use crate::models::violation::{AttendanceViolation, CreateViolation, ViolationWithExplanation};

const VIOLATION_COLUMNS: &str = "\
    id, assignment_id, employee_id, violation_type, violation_date, severity, \
    deviation_minutes, status, detected_at, resolved_at, resolved_by, \
    resolution_notes, created_at, updated_at";

pub struct ViolationRepo;

impl ViolationRepo {
    /// Insert a detected violation unless the (assignment, rule) pair
    /// already exists. Returns `None` when detection had already recorded
    /// this rule hit.
    pub async fn create_if_absent(
        pool: &PgPool,
        input: &CreateViolation,
    ) -> Result<Option<AttendanceViolation>, sqlx::Error> {
        let query = format!(
            "INSERT INTO attendance_violations \
                 (assignment_id, employee_id, violation_type, violation_date, \
                  severity, deviation_minutes) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (assignment_id, violation_type) DO NOTHING \
             RETURNING {VIOLATION_COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceViolation>(&query)
            .bind(input.assignment_id)
            .bind(input.employee_id)
            .bind(&input.violation_type)
            .bind(input.violation_date)
            .bind(&input.severity)
            .bind(input.deviation_minutes)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AttendanceViolation>, sqlx::Error> {
        let query = format!("SELECT {VIOLATION_COLUMNS} FROM attendance_violations WHERE id = $1");
        sqlx::query_as::<_, AttendanceViolation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_employee(
        pool: &PgPool,
        employee_id: DbId,
    ) -> Result<Vec<AttendanceViolation>, sqlx::Error> {
        let query = format!(
            "SELECT {VIOLATION_COLUMNS} FROM attendance_violations \
             WHERE employee_id = $1 ORDER BY violation_date DESC, id"
        );
        sqlx::query_as::<_, AttendanceViolation>(&query)
            .bind(employee_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_by_status(
        pool: &PgPool,
        status: &str,
    ) -> Result<Vec<AttendanceViolation>, sqlx::Error> {
        let query = format!(
            "SELECT {VIOLATION_COLUMNS} FROM attendance_violations \
             WHERE status = $1 ORDER BY violation_date DESC, id"
        );
        sqlx::query_as::<_, AttendanceViolation>(&query)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// CAS status update guarded on the expected prior status.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        expected_status: &str,
        new_status: &str,
    ) -> Result<Option<AttendanceViolation>, sqlx::Error> {
        let query = format!(
            "UPDATE attendance_violations SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {VIOLATION_COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceViolation>(&query)
            .bind(id)
            .bind(expected_status)
            .bind(new_status)
            .fetch_optional(pool)
            .await
    }

    /// Resolve a violation, recording the reviewer and notes.
    pub async fn resolve(
        pool: &PgPool,
        id: DbId,
        expected_status: &str,
        resolved_by: DbId,
        notes: Option<&str>,
    ) -> Result<Option<AttendanceViolation>, sqlx::Error> {
        let query = format!(
            "UPDATE attendance_violations SET \
                 status = 'RESOLVED', \
                 resolved_at = NOW(), \
                 resolved_by = $3, \
                 resolution_notes = $4, \
                 updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {VIOLATION_COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceViolation>(&query)
            .bind(id)
            .bind(expected_status)
            .bind(resolved_by)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    /// Escalate a violation, recording the reviewer's notes.
    pub async fn escalate(
        pool: &PgPool,
        id: DbId,
        expected_status: &str,
        resolved_by: DbId,
        notes: &str,
    ) -> Result<Option<AttendanceViolation>, sqlx::Error> {
        let query = format!(
            "UPDATE attendance_violations SET \
                 status = 'ESCALATED', \
                 resolved_by = $3, \
                 resolution_notes = $4, \
                 updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {VIOLATION_COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceViolation>(&query)
            .bind(id)
            .bind(expected_status)
            .bind(resolved_by)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    /// Violations detected before `cutoff` that still have no explanation
    /// at all: the review-SLA overdue list.
    pub async fn find_overdue(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<AttendanceViolation>, sqlx::Error> {
        let query = format!(
            "SELECT {VIOLATION_COLUMNS} FROM attendance_violations v \
             WHERE v.status IN ('OPEN', 'PENDING_EXPLANATION') \
               AND v.detected_at < $1 \
               AND NOT EXISTS \
                   (SELECT 1 FROM violation_explanations e WHERE e.violation_id = v.id) \
             ORDER BY v.detected_at, v.id"
        );
        sqlx::query_as::<_, AttendanceViolation>(&query)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// An employee's violations in an inclusive date range, each joined
    /// with its latest explanation's status: the payroll deduction input.
    pub async fn list_with_latest_explanation(
        pool: &PgPool,
        employee_id: DbId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ViolationWithExplanation>, sqlx::Error> {
        sqlx::query_as::<_, ViolationWithExplanation>(
            "SELECT v.id, v.violation_type, v.status, v.deviation_minutes, \
                    e.status AS latest_explanation_status \
             FROM attendance_violations v \
             LEFT JOIN LATERAL ( \
                 SELECT status FROM violation_explanations \
                 WHERE violation_id = v.id \
                 ORDER BY submitted_at DESC, id DESC LIMIT 1) e ON TRUE \
             WHERE v.employee_id = $1 AND v.violation_date BETWEEN $2 AND $3 \
             ORDER BY v.violation_date, v.id",
        )
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }
}
