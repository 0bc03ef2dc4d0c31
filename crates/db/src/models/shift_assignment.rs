//! Shift assignment models.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use staffhub_core::types::{DbId, Timestamp};

/// A row from the `shift_assignments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShiftAssignment {
    pub id: DbId,
    pub employee_id: DbId,
    pub schedule_id: Option<DbId>,
    pub template_id: DbId,
    pub assignment_date: NaiveDate,
    pub planned_start: NaiveTime,
    pub planned_end: NaiveTime,
    pub status: String,
    pub check_in_at: Option<Timestamp>,
    pub check_in_location: Option<String>,
    pub check_out_at: Option<Timestamp>,
    pub check_out_location: Option<String>,
    pub worked_minutes: Option<i64>,
    pub regular_minutes: Option<i64>,
    pub overtime_minutes: Option<i64>,
    pub is_overtime: bool,
    pub assigned_by: DbId,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a single assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShiftAssignment {
    pub employee_id: DbId,
    pub template_id: DbId,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

/// Request body for bulk creation; items are validated independently.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkCreateRequest {
    pub items: Vec<CreateShiftAssignment>,
}

/// Request body for check-in / check-out.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckRequest {
    pub location: Option<String>,
}

/// Request body for cancellation; a reason is mandatory.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

/// A reference to a conflicting assignment, returned by the conflict check.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConflictRef {
    pub id: DbId,
    pub assignment_date: NaiveDate,
    pub planned_start: NaiveTime,
    pub planned_end: NaiveTime,
    pub status: String,
}

/// Outcome of the conflict check for a proposed window.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictReport {
    pub has_conflict: bool,
    pub conflicts: Vec<ConflictRef>,
    /// True when an approved absence covers the whole day.
    pub absence_conflict: bool,
}

/// Per-item outcome of a bulk create.
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemOutcome {
    pub index: usize,
    pub succeeded: bool,
    pub assignment_id: Option<DbId>,
    pub error_code: Option<String>,
    pub error: Option<String>,
}
