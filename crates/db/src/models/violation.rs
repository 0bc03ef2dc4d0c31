//! Attendance violation models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use staffhub_core::types::{DbId, Timestamp};

/// A row from the `attendance_violations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceViolation {
    pub id: DbId,
    pub assignment_id: DbId,
    pub employee_id: DbId,
    pub violation_type: String,
    pub violation_date: NaiveDate,
    pub severity: String,
    pub deviation_minutes: i64,
    pub status: String,
    pub detected_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub resolved_by: Option<DbId>,
    pub resolution_notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO used by the detector when persisting a rule hit.
#[derive(Debug, Clone)]
pub struct CreateViolation {
    pub assignment_id: DbId,
    pub employee_id: DbId,
    pub violation_type: String,
    pub violation_date: NaiveDate,
    pub severity: String,
    pub deviation_minutes: i64,
}

/// Request body for resolving a violation manually.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveViolationRequest {
    pub notes: Option<String>,
}

/// Request body for escalating a violation; notes are mandatory.
#[derive(Debug, Clone, Deserialize)]
pub struct EscalateViolationRequest {
    pub notes: String,
}

/// Summary returned by the detection sweep: rule hits per violation type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionSummary {
    pub assignments_scanned: usize,
    pub late: usize,
    pub early_leave: usize,
    pub absent: usize,
    pub skipped_existing: usize,
    pub failed: usize,
}

/// A violation row joined with the status of its latest explanation, used
/// by the payroll deduction query.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ViolationWithExplanation {
    pub id: DbId,
    pub violation_type: String,
    pub status: String,
    pub deviation_minutes: i64,
    pub latest_explanation_status: Option<String>,
}
