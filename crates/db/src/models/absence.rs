//! Approved absence rows, fed by the absence/leave collaborator.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use staffhub_core::types::{DbId, Timestamp};

/// A row from the `approved_absences` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApprovedAbsence {
    pub id: DbId,
    pub employee_id: DbId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub absence_type: String,
    pub created_at: Timestamp,
}
