//! Shift schedule models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use staffhub_core::types::{DbId, Timestamp};

/// A row from the `shift_schedules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShiftSchedule {
    pub id: DbId,
    pub name: String,
    pub schedule_type: String,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_by: DbId,
    pub published_at: Option<Timestamp>,
    pub cancel_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a schedule (always lands in DRAFT).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShiftSchedule {
    pub name: String,
    pub schedule_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// DTO for editing a DRAFT schedule.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateShiftSchedule {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// One rule of the template-to-weekday mapping used by the bulk generators.
#[derive(Debug, Clone, Deserialize)]
pub struct WeekdayRuleInput {
    pub employee_id: DbId,
    pub template_id: DbId,
    /// Weekday name, `monday` through `sunday`.
    pub weekday: String,
}

/// Request body for `generateWeekly` / `generateMonthly`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateScheduleRequest {
    pub name: String,
    /// Any day inside the target week (the week starts here) or month.
    pub start_date: NaiveDate,
    pub rules: Vec<WeekdayRuleInput>,
}

/// Request body for `copySchedule`.
#[derive(Debug, Clone, Deserialize)]
pub struct CopyScheduleRequest {
    pub name: String,
    pub new_start_date: NaiveDate,
}
