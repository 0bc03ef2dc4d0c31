//! Shift template models.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use staffhub_core::types::{DbId, Timestamp};

/// A row from the `shift_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShiftTemplate {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub has_break: bool,
    pub break_minutes: Option<i32>,
    pub overtime_eligible: bool,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ShiftTemplate {
    /// Planned working minutes, net of the break.
    pub fn regular_minutes(&self) -> i64 {
        staffhub_core::template::regular_minutes(
            self.start_time,
            self.end_time,
            self.has_break,
            self.break_minutes,
        )
    }
}

/// DTO for creating a template.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShiftTemplate {
    pub name: String,
    pub description: Option<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub has_break: bool,
    pub break_minutes: Option<i32>,
    #[serde(default)]
    pub overtime_eligible: bool,
    pub sort_order: Option<i32>,
}

/// DTO for updating a template. Omitted fields are left unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateShiftTemplate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub has_break: Option<bool>,
    pub break_minutes: Option<i32>,
    pub overtime_eligible: Option<bool>,
    pub sort_order: Option<i32>,
}
