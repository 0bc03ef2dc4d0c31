//! Payroll, pay rate, and payroll statistics models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use staffhub_core::types::{DbId, Timestamp};

/// A row from the `payrolls` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payroll {
    pub id: DbId,
    pub user_id: DbId,
    pub payroll_year: i32,
    pub payroll_month: i32,
    pub status: String,
    pub regular_minutes: i64,
    pub overtime_minutes: i64,
    pub deduction_minutes: i64,
    pub gross_pay: Decimal,
    pub net_pay: Decimal,
    pub calculated_at: Option<Timestamp>,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub paid_at: Option<Timestamp>,
    pub cancel_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `pay_rates` table, fed by the HR-profile collaborator.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PayRateRow {
    pub id: DbId,
    pub employee_id: DbId,
    pub hourly_rate: Decimal,
    pub overtime_multiplier: Decimal,
    pub effective_from: NaiveDate,
    pub created_at: Timestamp,
}

/// Request body for cancelling a payroll.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelPayrollRequest {
    pub reason: String,
}

/// Request body for bulk approval.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkApproveRequest {
    pub payroll_ids: Vec<DbId>,
}

/// Per-employee outcome of a bulk calculation run.
#[derive(Debug, Clone, Serialize)]
pub struct BulkCalcOutcome {
    pub user_id: DbId,
    pub succeeded: bool,
    pub payroll_id: Option<DbId>,
    pub error_code: Option<String>,
    pub error: Option<String>,
}

/// Result of re-deriving a payroll's totals from source data.
#[derive(Debug, Clone, Serialize)]
pub struct PayrollValidation {
    pub payroll_id: DbId,
    pub matches: bool,
    /// Field-level differences, empty when `matches` is true.
    pub diffs: Vec<PayrollFieldDiff>,
}

/// One differing field found by validation.
#[derive(Debug, Clone, Serialize)]
pub struct PayrollFieldDiff {
    pub field: &'static str,
    pub stored: String,
    pub expected: String,
}

// ---------------------------------------------------------------------------
// Statistics rows
// ---------------------------------------------------------------------------

/// Aggregate figures for one period.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PeriodStatistics {
    pub payroll_count: i64,
    pub total_gross: Decimal,
    pub total_net: Decimal,
    pub total_regular_minutes: i64,
    pub total_overtime_minutes: i64,
    pub total_deduction_minutes: i64,
}

/// Aggregate figures for one department in one period.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DepartmentSummary {
    pub department: String,
    pub payroll_count: i64,
    pub total_net: Decimal,
    pub average_net: Decimal,
}

/// One employee's net pay, for the top-earners listing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TopEarner {
    pub user_id: DbId,
    pub display_name: String,
    pub net_pay: Decimal,
}

/// One month's totals, for the trends query.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MonthlyTrend {
    pub payroll_year: i32,
    pub payroll_month: i32,
    pub payroll_count: i64,
    pub total_net: Decimal,
}

/// Current-versus-previous period comparison for one employee.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PayrollComparison {
    pub user_id: DbId,
    pub current_net: Decimal,
    pub previous_net: Option<Decimal>,
}

/// One row of an employee's yearly summary.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct YearlySummaryRow {
    pub payroll_month: i32,
    pub status: String,
    pub regular_minutes: i64,
    pub overtime_minutes: i64,
    pub net_pay: Decimal,
}
