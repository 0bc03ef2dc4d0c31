//! Handlers for payroll calculation, lifecycle, and statistics.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use staffhub_core::audit::action_types;
use staffhub_core::error::CoreError;
use staffhub_core::payroll::Period;
use staffhub_core::permissions::Capability;
use staffhub_core::types::DbId;
use staffhub_db::models::payroll::{
    BulkApproveRequest, BulkCalcOutcome, CancelPayrollRequest, Payroll,
};
use staffhub_db::repositories::{CalcOutcome, EmployeeRepo, PayrollRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::identity::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub year: i32,
    pub month: u32,
}

impl PeriodQuery {
    fn period(&self) -> Result<Period, AppError> {
        Period::new(self.year, self.month).map_err(AppError::Core)
    }
}

async fn fetch_payroll(state: &AppState, id: DbId) -> Result<Payroll, AppError> {
    PayrollRepo::find_by_id(&state.pool, id).await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "Payroll",
            id,
        })
    })
}

fn map_calc_outcome(outcome: CalcOutcome, user_id: DbId) -> Result<Payroll, AppError> {
    match outcome {
        CalcOutcome::Calculated(payroll) => Ok(payroll),
        CalcOutcome::Busy => Err(AppError::Core(CoreError::Conflict(format!(
            "A calculation for user {user_id} in this period is already running"
        )))),
        CalcOutcome::NotRecalculable(status) => {
            Err(AppError::Core(CoreError::InvalidTransition(format!(
                "Payroll is {status}; reset it before recalculating"
            ))))
        }
        CalcOutcome::MissingRate => Err(AppError::Core(CoreError::Validation(format!(
            "No pay rate on file for user {user_id} in this period"
        )))),
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub user_id: DbId,
    pub year: i32,
    pub month: u32,
}

/// POST /api/v1/payrolls/calculate
///
/// Calculate or recalculate one employee's payroll for a period. The same
/// entry point serves both; recalculation replaces derived fields while
/// preserving the record's identity.
pub async fn calculate(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CalculateRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManagePayroll)?;
    let period = Period::new(input.year, input.month)?;

    EmployeeRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Employee",
            id: input.user_id,
        })?;

    let outcome = PayrollRepo::calculate(&state.pool, input.user_id, period).await?;
    let payroll = map_calc_outcome(outcome, input.user_id)?;

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::PAYROLL_CALCULATE,
        "payroll",
        payroll.id,
        Some(json!({
            "user_id": input.user_id,
            "year": input.year,
            "month": input.month,
        })),
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        payroll_id = payroll.id,
        employee_id = input.user_id,
        "Payroll calculated"
    );
    Ok(Json(DataResponse { data: payroll }))
}

/// POST /api/v1/payrolls/bulk-calculate
///
/// Iterates every active employee for a period; one employee's failure is
/// reported in the outcome list, never aborts the batch.
pub async fn bulk_calculate(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<PeriodQuery>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManagePayroll)?;
    let period = input.period()?;

    let employees = EmployeeRepo::list_active(&state.pool).await?;
    let mut outcomes = Vec::with_capacity(employees.len());
    for employee in &employees {
        match PayrollRepo::calculate(&state.pool, employee.id, period).await {
            Ok(outcome) => match map_calc_outcome(outcome, employee.id) {
                Ok(payroll) => outcomes.push(BulkCalcOutcome {
                    user_id: employee.id,
                    succeeded: true,
                    payroll_id: Some(payroll.id),
                    error_code: None,
                    error: None,
                }),
                Err(err) => {
                    let code = match &err {
                        AppError::Core(CoreError::Conflict(_)) => "CONFLICT",
                        AppError::Core(CoreError::InvalidTransition(_)) => "INVALID_STATE",
                        AppError::Core(CoreError::Validation(_)) => "VALIDATION_ERROR",
                        _ => "INTERNAL_ERROR",
                    };
                    outcomes.push(BulkCalcOutcome {
                        user_id: employee.id,
                        succeeded: false,
                        payroll_id: None,
                        error_code: Some(code.to_string()),
                        error: Some(err.to_string()),
                    });
                }
            },
            Err(err) => {
                tracing::error!(employee_id = employee.id, error = %err, "Bulk payroll item failed");
                outcomes.push(BulkCalcOutcome {
                    user_id: employee.id,
                    succeeded: false,
                    payroll_id: None,
                    error_code: Some("INTERNAL_ERROR".to_string()),
                    error: Some(err.to_string()),
                });
            }
        }
    }

    let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
    tracing::info!(
        user_id = auth.user_id,
        total = outcomes.len(),
        succeeded,
        "Bulk payroll calculation finished"
    );
    Ok(Json(DataResponse { data: outcomes }))
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// GET /api/v1/payrolls/{id}
pub async fn get_payroll(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = fetch_payroll(&state, id).await?;
    auth.require_self_or(found.user_id, Capability::ViewPayrollReports)?;
    Ok(Json(DataResponse { data: found }))
}

#[derive(Debug, Deserialize)]
pub struct ListPayrollsQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub user_id: Option<DbId>,
}

/// GET /api/v1/payrolls
pub async fn list_payrolls(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListPayrollsQuery>,
) -> AppResult<impl IntoResponse> {
    let payrolls = match (query.user_id, query.year, query.month) {
        (Some(user_id), _, _) => {
            auth.require_self_or(user_id, Capability::ViewPayrollReports)?;
            PayrollRepo::list_for_user(&state.pool, user_id).await?
        }
        (None, Some(year), Some(month)) => {
            auth.require(Capability::ViewPayrollReports)?;
            let period = Period::new(year, month)?;
            PayrollRepo::list_for_period(&state.pool, period).await?
        }
        _ => {
            return Err(AppError::Core(CoreError::Validation(
                "Provide user_id, or year and month".into(),
            )))
        }
    };
    Ok(Json(DataResponse { data: payrolls }))
}

/// GET /api/v1/payrolls/{id}/validate
///
/// Re-derives the expected totals from source assignments and violations
/// and reports a match flag plus a field diff.
pub async fn validate_payroll(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManagePayroll)?;

    let validation = PayrollRepo::validate(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Payroll",
            id,
        })?;
    Ok(Json(DataResponse { data: validation }))
}

// ---------------------------------------------------------------------------
// Lifecycle transitions
// ---------------------------------------------------------------------------

/// POST /api/v1/payrolls/{id}/approve
pub async fn approve_payroll(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManagePayroll)?;

    let existing = fetch_payroll(&state, id).await?;
    let approved = PayrollRepo::approve(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::InvalidTransition(format!(
                "Payroll is {} and cannot be approved",
                existing.status
            )))
        })?;

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::PAYROLL_APPROVE,
        "payroll",
        id,
        None,
    )
    .await?;

    tracing::info!(user_id = auth.user_id, payroll_id = id, "Payroll approved");
    Ok(Json(DataResponse { data: approved }))
}

/// POST /api/v1/payrolls/bulk-approve
pub async fn bulk_approve(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<BulkApproveRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManagePayroll)?;

    let mut outcomes = Vec::with_capacity(input.payroll_ids.len());
    for &payroll_id in &input.payroll_ids {
        match PayrollRepo::approve(&state.pool, payroll_id, auth.user_id).await {
            Ok(Some(payroll)) => {
                record_audit(
                    &state.pool,
                    Some(auth.user_id),
                    action_types::PAYROLL_APPROVE,
                    "payroll",
                    payroll_id,
                    None,
                )
                .await?;
                outcomes.push(BulkCalcOutcome {
                    user_id: payroll.user_id,
                    succeeded: true,
                    payroll_id: Some(payroll_id),
                    error_code: None,
                    error: None,
                });
            }
            Ok(None) => outcomes.push(BulkCalcOutcome {
                user_id: 0,
                succeeded: false,
                payroll_id: Some(payroll_id),
                error_code: Some("INVALID_STATE".to_string()),
                error: Some(format!("Payroll {payroll_id} is not CALCULATED")),
            }),
            Err(err) => {
                tracing::error!(payroll_id, error = %err, "Bulk approve item failed");
                outcomes.push(BulkCalcOutcome {
                    user_id: 0,
                    succeeded: false,
                    payroll_id: Some(payroll_id),
                    error_code: Some("INTERNAL_ERROR".to_string()),
                    error: Some(err.to_string()),
                });
            }
        }
    }

    Ok(Json(DataResponse { data: outcomes }))
}

/// POST /api/v1/payrolls/{id}/pay
pub async fn mark_paid(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManagePayroll)?;

    let existing = fetch_payroll(&state, id).await?;
    let paid = PayrollRepo::mark_paid(&state.pool, id).await?.ok_or_else(|| {
        AppError::Core(CoreError::InvalidTransition(format!(
            "Payroll is {} and cannot be marked paid",
            existing.status
        )))
    })?;

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::PAYROLL_PAID,
        "payroll",
        id,
        None,
    )
    .await?;

    tracing::info!(user_id = auth.user_id, payroll_id = id, "Payroll marked paid");
    Ok(Json(DataResponse { data: paid }))
}

/// POST /api/v1/payrolls/{id}/cancel
pub async fn cancel_payroll(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CancelPayrollRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ManagePayroll)?;
    if input.reason.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "A cancellation reason is required".into(),
        )));
    }

    let existing = fetch_payroll(&state, id).await?;
    let cancelled = PayrollRepo::cancel(&state.pool, id, &input.reason)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::InvalidTransition(format!(
                "Payroll is {} and cannot be cancelled",
                existing.status
            )))
        })?;

    record_audit(
        &state.pool,
        Some(auth.user_id),
        action_types::PAYROLL_CANCEL,
        "payroll",
        id,
        Some(json!({ "reason": input.reason })),
    )
    .await?;

    tracing::info!(user_id = auth.user_id, payroll_id = id, "Payroll cancelled");
    Ok(Json(DataResponse { data: cancelled }))
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// GET /api/v1/payroll-stats/period
pub async fn period_statistics(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ViewPayrollReports)?;
    let stats = PayrollRepo::period_statistics(&state.pool, query.period()?).await?;
    Ok(Json(DataResponse { data: stats }))
}

/// GET /api/v1/payroll-stats/departments
pub async fn department_summary(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ViewPayrollReports)?;
    let summary = PayrollRepo::department_summary(&state.pool, query.period()?).await?;
    Ok(Json(DataResponse { data: summary }))
}

#[derive(Debug, Deserialize)]
pub struct TopEarnersQuery {
    pub year: i32,
    pub month: u32,
    pub limit: Option<i64>,
}

/// GET /api/v1/payroll-stats/top-earners
pub async fn top_earners(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<TopEarnersQuery>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ViewPayrollReports)?;
    let period = Period::new(query.year, query.month)?;
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let earners = PayrollRepo::top_earners(&state.pool, period, limit).await?;
    Ok(Json(DataResponse { data: earners }))
}

#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    pub months: Option<i64>,
}

/// GET /api/v1/payroll-stats/trends
pub async fn monthly_trends(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<TrendsQuery>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ViewPayrollReports)?;
    let months = query.months.unwrap_or(12).clamp(1, 60);
    let trends = PayrollRepo::monthly_trends(&state.pool, months).await?;
    Ok(Json(DataResponse { data: trends }))
}

/// GET /api/v1/payroll-stats/comparison
///
/// Each employee's net pay beside the preceding period's.
pub async fn comparison(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<impl IntoResponse> {
    auth.require(Capability::ViewPayrollReports)?;
    let rows = PayrollRepo::comparison(&state.pool, query.period()?).await?;
    Ok(Json(DataResponse { data: rows }))
}

#[derive(Debug, Deserialize)]
pub struct YearlySummaryQuery {
    pub user_id: DbId,
    pub year: i32,
}

/// GET /api/v1/payroll-stats/yearly-summary
pub async fn yearly_summary(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<YearlySummaryQuery>,
) -> AppResult<impl IntoResponse> {
    auth.require_self_or(query.user_id, Capability::ViewPayrollReports)?;
    let rows = PayrollRepo::yearly_summary(&state.pool, query.user_id, query.year).await?;
    Ok(Json(DataResponse { data: rows }))
}
