//! Repository for the `payrolls` table.
//!
//! Calculation reads a consistent snapshot of assignments and violations
//! and writes one row, all inside a transaction holding a try-style
//! advisory lock on (user, period): a concurrent calculation for the same
//! key is rejected, never interleaved.

use rust_decimal::Decimal;
use sqlx::PgPool;
use staffhub_core::explanation::ExplanationStatus;
use staffhub_core::payroll::{
    self, MinuteTotals, PayRate, Period, ViolationCharge,
};
use staffhub_core::types::DbId;
use staffhub_core::violation::ViolationStatus;

use crate::models::payroll::{
    DepartmentSummary, MonthlyTrend, Payroll, PayrollComparison, PayrollFieldDiff,
    PayrollValidation, PeriodStatistics, TopEarner, YearlySummaryRow,
};

const PAYROLL_COLUMNS: &str = "\
    id, user_id, payroll_year, payroll_month, status, regular_minutes, \
    overtime_minutes, deduction_minutes, gross_pay, net_pay, calculated_at, \
    approved_by, approved_at, paid_at, cancel_reason, created_at, updated_at";

/// Outcome of a calculation run.
#[derive(Debug)]
pub enum CalcOutcome {
    Calculated(Payroll),
    /// Another calculation currently holds the (user, period) lock.
    Busy,
    /// The stored payroll is APPROVED or PAID; an explicit reset is needed.
    NotRecalculable(String),
    /// No pay rate row covers this employee and period.
    MissingRate,
}

/// Advisory lock key for one (user, period) pair.
fn period_lock_key(user_id: DbId, period: Period) -> i64 {
    (user_id << 16) ^ i64::from(period.year * 100 + period.month as i32)
}

pub struct PayrollRepo;

impl PayrollRepo {
    // -----------------------------------------------------------------------
    // Calculation
    // -----------------------------------------------------------------------

    /// Calculate (or recalculate) one employee's payroll for a period.
    ///
    /// Upserts on (user, period), preserving the row's identity across
    /// recalculations; derived fields are replaced and status becomes
    /// CALCULATED.
    pub async fn calculate(
        pool: &PgPool,
        user_id: DbId,
        period: Period,
    ) -> Result<CalcOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
            .bind(period_lock_key(user_id, period))
            .fetch_one(&mut *tx)
            .await?;
        if !locked {
            tx.rollback().await?;
            return Ok(CalcOutcome::Busy);
        }

        // Recalculation is only allowed while the record is a working copy.
        // Cancellation is the explicit reset that reopens an APPROVED record.
        let existing_status: Option<String> = sqlx::query_scalar(
            "SELECT status FROM payrolls \
             WHERE user_id = $1 AND payroll_year = $2 AND payroll_month = $3",
        )
        .bind(user_id)
        .bind(period.year)
        .bind(period.month as i32)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(status) = existing_status {
            let recalculable = staffhub_core::payroll::PayrollStatus::parse(&status)
                .map(|s| s.is_recalculable() || s == staffhub_core::payroll::PayrollStatus::Cancelled)
                .unwrap_or(false);
            if !recalculable {
                tx.rollback().await?;
                return Ok(CalcOutcome::NotRecalculable(status));
            }
        }

        let (from, to) = (period.first_day(), period.last_day());

        // Minute totals over COMPLETED assignments in the period.
        let (regular, overtime): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(regular_minutes), 0)::BIGINT, \
                    COALESCE(SUM(overtime_minutes), 0)::BIGINT \
             FROM shift_assignments \
             WHERE employee_id = $1 AND status = 'COMPLETED' \
               AND assignment_date BETWEEN $2 AND $3",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_one(&mut *tx)
        .await?;
        let totals = MinuteTotals { regular, overtime };

        // Deduction charges from the period's violations, each joined with
        // its latest explanation.
        let charges: Vec<(String, Option<String>, i64)> = sqlx::query_as(
            "SELECT v.status, e.status, v.deviation_minutes \
             FROM attendance_violations v \
             LEFT JOIN LATERAL ( \
                 SELECT status FROM violation_explanations \
                 WHERE violation_id = v.id \
                 ORDER BY submitted_at DESC, id DESC LIMIT 1) e ON TRUE \
             WHERE v.employee_id = $1 AND v.violation_date BETWEEN $2 AND $3",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&mut *tx)
        .await?;
        let charges: Vec<ViolationCharge> = charges
            .iter()
            .map(|(status, latest, deviation)| ViolationCharge {
                status: ViolationStatus::parse(status).unwrap_or(ViolationStatus::Open),
                latest_explanation: latest.as_deref().and_then(ExplanationStatus::parse),
                deviation_minutes: *deviation,
            })
            .collect();
        let deduction = payroll::deduction_minutes(&charges);

        // The employee's pay rate effective for this period.
        let rate: Option<(Decimal, Decimal)> = sqlx::query_as(
            "SELECT hourly_rate, overtime_multiplier FROM pay_rates \
             WHERE employee_id = $1 AND effective_from <= $2 \
             ORDER BY effective_from DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(to)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((hourly_rate, overtime_multiplier)) = rate else {
            tx.rollback().await?;
            return Ok(CalcOutcome::MissingRate);
        };

        let pay = payroll::compute_pay(
            totals,
            deduction,
            PayRate {
                hourly_rate,
                overtime_multiplier,
            },
        );

        let query = format!(
            "INSERT INTO payrolls \
                 (user_id, payroll_year, payroll_month, status, regular_minutes, \
                  overtime_minutes, deduction_minutes, gross_pay, net_pay, calculated_at) \
             VALUES ($1, $2, $3, 'CALCULATED', $4, $5, $6, $7, $8, NOW()) \
             ON CONFLICT (user_id, payroll_year, payroll_month) DO UPDATE SET \
                 status = 'CALCULATED', \
                 regular_minutes = EXCLUDED.regular_minutes, \
                 overtime_minutes = EXCLUDED.overtime_minutes, \
                 deduction_minutes = EXCLUDED.deduction_minutes, \
                 gross_pay = EXCLUDED.gross_pay, \
                 net_pay = EXCLUDED.net_pay, \
                 calculated_at = NOW(), \
                 approved_by = NULL, \
                 approved_at = NULL, \
                 cancel_reason = NULL, \
                 updated_at = NOW() \
             RETURNING {PAYROLL_COLUMNS}"
        );
        let payroll = sqlx::query_as::<_, Payroll>(&query)
            .bind(user_id)
            .bind(period.year)
            .bind(period.month as i32)
            .bind(totals.regular)
            .bind(totals.overtime)
            .bind(deduction)
            .bind(pay.gross_pay)
            .bind(pay.net_pay)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(CalcOutcome::Calculated(payroll))
    }

    /// Re-derive a payroll's totals from source data and report the diff.
    pub async fn validate(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PayrollValidation>, sqlx::Error> {
        let Some(stored) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let period = Period {
            year: stored.payroll_year,
            month: stored.payroll_month as u32,
        };
        let (from, to) = (period.first_day(), period.last_day());

        let (regular, overtime): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(regular_minutes), 0)::BIGINT, \
                    COALESCE(SUM(overtime_minutes), 0)::BIGINT \
             FROM shift_assignments \
             WHERE employee_id = $1 AND status = 'COMPLETED' \
               AND assignment_date BETWEEN $2 AND $3",
        )
        .bind(stored.user_id)
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await?;
        let totals = MinuteTotals { regular, overtime };

        let charges: Vec<(String, Option<String>, i64)> = sqlx::query_as(
            "SELECT v.status, e.status, v.deviation_minutes \
             FROM attendance_violations v \
             LEFT JOIN LATERAL ( \
                 SELECT status FROM violation_explanations \
                 WHERE violation_id = v.id \
                 ORDER BY submitted_at DESC, id DESC LIMIT 1) e ON TRUE \
             WHERE v.employee_id = $1 AND v.violation_date BETWEEN $2 AND $3",
        )
        .bind(stored.user_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;
        let charges: Vec<ViolationCharge> = charges
            .iter()
            .map(|(status, latest, deviation)| ViolationCharge {
                status: ViolationStatus::parse(status).unwrap_or(ViolationStatus::Open),
                latest_explanation: latest.as_deref().and_then(ExplanationStatus::parse),
                deviation_minutes: *deviation,
            })
            .collect();
        let deduction = payroll::deduction_minutes(&charges);

        let rate: Option<(Decimal, Decimal)> = sqlx::query_as(
            "SELECT hourly_rate, overtime_multiplier FROM pay_rates \
             WHERE employee_id = $1 AND effective_from <= $2 \
             ORDER BY effective_from DESC, id DESC LIMIT 1",
        )
        .bind(stored.user_id)
        .bind(to)
        .fetch_optional(pool)
        .await?;

        let mut diffs = Vec::new();
        let mut diff = |field: &'static str, stored_val: String, expected: String| {
            if stored_val != expected {
                diffs.push(PayrollFieldDiff {
                    field,
                    stored: stored_val,
                    expected,
                });
            }
        };

        diff(
            "regular_minutes",
            stored.regular_minutes.to_string(),
            totals.regular.to_string(),
        );
        diff(
            "overtime_minutes",
            stored.overtime_minutes.to_string(),
            totals.overtime.to_string(),
        );
        diff(
            "deduction_minutes",
            stored.deduction_minutes.to_string(),
            deduction.to_string(),
        );
        if let Some((hourly_rate, overtime_multiplier)) = rate {
            let pay = payroll::compute_pay(
                totals,
                deduction,
                PayRate {
                    hourly_rate,
                    overtime_multiplier,
                },
            );
            diff(
                "gross_pay",
                stored.gross_pay.to_string(),
                pay.gross_pay.to_string(),
            );
            diff("net_pay", stored.net_pay.to_string(), pay.net_pay.to_string());
        }

        Ok(Some(PayrollValidation {
            payroll_id: stored.id,
            matches: diffs.is_empty(),
            diffs,
        }))
    }

    // -----------------------------------------------------------------------
    // Status transitions (compare-and-swap)
    // -----------------------------------------------------------------------

    /// CALCULATED -> APPROVED, recording the approver.
    pub async fn approve(
        pool: &PgPool,
        id: DbId,
        approved_by: DbId,
    ) -> Result<Option<Payroll>, sqlx::Error> {
        let query = format!(
            "UPDATE payrolls SET \
                 status = 'APPROVED', approved_by = $2, approved_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'CALCULATED' \
             RETURNING {PAYROLL_COLUMNS}"
        );
        sqlx::query_as::<_, Payroll>(&query)
            .bind(id)
            .bind(approved_by)
            .fetch_optional(pool)
            .await
    }

    /// APPROVED -> PAID.
    pub async fn mark_paid(pool: &PgPool, id: DbId) -> Result<Option<Payroll>, sqlx::Error> {
        let query = format!(
            "UPDATE payrolls SET status = 'PAID', paid_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'APPROVED' \
             RETURNING {PAYROLL_COLUMNS}"
        );
        sqlx::query_as::<_, Payroll>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Any non-PAID state -> CANCELLED.
    pub async fn cancel(
        pool: &PgPool,
        id: DbId,
        reason: &str,
    ) -> Result<Option<Payroll>, sqlx::Error> {
        let query = format!(
            "UPDATE payrolls SET \
                 status = 'CANCELLED', cancel_reason = $2, updated_at = NOW() \
             WHERE id = $1 AND status NOT IN ('PAID', 'CANCELLED') \
             RETURNING {PAYROLL_COLUMNS}"
        );
        sqlx::query_as::<_, Payroll>(&query)
            .bind(id)
            .bind(reason)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Payroll>, sqlx::Error> {
        let query = format!("SELECT {PAYROLL_COLUMNS} FROM payrolls WHERE id = $1");
        sqlx::query_as::<_, Payroll>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_user_period(
        pool: &PgPool,
        user_id: DbId,
        period: Period,
    ) -> Result<Option<Payroll>, sqlx::Error> {
        let query = format!(
            "SELECT {PAYROLL_COLUMNS} FROM payrolls \
             WHERE user_id = $1 AND payroll_year = $2 AND payroll_month = $3"
        );
        sqlx::query_as::<_, Payroll>(&query)
            .bind(user_id)
            .bind(period.year)
            .bind(period.month as i32)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_period(
        pool: &PgPool,
        period: Period,
    ) -> Result<Vec<Payroll>, sqlx::Error> {
        let query = format!(
            "SELECT {PAYROLL_COLUMNS} FROM payrolls \
             WHERE payroll_year = $1 AND payroll_month = $2 ORDER BY user_id"
        );
        sqlx::query_as::<_, Payroll>(&query)
            .bind(period.year)
            .bind(period.month as i32)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Payroll>, sqlx::Error> {
        let query = format!(
            "SELECT {PAYROLL_COLUMNS} FROM payrolls \
             WHERE user_id = $1 ORDER BY payroll_year DESC, payroll_month DESC"
        );
        sqlx::query_as::<_, Payroll>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    /// Aggregate figures for one period.
    pub async fn period_statistics(
        pool: &PgPool,
        period: Period,
    ) -> Result<PeriodStatistics, sqlx::Error> {
        sqlx::query_as::<_, PeriodStatistics>(
            "SELECT COUNT(*) AS payroll_count, \
                    COALESCE(SUM(gross_pay), 0) AS total_gross, \
                    COALESCE(SUM(net_pay), 0) AS total_net, \
                    COALESCE(SUM(regular_minutes), 0)::BIGINT AS total_regular_minutes, \
                    COALESCE(SUM(overtime_minutes), 0)::BIGINT AS total_overtime_minutes, \
                    COALESCE(SUM(deduction_minutes), 0)::BIGINT AS total_deduction_minutes \
             FROM payrolls \
             WHERE payroll_year = $1 AND payroll_month = $2 AND status <> 'CANCELLED'",
        )
        .bind(period.year)
        .bind(period.month as i32)
        .fetch_one(pool)
        .await
    }

    /// Net pay grouped by department for one period.
    pub async fn department_summary(
        pool: &PgPool,
        period: Period,
    ) -> Result<Vec<DepartmentSummary>, sqlx::Error> {
        sqlx::query_as::<_, DepartmentSummary>(
            "SELECT e.department, \
                    COUNT(*) AS payroll_count, \
                    COALESCE(SUM(p.net_pay), 0) AS total_net, \
                    COALESCE(AVG(p.net_pay), 0) AS average_net \
             FROM payrolls p \
             JOIN employees e ON e.id = p.user_id \
             WHERE p.payroll_year = $1 AND p.payroll_month = $2 \
               AND p.status <> 'CANCELLED' \
             GROUP BY e.department \
             ORDER BY total_net DESC",
        )
        .bind(period.year)
        .bind(period.month as i32)
        .fetch_all(pool)
        .await
    }

    /// Highest net pay first.
    pub async fn top_earners(
        pool: &PgPool,
        period: Period,
        limit: i64,
    ) -> Result<Vec<TopEarner>, sqlx::Error> {
        sqlx::query_as::<_, TopEarner>(
            "SELECT p.user_id, e.display_name, p.net_pay \
             FROM payrolls p \
             JOIN employees e ON e.id = p.user_id \
             WHERE p.payroll_year = $1 AND p.payroll_month = $2 \
               AND p.status <> 'CANCELLED' \
             ORDER BY p.net_pay DESC, p.user_id \
             LIMIT $3",
        )
        .bind(period.year)
        .bind(period.month as i32)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Totals per month, newest first, over the last `months` periods that
    /// have payrolls.
    pub async fn monthly_trends(
        pool: &PgPool,
        months: i64,
    ) -> Result<Vec<MonthlyTrend>, sqlx::Error> {
        sqlx::query_as::<_, MonthlyTrend>(
            "SELECT payroll_year, payroll_month, \
                    COUNT(*) AS payroll_count, \
                    COALESCE(SUM(net_pay), 0) AS total_net \
             FROM payrolls \
             WHERE status <> 'CANCELLED' \
             GROUP BY payroll_year, payroll_month \
             ORDER BY payroll_year DESC, payroll_month DESC \
             LIMIT $1",
        )
        .bind(months)
        .fetch_all(pool)
        .await
    }

    /// Each employee's net pay in `current` beside their net pay in the
    /// preceding period.
    pub async fn comparison(
        pool: &PgPool,
        current: Period,
    ) -> Result<Vec<PayrollComparison>, sqlx::Error> {
        let previous = current.previous();
        sqlx::query_as::<_, PayrollComparison>(
            "SELECT cur.user_id, cur.net_pay AS current_net, prev.net_pay AS previous_net \
             FROM payrolls cur \
             LEFT JOIN payrolls prev \
               ON prev.user_id = cur.user_id \
              AND prev.payroll_year = $3 AND prev.payroll_month = $4 \
              AND prev.status <> 'CANCELLED' \
             WHERE cur.payroll_year = $1 AND cur.payroll_month = $2 \
               AND cur.status <> 'CANCELLED' \
             ORDER BY cur.user_id",
        )
        .bind(current.year)
        .bind(current.month as i32)
        .bind(previous.year)
        .bind(previous.month as i32)
        .fetch_all(pool)
        .await
    }

    /// One employee's months in a year, oldest first.
    pub async fn yearly_summary(
        pool: &PgPool,
        user_id: DbId,
        year: i32,
    ) -> Result<Vec<YearlySummaryRow>, sqlx::Error> {
        sqlx::query_as::<_, YearlySummaryRow>(
            "SELECT payroll_month, status, regular_minutes, overtime_minutes, net_pay \
             FROM payrolls \
             WHERE user_id = $1 AND payroll_year = $2 \
             ORDER BY payroll_month",
        )
        .bind(user_id)
        .bind(year)
        .fetch_all(pool)
        .await
    }
}
