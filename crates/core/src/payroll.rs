//! Payroll lifecycle and computation math.
//!
//! A payroll is the derived pay record for one employee and one calendar
//! month. Calculation aggregates minute totals from completed assignments,
//! charges deduction minutes from unresolved or rejected violations, and
//! prices the result with the employee's pay rate. Recalculation replaces
//! the derived fields but preserves identity and audit history.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::explanation::ExplanationStatus;
use crate::violation::ViolationStatus;

// ---------------------------------------------------------------------------
// Status machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayrollStatus {
    Draft,
    Calculated,
    Approved,
    Paid,
    Cancelled,
}

impl PayrollStatus {
    pub fn parse(s: &str) -> Option<PayrollStatus> {
        match s {
            "DRAFT" => Some(PayrollStatus::Draft),
            "CALCULATED" => Some(PayrollStatus::Calculated),
            "APPROVED" => Some(PayrollStatus::Approved),
            "PAID" => Some(PayrollStatus::Paid),
            "CANCELLED" => Some(PayrollStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PayrollStatus::Draft => "DRAFT",
            PayrollStatus::Calculated => "CALCULATED",
            PayrollStatus::Approved => "APPROVED",
            PayrollStatus::Paid => "PAID",
            PayrollStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn valid_transitions(&self) -> &'static [PayrollStatus] {
        use PayrollStatus::*;
        match self {
            Draft => &[Calculated, Cancelled],
            Calculated => &[Approved, Cancelled],
            Approved => &[Paid, Cancelled],
            Paid | Cancelled => &[],
        }
    }

    pub fn can_transition(&self, to: PayrollStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    pub fn validate_transition(&self, to: PayrollStatus) -> Result<(), CoreError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition(format!(
                "Payroll cannot move from {} to {}",
                self.as_str(),
                to.as_str()
            )))
        }
    }

    /// Recalculation only while the record is still a working copy.
    pub fn is_recalculable(&self) -> bool {
        matches!(self, PayrollStatus::Draft | PayrollStatus::Calculated)
    }
}

// ---------------------------------------------------------------------------
// Period
// ---------------------------------------------------------------------------

/// A payroll period: one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Period, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::Validation(format!(
                "Month {month} is out of range 1-12"
            )));
        }
        if !(2000..=2100).contains(&year) {
            return Err(CoreError::Validation(format!(
                "Year {year} is out of range 2000-2100"
            )));
        }
        Ok(Period { year, month })
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("validated period")
    }

    pub fn last_day(&self) -> NaiveDate {
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        }
        .expect("validated period");
        next.pred_opt().expect("month has a last day")
    }

    pub fn previous(&self) -> Period {
        if self.month == 1 {
            Period {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Period {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Per-assignment minute contribution to a payroll.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentMinutes {
    pub regular_minutes: i64,
    pub overtime_minutes: i64,
}

/// Summed minute totals for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MinuteTotals {
    pub regular: i64,
    pub overtime: i64,
}

pub fn aggregate_minutes(assignments: &[AssignmentMinutes]) -> MinuteTotals {
    assignments.iter().fold(MinuteTotals::default(), |acc, a| {
        MinuteTotals {
            regular: acc.regular + a.regular_minutes,
            overtime: acc.overtime + a.overtime_minutes,
        }
    })
}

/// The violation fields the deduction policy reads.
#[derive(Debug, Clone, Copy)]
pub struct ViolationCharge {
    pub status: ViolationStatus,
    /// Status of the violation's latest explanation, if any.
    pub latest_explanation: Option<ExplanationStatus>,
    pub deviation_minutes: i64,
}

/// Whether a violation charges deduction minutes against payroll.
///
/// A RESOLVED violation or an APPROVED latest explanation charges nothing;
/// everything else (open, pending, escalated, rejected or absent
/// explanation) stays chargeable until an approval lands.
pub fn is_chargeable(
    status: ViolationStatus,
    latest_explanation: Option<ExplanationStatus>,
) -> bool {
    if status == ViolationStatus::Resolved {
        return false;
    }
    !matches!(latest_explanation, Some(ExplanationStatus::Approved))
}

/// Sum deduction minutes over a period's violations.
pub fn deduction_minutes(charges: &[ViolationCharge]) -> i64 {
    charges
        .iter()
        .filter(|c| is_chargeable(c.status, c.latest_explanation))
        .map(|c| c.deviation_minutes)
        .sum()
}

// ---------------------------------------------------------------------------
// Pay math
// ---------------------------------------------------------------------------

/// An employee's pay rate for a period, fed by the HR-profile collaborator.
#[derive(Debug, Clone, Copy)]
pub struct PayRate {
    pub hourly_rate: Decimal,
    pub overtime_multiplier: Decimal,
}

/// Priced payroll figures, rounded to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayComputation {
    pub gross_pay: Decimal,
    pub net_pay: Decimal,
}

/// Price minute totals and deductions with a pay rate.
///
/// Deductions are an additive penalty priced at the regular rate; they
/// never reduce the recorded minute totals. Net pay has a zero floor.
pub fn compute_pay(
    totals: MinuteTotals,
    deduction_mins: i64,
    rate: PayRate,
) -> PayComputation {
    let sixty = Decimal::from(60);
    let regular_hours = Decimal::from(totals.regular) / sixty;
    let overtime_hours = Decimal::from(totals.overtime) / sixty;
    let deduction_hours = Decimal::from(deduction_mins) / sixty;

    let gross = regular_hours * rate.hourly_rate
        + overtime_hours * rate.hourly_rate * rate.overtime_multiplier;
    let net = (gross - deduction_hours * rate.hourly_rate).max(Decimal::ZERO);

    PayComputation {
        gross_pay: gross.round_dp(2),
        net_pay: net.round_dp(2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(hourly: i64, multiplier_tenths: i64) -> PayRate {
        PayRate {
            hourly_rate: Decimal::from(hourly),
            overtime_multiplier: Decimal::new(multiplier_tenths, 1),
        }
    }

    // -----------------------------------------------------------------------
    // Status machine
    // -----------------------------------------------------------------------

    #[test]
    fn draft_calculates_then_approves_then_pays() {
        assert!(PayrollStatus::Draft.can_transition(PayrollStatus::Calculated));
        assert!(PayrollStatus::Calculated.can_transition(PayrollStatus::Approved));
        assert!(PayrollStatus::Approved.can_transition(PayrollStatus::Paid));
    }

    #[test]
    fn paid_is_terminal() {
        assert!(PayrollStatus::Paid.valid_transitions().is_empty());
    }

    #[test]
    fn cancel_allowed_from_any_unpaid_state() {
        assert!(PayrollStatus::Draft.can_transition(PayrollStatus::Cancelled));
        assert!(PayrollStatus::Calculated.can_transition(PayrollStatus::Cancelled));
        assert!(PayrollStatus::Approved.can_transition(PayrollStatus::Cancelled));
        assert!(!PayrollStatus::Paid.can_transition(PayrollStatus::Cancelled));
    }

    #[test]
    fn recalculation_window() {
        assert!(PayrollStatus::Draft.is_recalculable());
        assert!(PayrollStatus::Calculated.is_recalculable());
        assert!(!PayrollStatus::Approved.is_recalculable());
        assert!(!PayrollStatus::Paid.is_recalculable());
    }

    // -----------------------------------------------------------------------
    // Period
    // -----------------------------------------------------------------------

    #[test]
    fn period_bounds() {
        let p = Period::new(2024, 2).unwrap();
        assert_eq!(p.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(p.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn period_rejects_bad_month() {
        assert!(Period::new(2024, 0).is_err());
        assert!(Period::new(2024, 13).is_err());
    }

    #[test]
    fn previous_rolls_over_year() {
        assert_eq!(
            Period::new(2024, 1).unwrap().previous(),
            Period { year: 2023, month: 12 }
        );
    }

    #[test]
    fn period_contains_its_days_only() {
        let p = Period::new(2024, 3).unwrap();
        assert!(p.contains(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()));
        assert!(!p.contains(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
    }

    // -----------------------------------------------------------------------
    // Aggregation
    // -----------------------------------------------------------------------

    #[test]
    fn aggregation_sums_buckets() {
        let totals = aggregate_minutes(&[
            AssignmentMinutes { regular_minutes: 480, overtime_minutes: 0 },
            AssignmentMinutes { regular_minutes: 480, overtime_minutes: 60 },
        ]);
        assert_eq!(totals.regular, 960);
        assert_eq!(totals.overtime, 60);
    }

    #[test]
    fn aggregation_of_nothing_is_zero() {
        assert_eq!(aggregate_minutes(&[]), MinuteTotals::default());
    }

    // -----------------------------------------------------------------------
    // Deduction policy
    // -----------------------------------------------------------------------

    #[test]
    fn open_unexplained_violation_charges() {
        assert!(is_chargeable(ViolationStatus::Open, None));
    }

    #[test]
    fn rejected_explanation_charges() {
        assert!(is_chargeable(
            ViolationStatus::PendingExplanation,
            Some(ExplanationStatus::Rejected)
        ));
    }

    #[test]
    fn approved_explanation_charges_nothing() {
        assert!(!is_chargeable(
            ViolationStatus::Resolved,
            Some(ExplanationStatus::Approved)
        ));
        // Even if the status write lagged, approval alone is decisive.
        assert!(!is_chargeable(
            ViolationStatus::PendingReview,
            Some(ExplanationStatus::Approved)
        ));
    }

    #[test]
    fn resolved_without_fault_charges_nothing() {
        assert!(!is_chargeable(ViolationStatus::Resolved, None));
    }

    #[test]
    fn deduction_sums_only_chargeable() {
        let minutes = deduction_minutes(&[
            ViolationCharge {
                status: ViolationStatus::Open,
                latest_explanation: None,
                deviation_minutes: 20,
            },
            ViolationCharge {
                status: ViolationStatus::Resolved,
                latest_explanation: Some(ExplanationStatus::Approved),
                deviation_minutes: 480,
            },
            ViolationCharge {
                status: ViolationStatus::PendingExplanation,
                latest_explanation: Some(ExplanationStatus::Rejected),
                deviation_minutes: 30,
            },
        ]);
        assert_eq!(minutes, 50);
    }

    // -----------------------------------------------------------------------
    // Pay math
    // -----------------------------------------------------------------------

    #[test]
    fn pay_prices_regular_and_overtime() {
        // 160h regular + 10h overtime at 20/h with 1.5x multiplier.
        let pay = compute_pay(
            MinuteTotals { regular: 9600, overtime: 600 },
            0,
            rate(20, 15),
        );
        assert_eq!(pay.gross_pay, Decimal::new(3_500_00, 2));
        assert_eq!(pay.net_pay, pay.gross_pay);
    }

    #[test]
    fn deduction_reduces_net_only() {
        // 1h of deductions at 20/h.
        let pay = compute_pay(
            MinuteTotals { regular: 9600, overtime: 0 },
            60,
            rate(20, 15),
        );
        assert_eq!(pay.gross_pay, Decimal::new(3_200_00, 2));
        assert_eq!(pay.net_pay, Decimal::new(3_180_00, 2));
    }

    #[test]
    fn net_pay_has_zero_floor() {
        let pay = compute_pay(
            MinuteTotals { regular: 60, overtime: 0 },
            6000,
            rate(20, 15),
        );
        assert_eq!(pay.net_pay, Decimal::ZERO);
    }

    #[test]
    fn computation_is_idempotent() {
        let totals = MinuteTotals { regular: 9600, overtime: 600 };
        let a = compute_pay(totals, 45, rate(20, 15));
        let b = compute_pay(totals, 45, rate(20, 15));
        assert_eq!(a, b);
    }
}
