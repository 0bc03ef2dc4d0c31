//! Integration tests for the payroll calculation pipeline: aggregation,
//! deduction policy, recalculation idempotence, state machine, validation.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use staffhub_core::assignment;
use staffhub_core::explanation::ReviewDecision;
use staffhub_core::payroll::Period;
use staffhub_db::models::shift_template::{CreateShiftTemplate, ShiftTemplate};
use staffhub_db::models::violation::CreateViolation;
use staffhub_db::repositories::{
    CalcOutcome, CreateOutcome, ExplanationRepo, PayrollRepo, ShiftAssignmentRepo,
    ShiftTemplateRepo, SubmitOutcome, ViolationRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_employee(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO employees (display_name, department) VALUES ($1, 'operations') RETURNING id",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_rate(pool: &PgPool, employee: i64, hourly: i64) {
    sqlx::query(
        "INSERT INTO pay_rates (employee_id, hourly_rate, overtime_multiplier, effective_from) \
         VALUES ($1, $2, 1.5, '2024-01-01')",
    )
    .bind(employee)
    .bind(Decimal::from(hourly))
    .execute(pool)
    .await
    .unwrap();
}

async fn seed_template(pool: &PgPool) -> ShiftTemplate {
    ShiftTemplateRepo::create(
        pool,
        &CreateShiftTemplate {
            name: "Day".to_string(),
            description: None,
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            has_break: false,
            break_minutes: None,
            overtime_eligible: true,
            sort_order: None,
        },
    )
    .await
    .unwrap()
}

/// Create and fully work one 8h shift on `day`, checking out at `out_hour`.
async fn work_shift(
    pool: &PgPool,
    employee: i64,
    template: &ShiftTemplate,
    day: u32,
    out_hour: u32,
) -> i64 {
    let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
    let CreateOutcome::Created(created) =
        ShiftAssignmentRepo::create_checked(pool, employee, None, template, date, 1, None)
            .await
            .unwrap()
    else {
        panic!("expected creation");
    };
    let check_in = Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap();
    let check_out = Utc.with_ymd_and_hms(2024, 3, day, out_hour, 0, 0).unwrap();
    ShiftAssignmentRepo::check_in(pool, created.id, check_in, None)
        .await
        .unwrap()
        .unwrap();
    let close =
        assignment::close_out(check_in, check_out, 0, template.regular_minutes(), true).unwrap();
    ShiftAssignmentRepo::check_out(pool, created.id, check_out, None, &close)
        .await
        .unwrap()
        .unwrap();
    created.id
}

fn period() -> Period {
    Period::new(2024, 3).unwrap()
}

// ---------------------------------------------------------------------------
// Test: calculation aggregates minutes and prices them
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn calculate_aggregates_and_prices(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    seed_rate(&pool, employee, 20).await;
    let template = seed_template(&pool).await;

    // One plain day (480 regular) and one with 2h overtime (480 + 120).
    work_shift(&pool, employee, &template, 1, 16).await;
    work_shift(&pool, employee, &template, 2, 18).await;

    let CalcOutcome::Calculated(payroll) = PayrollRepo::calculate(&pool, employee, period())
        .await
        .unwrap()
    else {
        panic!("expected calculation");
    };

    assert_eq!(payroll.status, "CALCULATED");
    assert_eq!(payroll.regular_minutes, 960);
    assert_eq!(payroll.overtime_minutes, 120);
    assert_eq!(payroll.deduction_minutes, 0);
    // 16h * 20 + 2h * 20 * 1.5 = 380.
    assert_eq!(payroll.gross_pay, Decimal::new(380_00, 2));
    assert_eq!(payroll.net_pay, payroll.gross_pay);
}

// ---------------------------------------------------------------------------
// Test: recalculation is idempotent and preserves identity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn recalculation_is_idempotent(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    seed_rate(&pool, employee, 20).await;
    let template = seed_template(&pool).await;
    work_shift(&pool, employee, &template, 1, 16).await;

    let CalcOutcome::Calculated(first) = PayrollRepo::calculate(&pool, employee, period())
        .await
        .unwrap()
    else {
        panic!("expected calculation");
    };
    let CalcOutcome::Calculated(second) = PayrollRepo::calculate(&pool, employee, period())
        .await
        .unwrap()
    else {
        panic!("expected recalculation");
    };

    assert_eq!(first.id, second.id);
    assert_eq!(first.regular_minutes, second.regular_minutes);
    assert_eq!(first.overtime_minutes, second.overtime_minutes);
    assert_eq!(first.deduction_minutes, second.deduction_minutes);
    assert_eq!(first.net_pay, second.net_pay);
}

// ---------------------------------------------------------------------------
// Test: rejected explanation charges, later approval drops the charge
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn deduction_follows_latest_explanation(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    seed_rate(&pool, employee, 20).await;
    let template = seed_template(&pool).await;
    let assignment_id = work_shift(&pool, employee, &template, 1, 16).await;

    let violation = ViolationRepo::create_if_absent(
        &pool,
        &CreateViolation {
            assignment_id,
            employee_id: employee,
            violation_type: "LATE".to_string(),
            violation_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            severity: "MODERATE".to_string(),
            deviation_minutes: 60,
        },
    )
    .await
    .unwrap()
    .unwrap();

    // A rejected explanation keeps the violation chargeable.
    let SubmitOutcome::Created(explanation) =
        ExplanationRepo::submit(&pool, violation.id, employee, "overslept").await.unwrap()
    else {
        panic!("expected submission");
    };
    ExplanationRepo::review(&pool, explanation.id, ReviewDecision::Reject, 99, Some("not valid"))
        .await
        .unwrap();

    let CalcOutcome::Calculated(charged) = PayrollRepo::calculate(&pool, employee, period())
        .await
        .unwrap()
    else {
        panic!("expected calculation");
    };
    assert_eq!(charged.deduction_minutes, 60);
    // 480 min at 20/h = 160 gross, minus 1h deduction = 140 net.
    assert_eq!(charged.net_pay, Decimal::new(140_00, 2));

    // Approval of a later explanation drops the charge on recalculation.
    let SubmitOutcome::Created(second) =
        ExplanationRepo::submit(&pool, violation.id, employee, "doctor's note").await.unwrap()
    else {
        panic!("expected resubmission");
    };
    ExplanationRepo::review(&pool, second.id, ReviewDecision::Approve, 99, None)
        .await
        .unwrap();

    let CalcOutcome::Calculated(cleared) = PayrollRepo::calculate(&pool, employee, period())
        .await
        .unwrap()
    else {
        panic!("expected recalculation");
    };
    assert_eq!(cleared.id, charged.id);
    assert_eq!(cleared.deduction_minutes, 0);
    assert_eq!(cleared.net_pay, cleared.gross_pay);
}

// ---------------------------------------------------------------------------
// Test: state machine gates recalculation, approval, payment
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn approved_payroll_refuses_recalculation(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    seed_rate(&pool, employee, 20).await;
    let template = seed_template(&pool).await;
    work_shift(&pool, employee, &template, 1, 16).await;

    let CalcOutcome::Calculated(payroll) = PayrollRepo::calculate(&pool, employee, period())
        .await
        .unwrap()
    else {
        panic!("expected calculation");
    };

    let approved = PayrollRepo::approve(&pool, payroll.id, 99).await.unwrap().unwrap();
    assert_eq!(approved.status, "APPROVED");

    let retry = PayrollRepo::calculate(&pool, employee, period()).await.unwrap();
    assert!(matches!(retry, CalcOutcome::NotRecalculable(status) if status == "APPROVED"));

    // Approving twice loses the CAS.
    assert!(PayrollRepo::approve(&pool, payroll.id, 99).await.unwrap().is_none());

    let paid = PayrollRepo::mark_paid(&pool, payroll.id).await.unwrap().unwrap();
    assert_eq!(paid.status, "PAID");

    // PAID is terminal: no cancel.
    assert!(PayrollRepo::cancel(&pool, payroll.id, "oops").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Test: missing pay rate is reported, not defaulted
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_rate_is_surfaced(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    let template = seed_template(&pool).await;
    work_shift(&pool, employee, &template, 1, 16).await;

    let outcome = PayrollRepo::calculate(&pool, employee, period()).await.unwrap();
    assert!(matches!(outcome, CalcOutcome::MissingRate));
}

// ---------------------------------------------------------------------------
// Test: validation spots drifted stored totals
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn validation_reports_drift(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    seed_rate(&pool, employee, 20).await;
    let template = seed_template(&pool).await;
    work_shift(&pool, employee, &template, 1, 16).await;

    let CalcOutcome::Calculated(payroll) = PayrollRepo::calculate(&pool, employee, period())
        .await
        .unwrap()
    else {
        panic!("expected calculation");
    };

    let clean = PayrollRepo::validate(&pool, payroll.id).await.unwrap().unwrap();
    assert!(clean.matches);
    assert!(clean.diffs.is_empty());

    // Corrupt a stored total behind the calculator's back.
    sqlx::query("UPDATE payrolls SET regular_minutes = 1 WHERE id = $1")
        .bind(payroll.id)
        .execute(&pool)
        .await
        .unwrap();

    let dirty = PayrollRepo::validate(&pool, payroll.id).await.unwrap().unwrap();
    assert!(!dirty.matches);
    assert!(dirty.diffs.iter().any(|d| d.field == "regular_minutes"));
}
