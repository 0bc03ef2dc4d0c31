//! Integration tests for violation persistence, idempotent detection, and
//! the explanation review workflow.

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use staffhub_core::explanation::ReviewDecision;
use staffhub_db::models::shift_template::CreateShiftTemplate;
use staffhub_db::models::violation::CreateViolation;
use staffhub_db::repositories::{
    CreateOutcome, ExplanationRepo, ReviewOutcome, ShiftAssignmentRepo, ShiftTemplateRepo,
    SubmitOutcome, ViolationRepo,
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

/// Create an employee with one assignment and return (employee, assignment).
async fn seed_assignment(pool: &PgPool) -> (i64, i64) {
    let employee = seed_employee(pool, "Eve").await;
    let template = ShiftTemplateRepo::create(
        pool,
        &CreateShiftTemplate {
            name: "Day".to_string(),
            description: None,
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            has_break: false,
            break_minutes: None,
            overtime_eligible: false,
            sort_order: None,
        },
    )
    .await
    .unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    match ShiftAssignmentRepo::create_checked(pool, employee, None, &template, date, 1, None)
        .await
        .unwrap()
    {
        CreateOutcome::Created(a) => (employee, a.id),
        other => panic!("Expected creation, got {other:?}"),
    }
}

fn late_violation(assignment_id: i64, employee_id: i64) -> CreateViolation {
    CreateViolation {
        assignment_id,
        employee_id,
        violation_type: "LATE".to_string(),
        violation_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        severity: "MINOR".to_string(),
        deviation_minutes: 20,
    }
}

// ---------------------------------------------------------------------------
// Test: detection writes are idempotent per (assignment, rule)
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_detection_is_a_noop(pool: PgPool) {
    let (employee, assignment) = seed_assignment(&pool).await;

    let first = ViolationRepo::create_if_absent(&pool, &late_violation(assignment, employee))
        .await
        .unwrap();
    assert!(first.is_some());

    let second = ViolationRepo::create_if_absent(&pool, &late_violation(assignment, employee))
        .await
        .unwrap();
    assert!(second.is_none());

    let all = ViolationRepo::list_for_employee(&pool, employee).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, "OPEN");
}

// ---------------------------------------------------------------------------
// Test: submit -> reject -> resubmit -> approve drives both status machines
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn review_cycle_moves_violation_and_explanation(pool: PgPool) {
    let (employee, assignment) = seed_assignment(&pool).await;
    let violation = ViolationRepo::create_if_absent(&pool, &late_violation(assignment, employee))
        .await
        .unwrap()
        .unwrap();

    // Submit: violation moves to PENDING_REVIEW.
    let SubmitOutcome::Created(explanation) =
        ExplanationRepo::submit(&pool, violation.id, employee, "Traffic accident on the A4")
            .await
            .unwrap()
    else {
        panic!("expected submission");
    };
    let violation_now = ViolationRepo::find_by_id(&pool, violation.id).await.unwrap().unwrap();
    assert_eq!(violation_now.status, "PENDING_REVIEW");

    // A second pending submission is refused.
    let dup = ExplanationRepo::submit(&pool, violation.id, employee, "again")
        .await
        .unwrap();
    assert!(matches!(dup, SubmitOutcome::PendingExists));

    // Reject with notes: violation goes back to the employee.
    let ReviewOutcome::Decided(rejected) = ExplanationRepo::review(
        &pool,
        explanation.id,
        ReviewDecision::Reject,
        99,
        Some("No evidence attached"),
    )
    .await
    .unwrap() else {
        panic!("expected decision");
    };
    assert_eq!(rejected.status, "REJECTED");
    let violation_now = ViolationRepo::find_by_id(&pool, violation.id).await.unwrap().unwrap();
    assert_eq!(violation_now.status, "PENDING_EXPLANATION");

    // Reviewing the same explanation twice is stale.
    let replay = ExplanationRepo::review(&pool, explanation.id, ReviewDecision::Approve, 99, None)
        .await
        .unwrap();
    assert!(matches!(replay, ReviewOutcome::Stale));

    // Resubmission is allowed after rejection; approval resolves.
    let SubmitOutcome::Created(second) =
        ExplanationRepo::submit(&pool, violation.id, employee, "Police report attached")
            .await
            .unwrap()
    else {
        panic!("expected resubmission");
    };
    let ReviewOutcome::Decided(approved) =
        ExplanationRepo::review(&pool, second.id, ReviewDecision::Approve, 99, None)
            .await
            .unwrap()
    else {
        panic!("expected decision");
    };
    assert_eq!(approved.status, "APPROVED");
    let violation_now = ViolationRepo::find_by_id(&pool, violation.id).await.unwrap().unwrap();
    assert_eq!(violation_now.status, "RESOLVED");

    // No further explanations once resolved.
    let closed = ExplanationRepo::submit(&pool, violation.id, employee, "more")
        .await
        .unwrap();
    assert!(matches!(closed, SubmitOutcome::ViolationClosed(_)));

    // History is preserved, newest first.
    let history = ExplanationRepo::list_for_violation(&pool, violation.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, "APPROVED");
    assert_eq!(history[1].status, "REJECTED");
}

// ---------------------------------------------------------------------------
// Test: overdue listing only sees unexplained violations past the cutoff
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn overdue_listing_skips_explained_violations(pool: PgPool) {
    let (employee, assignment) = seed_assignment(&pool).await;
    let violation = ViolationRepo::create_if_absent(&pool, &late_violation(assignment, employee))
        .await
        .unwrap()
        .unwrap();

    // Everything is overdue relative to a future cutoff.
    let future = chrono::Utc::now() + chrono::Duration::days(7);
    let overdue = ViolationRepo::find_overdue(&pool, future).await.unwrap();
    assert_eq!(overdue.len(), 1);

    // Once an explanation exists the violation leaves the overdue list.
    ExplanationRepo::submit(&pool, violation.id, employee, "sorry").await.unwrap();
    let overdue = ViolationRepo::find_overdue(&pool, future).await.unwrap();
    assert!(overdue.is_empty());
}

// ---------------------------------------------------------------------------
// Test: deletion is limited to undecided explanations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_pending_explanations_are_deletable(pool: PgPool) {
    let (employee, assignment) = seed_assignment(&pool).await;
    let violation = ViolationRepo::create_if_absent(&pool, &late_violation(assignment, employee))
        .await
        .unwrap()
        .unwrap();

    let SubmitOutcome::Created(explanation) =
        ExplanationRepo::submit(&pool, violation.id, employee, "draft")
            .await
            .unwrap()
    else {
        panic!("expected submission");
    };

    // Approve it, then try to delete: refused.
    ExplanationRepo::review(&pool, explanation.id, ReviewDecision::Approve, 99, None)
        .await
        .unwrap();
    let deleted = ExplanationRepo::delete_pending(&pool, explanation.id).await.unwrap();
    assert!(!deleted);
}
