//! Integration tests for the schedule lifecycle: publish, cascade cancel,
//! auto-archive, draft cleanup.

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use staffhub_db::models::shift_schedule::CreateShiftSchedule;
use staffhub_db::models::shift_template::{CreateShiftTemplate, ShiftTemplate};
use staffhub_db::repositories::{
    CreateOutcome, ShiftAssignmentRepo, ShiftScheduleRepo, ShiftTemplateRepo,
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
            overtime_eligible: false,
            sort_order: None,
        },
    )
    .await
    .unwrap()
}

async fn seed_schedule(pool: &PgPool, name: &str, start: NaiveDate, end: NaiveDate) -> i64 {
    ShiftScheduleRepo::create(
        pool,
        &CreateShiftSchedule {
            name: name.to_string(),
            schedule_type: "WEEKLY".to_string(),
            start_date: start,
            end_date: end,
        },
        1,
    )
    .await
    .unwrap()
    .id
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ---------------------------------------------------------------------------
// Test: publish is CAS from DRAFT; structural edits stop after publish
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn publish_freezes_structure(pool: PgPool) {
    let schedule = seed_schedule(&pool, "Week 10", d(2024, 3, 4), d(2024, 3, 10)).await;

    let published = ShiftScheduleRepo::publish(&pool, schedule).await.unwrap().unwrap();
    assert_eq!(published.status, "PUBLISHED");
    assert!(published.published_at.is_some());

    // Publishing twice loses the CAS.
    assert!(ShiftScheduleRepo::publish(&pool, schedule).await.unwrap().is_none());

    // Draft-only update no longer applies.
    let edit = ShiftScheduleRepo::update_draft(
        &pool,
        schedule,
        &staffhub_db::models::shift_schedule::UpdateShiftSchedule {
            name: Some("renamed".to_string()),
            start_date: None,
            end_date: None,
        },
    )
    .await
    .unwrap();
    assert!(edit.is_none());

    // Neither does draft-only deletion.
    assert!(!ShiftScheduleRepo::delete_draft(&pool, schedule).await.unwrap());
}

// ---------------------------------------------------------------------------
// Test: cancelling a schedule soft-cancels its live assignments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn cancel_cascades_to_assignments(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    let template = seed_template(&pool).await;
    let schedule = seed_schedule(&pool, "Week 10", d(2024, 3, 4), d(2024, 3, 10)).await;

    for day in [4, 5, 6] {
        let outcome = ShiftAssignmentRepo::create_checked(
            &pool,
            employee,
            Some(schedule),
            &template,
            d(2024, 3, day),
            1,
            None,
        )
        .await
        .unwrap();
        assert!(matches!(outcome, CreateOutcome::Created(_)));
    }

    let (cancelled, count) = ShiftScheduleRepo::cancel_cascading(&pool, schedule, "site closed")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.status, "CANCELLED");
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("site closed"));
    assert_eq!(count, 3);

    for a in ShiftAssignmentRepo::list_for_schedule(&pool, schedule).await.unwrap() {
        assert_eq!(a.status, "CANCELLED");
        assert_eq!(a.cancel_reason.as_deref(), Some("site closed"));
    }

    // Terminal: cancelling again returns nothing.
    assert!(ShiftScheduleRepo::cancel_cascading(&pool, schedule, "again")
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Test: auto-archive moves only long-finished published schedules
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn auto_archive_respects_cutoff(pool: PgPool) {
    let old = seed_schedule(&pool, "January", d(2024, 1, 1), d(2024, 1, 31)).await;
    let recent = seed_schedule(&pool, "March", d(2024, 3, 1), d(2024, 3, 31)).await;
    ShiftScheduleRepo::publish(&pool, old).await.unwrap().unwrap();
    ShiftScheduleRepo::publish(&pool, recent).await.unwrap().unwrap();

    let archived = ShiftScheduleRepo::auto_archive(&pool, d(2024, 2, 15)).await.unwrap();
    assert_eq!(archived, vec![old]);

    let recent_row = ShiftScheduleRepo::find_by_id(&pool, recent).await.unwrap().unwrap();
    assert_eq!(recent_row.status, "PUBLISHED");

    // Idempotent: nothing left to archive at the same cutoff.
    let archived = ShiftScheduleRepo::auto_archive(&pool, d(2024, 2, 15)).await.unwrap();
    assert!(archived.is_empty());
}

// ---------------------------------------------------------------------------
// Test: draft cleanup deletes stale drafts and their assignments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn cleanup_removes_stale_drafts(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    let template = seed_template(&pool).await;
    let stale = seed_schedule(&pool, "Stale draft", d(2024, 2, 1), d(2024, 2, 7)).await;
    ShiftAssignmentRepo::create_checked(
        &pool,
        employee,
        Some(stale),
        &template,
        d(2024, 2, 1),
        1,
        None,
    )
    .await
    .unwrap();

    // A cutoff in the future makes every draft stale.
    let future = chrono::Utc::now() + chrono::Duration::hours(1);
    let deleted = ShiftScheduleRepo::cleanup_old_drafts(&pool, future).await.unwrap();
    assert_eq!(deleted, 1);

    assert!(ShiftScheduleRepo::find_by_id(&pool, stale).await.unwrap().is_none());
    let orphans = ShiftAssignmentRepo::list_for_schedule(&pool, stale).await.unwrap();
    assert!(orphans.is_empty());
}
