//! Integration tests for the payroll endpoints: calculation, capability
//! checks, lifecycle gating.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, request_as, seed_employee};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

async fn seed_rate(pool: &PgPool, employee: i64) {
    sqlx::query(
        "INSERT INTO pay_rates (employee_id, hourly_rate, overtime_multiplier, effective_from) \
         VALUES ($1, 20, 1.5, '2024-01-01')",
    )
    .bind(employee)
    .execute(pool)
    .await
    .unwrap();
}

/// Insert one COMPLETED assignment worth 480 regular minutes in 2024-03.
async fn seed_completed_shift(pool: &PgPool, employee: i64) {
    let template: i64 = sqlx::query_scalar(
        "INSERT INTO shift_templates (name, start_time, end_time) \
         VALUES ('Day', '08:00', '16:00') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO shift_assignments \
             (employee_id, template_id, assignment_date, planned_start, planned_end, \
              status, worked_minutes, regular_minutes, overtime_minutes, assigned_by) \
         VALUES ($1, $2, '2024-03-01', '08:00', '16:00', 'COMPLETED', 480, 480, 0, 1)",
    )
    .bind(employee)
    .bind(template)
    .execute(pool)
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// Test: accountant calculates; employee role cannot
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn calculate_requires_payroll_capability(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    seed_rate(&pool, employee).await;
    seed_completed_shift(&pool, employee).await;

    let body = json!({ "user_id": employee, "year": 2024, "month": 3 });

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        "/api/v1/payrolls/calculate",
        employee,
        "employee",
        Some(body.clone()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        "/api/v1/payrolls/calculate",
        50,
        "accountant",
        Some(body),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "CALCULATED");
    assert_eq!(json["data"]["regular_minutes"], 480);
    assert_eq!(json["data"]["deduction_minutes"], 0);
}

// ---------------------------------------------------------------------------
// Test: employees see their own payroll, not others'
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn payroll_visibility_is_owner_or_reporting(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    let stranger = seed_employee(&pool, "Mallory").await;
    seed_rate(&pool, employee).await;
    seed_completed_shift(&pool, employee).await;

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        "/api/v1/payrolls/calculate",
        50,
        "accountant",
        Some(json!({ "user_id": employee, "year": 2024, "month": 3 })),
    )
    .await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::GET,
        &format!("/api/v1/payrolls/{id}"),
        employee,
        "employee",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::GET,
        &format!("/api/v1/payrolls/{id}"),
        stranger,
        "employee",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Test: approved payroll refuses recalculation through the API
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn approved_payroll_blocks_recalculation(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    seed_rate(&pool, employee).await;
    seed_completed_shift(&pool, employee).await;

    let body = json!({ "user_id": employee, "year": 2024, "month": 3 });

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        "/api/v1/payrolls/calculate",
        50,
        "accountant",
        Some(body.clone()),
    )
    .await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        &format!("/api/v1/payrolls/{id}/approve"),
        50,
        "accountant",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        "/api/v1/payrolls/calculate",
        50,
        "accountant",
        Some(body),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_STATE");
}

// ---------------------------------------------------------------------------
// Test: validation endpoint reports drift after manual corruption
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn validate_endpoint_reports_drift(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    seed_rate(&pool, employee).await;
    seed_completed_shift(&pool, employee).await;

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        "/api/v1/payrolls/calculate",
        50,
        "accountant",
        Some(json!({ "user_id": employee, "year": 2024, "month": 3 })),
    )
    .await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    sqlx::query("UPDATE payrolls SET net_pay = $1 WHERE id = $2")
        .bind(Decimal::new(1, 0))
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::GET,
        &format!("/api/v1/payrolls/{id}/validate"),
        50,
        "accountant",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["matches"], false);
    let diffs = json["data"]["diffs"].as_array().unwrap();
    assert!(diffs.iter().any(|d| d["field"] == "net_pay"));
}
