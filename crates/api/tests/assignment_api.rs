//! Integration tests for the assignment endpoints: creation, conflicts,
//! capability checks, and the check-in flow.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, request_as, seed_employee, seed_template};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Test: manager creates an assignment; employee role cannot
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_requires_assign_capability(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    let template = seed_template(&pool, "Day").await;

    let body = json!({
        "employee_id": employee,
        "template_id": template,
        "date": "2024-03-01",
    });

    // An employee may not assign shifts.
    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        "/api/v1/assignments",
        employee,
        "employee",
        Some(body.clone()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A manager may.
    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        "/api/v1/assignments",
        1,
        "manager",
        Some(body),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "SCHEDULED");
    assert_eq!(json["data"]["planned_start"], "08:00:00");
}

// ---------------------------------------------------------------------------
// Test: overlapping window is rejected with CONFLICT and not persisted
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn overlapping_assignment_is_conflict(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    let template = seed_template(&pool, "Day").await;

    let body = json!({
        "employee_id": employee,
        "template_id": template,
        "date": "2024-03-01",
    });

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        "/api/v1/assignments",
        1,
        "manager",
        Some(body.clone()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        "/api/v1/assignments",
        1,
        "manager",
        Some(body),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shift_assignments")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

// ---------------------------------------------------------------------------
// Test: bulk create reports per-item outcomes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn bulk_create_reports_partial_failure(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    let other = seed_employee(&pool, "Bob").await;
    let template = seed_template(&pool, "Day").await;

    // Item 2 duplicates item 0's window for the same employee.
    let body = json!({
        "items": [
            { "employee_id": employee, "template_id": template, "date": "2024-03-01" },
            { "employee_id": other,    "template_id": template, "date": "2024-03-01" },
            { "employee_id": employee, "template_id": template, "date": "2024-03-01" },
            { "employee_id": employee, "template_id": template, "date": "2024-03-02" },
        ]
    });

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        "/api/v1/assignments/bulk",
        1,
        "manager",
        Some(body),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let outcomes = json["data"].as_array().unwrap();
    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes[0]["succeeded"], true);
    assert_eq!(outcomes[1]["succeeded"], true);
    assert_eq!(outcomes[2]["succeeded"], false);
    assert_eq!(outcomes[2]["error_code"], "CONFLICT");
    assert_eq!(outcomes[3]["succeeded"], true);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shift_assignments")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 3);
}

// ---------------------------------------------------------------------------
// Test: only the assigned employee (or a manager) may check in
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn check_in_enforces_ownership(pool: PgPool) {
    let employee = seed_employee(&pool, "Eve").await;
    let stranger = seed_employee(&pool, "Mallory").await;
    let template = seed_template(&pool, "Day").await;

    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        "/api/v1/assignments",
        1,
        "manager",
        Some(json!({
            "employee_id": employee,
            "template_id": template,
            "date": "2024-03-01",
        })),
    )
    .await;
    let created = body_json(response).await;
    let id = created["data"]["id"].as_i64().unwrap();

    // A different employee is rejected.
    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        &format!("/api/v1/assignments/{id}/check-in"),
        stranger,
        "employee",
        Some(json!({ "location": "gate-1" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner checks in.
    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        &format!("/api/v1/assignments/{id}/check-in"),
        employee,
        "employee",
        Some(json!({ "location": "gate-1" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "CHECKED_IN");

    // Checking in twice is an invalid transition.
    let app = common::build_test_app(pool.clone());
    let response = request_as(
        app,
        Method::POST,
        &format!("/api/v1/assignments/{id}/check-in"),
        employee,
        "employee",
        Some(json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_STATE");
}
