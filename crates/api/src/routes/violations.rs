//! Route definitions for attendance violations, including the
//! violation-scoped explanation routes.
//!
//! ```text
//! GET    /                              list_violations
//! GET    /overdue                       list_overdue
//! GET    /{id}                          get_violation
//! POST   /{id}/request-explanation      request_explanation
//! POST   /{id}/resolve                  resolve_violation
//! POST   /{id}/escalate                 escalate_violation
//! POST   /{id}/explanations             submit_explanation
//! GET    /{id}/explanations             list_explanations
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{explanation, violation};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(violation::list_violations))
        .route("/overdue", get(violation::list_overdue))
        .route("/{id}", get(violation::get_violation))
        .route("/{id}/request-explanation", post(violation::request_explanation))
        .route("/{id}/resolve", post(violation::resolve_violation))
        .route("/{id}/escalate", post(violation::escalate_violation))
        .route(
            "/{id}/explanations",
            post(explanation::submit_explanation).get(explanation::list_explanations),
        )
}
