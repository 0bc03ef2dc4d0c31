//! Route definitions for shift assignments.
//!
//! ```text
//! POST   /                    create_assignment
//! GET    /                    list_assignments
//! POST   /bulk                bulk_create_assignments
//! GET    /conflict-check      conflict_check
//! GET    /{id}                get_assignment
//! POST   /{id}/check-in       check_in
//! POST   /{id}/check-out      check_out
//! POST   /{id}/cancel         cancel_assignment
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::assignment;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(assignment::create_assignment).get(assignment::list_assignments),
        )
        .route("/bulk", post(assignment::bulk_create_assignments))
        .route("/conflict-check", get(assignment::conflict_check))
        .route("/{id}", get(assignment::get_assignment))
        .route("/{id}/check-in", post(assignment::check_in))
        .route("/{id}/check-out", post(assignment::check_out))
        .route("/{id}/cancel", post(assignment::cancel_assignment))
}
