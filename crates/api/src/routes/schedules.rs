//! Route definitions for the schedule lifecycle.
//!
//! ```text
//! POST   /                    create_schedule
//! GET    /                    list_schedules
//! POST   /generate-weekly     generate_weekly
//! POST   /generate-monthly    generate_monthly
//! GET    /{id}                get_schedule
//! PUT    /{id}                update_schedule
//! DELETE /{id}                delete_schedule
//! GET    /{id}/assignments    list_schedule_assignments
//! POST   /{id}/publish        publish_schedule
//! POST   /{id}/archive        archive_schedule
//! POST   /{id}/cancel         cancel_schedule
//! POST   /{id}/copy           copy_schedule
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::schedule;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(schedule::create_schedule).get(schedule::list_schedules),
        )
        .route("/generate-weekly", post(schedule::generate_weekly))
        .route("/generate-monthly", post(schedule::generate_monthly))
        .route(
            "/{id}",
            get(schedule::get_schedule)
                .put(schedule::update_schedule)
                .delete(schedule::delete_schedule),
        )
        .route("/{id}/assignments", get(schedule::list_schedule_assignments))
        .route("/{id}/publish", post(schedule::publish_schedule))
        .route("/{id}/archive", post(schedule::archive_schedule))
        .route("/{id}/cancel", post(schedule::cancel_schedule))
        .route("/{id}/copy", post(schedule::copy_schedule))
}
