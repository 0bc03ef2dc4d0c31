//! Route definitions for the idempotent sweeps.
//!
//! ```text
//! POST   /no-show            no_show_sweep
//! POST   /detect-violations  detect_violations
//! POST   /archive-schedules  archive_schedules
//! POST   /cleanup-drafts     cleanup_drafts
//! ```

use axum::routing::post;
use axum::Router;

use crate::handlers::sweep;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/no-show", post(sweep::no_show_sweep))
        .route("/detect-violations", post(sweep::detect_violations))
        .route("/archive-schedules", post(sweep::archive_schedules))
        .route("/cleanup-drafts", post(sweep::cleanup_drafts))
}
