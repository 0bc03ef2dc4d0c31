//! Route definitions for the shift template catalog.
//!
//! ```text
//! POST   /                    create_template
//! GET    /                    list_templates
//! GET    /overlapping         list_overlapping_templates
//! GET    /{id}                get_template
//! PUT    /{id}                update_template
//! POST   /{id}/deactivate     deactivate_template
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::shift_template;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(shift_template::create_template).get(shift_template::list_templates),
        )
        .route("/overlapping", get(shift_template::list_overlapping_templates))
        .route(
            "/{id}",
            get(shift_template::get_template).put(shift_template::update_template),
        )
        .route("/{id}/deactivate", post(shift_template::deactivate_template))
}
