//! Route definitions for shift swap requests.
//!
//! ```text
//! POST   /               create_swap
//! GET    /               list_swaps
//! GET    /{id}           get_swap
//! POST   /{id}/approve   approve_swap
//! POST   /{id}/reject    reject_swap
//! POST   /{id}/cancel    cancel_swap
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::swap;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(swap::create_swap).get(swap::list_swaps))
        .route("/{id}", get(swap::get_swap))
        .route("/{id}/approve", post(swap::approve_swap))
        .route("/{id}/reject", post(swap::reject_swap))
        .route("/{id}/cancel", post(swap::cancel_swap))
}
