//! Route definitions for the audit log.
//!
//! ```text
//! GET    /verify                        verify_chain
//! GET    /{entity_type}/{entity_id}     list_for_entity
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::audit;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/verify", get(audit::verify_chain))
        .route("/{entity_type}/{entity_id}", get(audit::list_for_entity))
}
