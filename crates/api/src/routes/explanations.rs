//! Route definitions for explanation review and evidence metadata.
//!
//! ```text
//! PUT    /{id}                    update_explanation
//! DELETE /{id}                    delete_explanation
//! POST   /{id}/approve            approve_explanation
//! POST   /{id}/reject             reject_explanation
//! POST   /{id}/request-more-info  request_more_info
//! POST   /{id}/evidence           add_evidence
//! GET    /{id}/evidence           list_evidence
//!
//! POST   /{id}/verify             verify_evidence      (under /evidence)
//! DELETE /{id}                    delete_evidence      (under /evidence)
//! ```

use axum::routing::{delete, post, put};
use axum::Router;

use crate::handlers::explanation;
use crate::state::AppState;

pub fn explanation_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            put(explanation::update_explanation).delete(explanation::delete_explanation),
        )
        .route("/{id}/approve", post(explanation::approve_explanation))
        .route("/{id}/reject", post(explanation::reject_explanation))
        .route("/{id}/request-more-info", post(explanation::request_more_info))
        .route(
            "/{id}/evidence",
            post(explanation::add_evidence).get(explanation::list_evidence),
        )
}

pub fn evidence_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", delete(explanation::delete_evidence))
        .route("/{id}/verify", post(explanation::verify_evidence))
}
