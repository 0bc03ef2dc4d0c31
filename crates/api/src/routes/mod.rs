//! Route composition for the API.

pub mod assignments;
pub mod audit;
pub mod explanations;
pub mod health;
pub mod payrolls;
pub mod schedules;
pub mod swaps;
pub mod sweeps;
pub mod templates;
pub mod violations;

use axum::Router;

use crate::state::AppState;

/// All `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/templates", templates::router())
        .nest("/schedules", schedules::router())
        .nest("/assignments", assignments::router())
        .nest("/violations", violations::router())
        .nest("/explanations", explanations::explanation_router())
        .nest("/evidence", explanations::evidence_router())
        .nest("/swaps", swaps::router())
        .nest("/payrolls", payrolls::router())
        .nest("/payroll-stats", payrolls::stats_router())
        .nest("/sweeps", sweeps::router())
        .nest("/audit", audit::router())
}
