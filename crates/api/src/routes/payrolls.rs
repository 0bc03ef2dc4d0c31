//! Route definitions for payroll lifecycle and statistics.
//!
//! ```text
//! POST   /calculate          calculate
//! POST   /bulk-calculate     bulk_calculate
//! POST   /bulk-approve       bulk_approve
//! GET    /                   list_payrolls
//! GET    /{id}               get_payroll
//! GET    /{id}/validate      validate_payroll
//! POST   /{id}/approve       approve_payroll
//! POST   /{id}/pay           mark_paid
//! POST   /{id}/cancel        cancel_payroll
//!
//! GET    /period             period_statistics     (under /payroll-stats)
//! GET    /departments        department_summary
//! GET    /top-earners        top_earners
//! GET    /trends             monthly_trends
//! GET    /comparison         comparison
//! GET    /yearly-summary     yearly_summary
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payroll;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(payroll::list_payrolls))
        .route("/calculate", post(payroll::calculate))
        .route("/bulk-calculate", post(payroll::bulk_calculate))
        .route("/bulk-approve", post(payroll::bulk_approve))
        .route("/{id}", get(payroll::get_payroll))
        .route("/{id}/validate", get(payroll::validate_payroll))
        .route("/{id}/approve", post(payroll::approve_payroll))
        .route("/{id}/pay", post(payroll::mark_paid))
        .route("/{id}/cancel", post(payroll::cancel_payroll))
}

pub fn stats_router() -> Router<AppState> {
    Router::new()
        .route("/period", get(payroll::period_statistics))
        .route("/departments", get(payroll::department_summary))
        .route("/top-earners", get(payroll::top_earners))
        .route("/trends", get(payroll::monthly_trends))
        .route("/comparison", get(payroll::comparison))
        .route("/yearly-summary", get(payroll::yearly_summary))
}
