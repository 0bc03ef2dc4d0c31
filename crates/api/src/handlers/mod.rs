pub mod assignment;
pub mod audit;
pub mod explanation;
pub mod health;
pub mod payroll;
pub mod schedule;
pub mod shift_template;
pub mod swap;
pub mod sweep;
pub mod violation;

use sqlx::PgPool;
use staffhub_core::types::DbId;
use staffhub_db::models::audit_log::CreateAuditLog;
use staffhub_db::repositories::AuditLogRepo;

/// Record one transition in the audit chain.
pub(crate) async fn record_audit(
    pool: &PgPool,
    actor_id: Option<DbId>,
    action_type: &'static str,
    entity_type: &'static str,
    entity_id: DbId,
    details: Option<serde_json::Value>,
) -> Result<(), sqlx::Error> {
    AuditLogRepo::append(
        pool,
        &CreateAuditLog {
            actor_id,
            action_type,
            entity_type,
            entity_id,
            details,
        },
    )
    .await?;
    Ok(())
}
