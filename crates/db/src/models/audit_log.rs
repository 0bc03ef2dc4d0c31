//! Audit log models.

use serde::Serialize;
use sqlx::FromRow;
use staffhub_core::types::{DbId, Timestamp};

/// A row from the `audit_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub actor_id: Option<DbId>,
    pub action_type: String,
    pub category: String,
    pub entity_type: String,
    pub entity_id: DbId,
    pub details: Option<serde_json::Value>,
    pub integrity_hash: String,
    pub created_at: Timestamp,
}

/// DTO for recording a transition.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    /// `None` records a system actor (sweeps).
    pub actor_id: Option<DbId>,
    pub action_type: &'static str,
    pub entity_type: &'static str,
    pub entity_id: DbId,
    pub details: Option<serde_json::Value>,
}
