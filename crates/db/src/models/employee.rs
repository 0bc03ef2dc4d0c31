//! Employee directory rows, fed by the identity collaborator.

use serde::Serialize;
use sqlx::FromRow;
use staffhub_core::types::{DbId, Timestamp};

/// A row from the `employees` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Employee {
    pub id: DbId,
    pub display_name: String,
    pub department: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
