//! Shift swap request models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use staffhub_core::types::{DbId, Timestamp};

/// A row from the `shift_swap_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShiftSwapRequest {
    pub id: DbId,
    pub requester_assignment_id: DbId,
    pub target_assignment_id: DbId,
    pub requested_by: DbId,
    pub reason: Option<String>,
    pub status: String,
    pub decided_by: Option<DbId>,
    pub decided_at: Option<Timestamp>,
    pub decision_notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for opening a swap request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSwapRequest {
    pub requester_assignment_id: DbId,
    pub target_assignment_id: DbId,
    pub reason: Option<String>,
}

/// Request body for deciding a swap request.
#[derive(Debug, Clone, Deserialize)]
pub struct DecideSwapRequest {
    pub notes: Option<String>,
}
