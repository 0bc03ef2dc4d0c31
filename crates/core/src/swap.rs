//! Shift swap request lifecycle.
//!
//! A swap offers to exchange the employees of two SCHEDULED assignments.
//! Approval re-runs conflict detection for both employees against the
//! swapped windows before any mutation; the request itself is a small
//! PENDING -> APPROVED / REJECTED / CANCELLED machine.

use crate::error::CoreError;
use crate::types::DbId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl SwapStatus {
    pub fn parse(s: &str) -> Option<SwapStatus> {
        match s {
            "PENDING" => Some(SwapStatus::Pending),
            "APPROVED" => Some(SwapStatus::Approved),
            "REJECTED" => Some(SwapStatus::Rejected),
            "CANCELLED" => Some(SwapStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "PENDING",
            SwapStatus::Approved => "APPROVED",
            SwapStatus::Rejected => "REJECTED",
            SwapStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn valid_transitions(&self) -> &'static [SwapStatus] {
        use SwapStatus::*;
        match self {
            Pending => &[Approved, Rejected, Cancelled],
            Approved | Rejected | Cancelled => &[],
        }
    }

    pub fn validate_transition(&self, to: SwapStatus) -> Result<(), CoreError> {
        if self.valid_transitions().contains(&to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition(format!(
                "Swap request cannot move from {} to {}",
                self.as_str(),
                to.as_str()
            )))
        }
    }
}

/// Validate that two assignments may be offered for a swap.
pub fn validate_swap_pair(
    requester_employee: DbId,
    target_employee: DbId,
) -> Result<(), CoreError> {
    if requester_employee == target_employee {
        return Err(CoreError::Validation(
            "Cannot swap two assignments of the same employee".into(),
        ));
    }
    Ok(())
}
