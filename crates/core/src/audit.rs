//! Audit logging constants and integrity hashing.
//!
//! Every state transition is recorded with actor, action, and entity; the
//! entries form a SHA-256 hash chain so tampering with a stored row breaks
//! verification of everything after it.

use crate::hashing;

// ---------------------------------------------------------------------------
// Action type constants
// ---------------------------------------------------------------------------

/// Known action types for audit log entries.
pub mod action_types {
    pub const ASSIGNMENT_CREATE: &str = "assignment_create";
    pub const ASSIGNMENT_CHECK_IN: &str = "assignment_check_in";
    pub const ASSIGNMENT_CHECK_OUT: &str = "assignment_check_out";
    pub const ASSIGNMENT_CANCEL: &str = "assignment_cancel";
    pub const ASSIGNMENT_NO_SHOW: &str = "assignment_no_show";
    pub const SCHEDULE_PUBLISH: &str = "schedule_publish";
    pub const SCHEDULE_ARCHIVE: &str = "schedule_archive";
    pub const SCHEDULE_CANCEL: &str = "schedule_cancel";
    pub const VIOLATION_DETECT: &str = "violation_detect";
    pub const VIOLATION_RESOLVE: &str = "violation_resolve";
    pub const VIOLATION_ESCALATE: &str = "violation_escalate";
    pub const EXPLANATION_SUBMIT: &str = "explanation_submit";
    pub const EXPLANATION_REVIEW: &str = "explanation_review";
    pub const EVIDENCE_VERIFY: &str = "evidence_verify";
    pub const SWAP_REQUEST: &str = "swap_request";
    pub const SWAP_DECIDE: &str = "swap_decide";
    pub const PAYROLL_CALCULATE: &str = "payroll_calculate";
    pub const PAYROLL_APPROVE: &str = "payroll_approve";
    pub const PAYROLL_PAID: &str = "payroll_paid";
    pub const PAYROLL_CANCEL: &str = "payroll_cancel";
    pub const SWEEP: &str = "sweep";
}

// ---------------------------------------------------------------------------
// Log category constants
// ---------------------------------------------------------------------------

/// Known log categories for retention and reporting.
pub mod log_categories {
    pub const SCHEDULING: &str = "scheduling";
    pub const ATTENDANCE: &str = "attendance";
    pub const PAYROLL: &str = "payroll";
    pub const SYSTEM: &str = "system";
}

/// Map an action type to its log category. Unknown actions default to
/// `"system"`.
pub fn action_to_category(action_type: &str) -> &'static str {
    use action_types::*;
    match action_type {
        ASSIGNMENT_CREATE | ASSIGNMENT_CHECK_IN | ASSIGNMENT_CHECK_OUT | ASSIGNMENT_CANCEL
        | ASSIGNMENT_NO_SHOW | SCHEDULE_PUBLISH | SCHEDULE_ARCHIVE | SCHEDULE_CANCEL
        | SWAP_REQUEST | SWAP_DECIDE => log_categories::SCHEDULING,
        VIOLATION_DETECT | VIOLATION_RESOLVE | VIOLATION_ESCALATE | EXPLANATION_SUBMIT
        | EXPLANATION_REVIEW | EVIDENCE_VERIFY => log_categories::ATTENDANCE,
        PAYROLL_CALCULATE | PAYROLL_APPROVE | PAYROLL_PAID | PAYROLL_CANCEL => {
            log_categories::PAYROLL
        }
        _ => log_categories::SYSTEM,
    }
}

// ---------------------------------------------------------------------------
// Integrity hash computation
// ---------------------------------------------------------------------------

/// Known seed value for the first entry in the hash chain.
const CHAIN_SEED: &str = "STAFFHUB_AUDIT_CHAIN_SEED_V1";

/// Compute the SHA-256 integrity hash for an audit log entry.
///
/// `prev_hash` is the integrity hash of the previous entry, or `None` for
/// the first entry in the chain. `entry_data` is a canonical string
/// representation of the entry's content.
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let combined = format!("{prev}|{entry_data}");
    hashing::sha256_hex(combined.as_bytes())
}

/// Verify a chain of `(entry_data, stored_hash)` pairs in order.
///
/// Returns the index of the first entry whose stored hash does not match
/// the recomputed value, or `None` when the whole chain verifies.
pub fn verify_chain(entries: &[(String, String)]) -> Option<usize> {
    let mut prev: Option<&str> = None;
    for (i, (data, stored)) in entries.iter().enumerate() {
        let expected = compute_integrity_hash(prev, data);
        if &expected != stored {
            return Some(i);
        }
        prev = Some(stored);
    }
    None
}
