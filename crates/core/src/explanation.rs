//! Explanation submission and review workflow.
//!
//! A violation accumulates explanations over time; at most one may be
//! pending (SUBMITTED or NEEDS_MORE_INFO) at any moment, and only the
//! latest explanation is authoritative for payroll impact.

use crate::error::CoreError;
use crate::violation::ViolationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationStatus {
    Submitted,
    Approved,
    Rejected,
    NeedsMoreInfo,
}

impl ExplanationStatus {
    pub fn parse(s: &str) -> Option<ExplanationStatus> {
        match s {
            "SUBMITTED" => Some(ExplanationStatus::Submitted),
            "APPROVED" => Some(ExplanationStatus::Approved),
            "REJECTED" => Some(ExplanationStatus::Rejected),
            "NEEDS_MORE_INFO" => Some(ExplanationStatus::NeedsMoreInfo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExplanationStatus::Submitted => "SUBMITTED",
            ExplanationStatus::Approved => "APPROVED",
            ExplanationStatus::Rejected => "REJECTED",
            ExplanationStatus::NeedsMoreInfo => "NEEDS_MORE_INFO",
        }
    }

    /// An explanation still awaiting a decision.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            ExplanationStatus::Submitted | ExplanationStatus::NeedsMoreInfo
        )
    }

    /// Deletion is only permitted before any reviewer has decided.
    pub fn is_deletable(&self) -> bool {
        self.is_pending()
    }
}

/// A reviewer's decision on a submitted explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
    NeedsMoreInfo,
}

impl ReviewDecision {
    /// The explanation status this decision produces.
    pub fn explanation_status(&self) -> ExplanationStatus {
        match self {
            ReviewDecision::Approve => ExplanationStatus::Approved,
            ReviewDecision::Reject => ExplanationStatus::Rejected,
            ReviewDecision::NeedsMoreInfo => ExplanationStatus::NeedsMoreInfo,
        }
    }

    /// The violation status this decision produces.
    ///
    /// Approval resolves the violation; rejection and needs-more-info hand
    /// it back to the employee (the violation stays chargeable until an
    /// approval lands).
    pub fn violation_status(&self) -> ViolationStatus {
        match self {
            ReviewDecision::Approve => ViolationStatus::Resolved,
            ReviewDecision::Reject => ViolationStatus::PendingExplanation,
            ReviewDecision::NeedsMoreInfo => ViolationStatus::PendingExplanation,
        }
    }

    /// Reject requires reviewer notes; the others may omit them.
    pub fn requires_notes(&self) -> bool {
        matches!(self, ReviewDecision::Reject)
    }
}

/// Validate that an explanation in `status` can still be reviewed.
pub fn validate_reviewable(status: ExplanationStatus) -> Result<(), CoreError> {
    if status == ExplanationStatus::Submitted {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition(format!(
            "Explanation in {} cannot be reviewed",
            status.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_statuses() {
        assert!(ExplanationStatus::Submitted.is_pending());
        assert!(ExplanationStatus::NeedsMoreInfo.is_pending());
        assert!(!ExplanationStatus::Approved.is_pending());
        assert!(!ExplanationStatus::Rejected.is_pending());
    }

    #[test]
    fn only_undecided_explanations_are_deletable() {
        assert!(ExplanationStatus::Submitted.is_deletable());
        assert!(ExplanationStatus::NeedsMoreInfo.is_deletable());
        assert!(!ExplanationStatus::Approved.is_deletable());
        assert!(!ExplanationStatus::Rejected.is_deletable());
    }

    #[test]
    fn approval_resolves_violation() {
        assert_eq!(
            ReviewDecision::Approve.explanation_status(),
            ExplanationStatus::Approved
        );
        assert_eq!(
            ReviewDecision::Approve.violation_status(),
            ViolationStatus::Resolved
        );
    }

    #[test]
    fn rejection_hands_violation_back() {
        assert_eq!(
            ReviewDecision::Reject.violation_status(),
            ViolationStatus::PendingExplanation
        );
        assert!(ReviewDecision::Reject.requires_notes());
    }

    #[test]
    fn needs_more_info_hands_violation_back() {
        assert_eq!(
            ReviewDecision::NeedsMoreInfo.violation_status(),
            ViolationStatus::PendingExplanation
        );
        assert!(!ReviewDecision::NeedsMoreInfo.requires_notes());
    }

    #[test]
    fn only_submitted_explanations_are_reviewable() {
        assert!(validate_reviewable(ExplanationStatus::Submitted).is_ok());
        assert!(validate_reviewable(ExplanationStatus::Approved).is_err());
        assert!(validate_reviewable(ExplanationStatus::NeedsMoreInfo).is_err());
    }

    #[test]
    fn status_names_round_trip() {
        for status in [
            ExplanationStatus::Submitted,
            ExplanationStatus::Approved,
            ExplanationStatus::Rejected,
            ExplanationStatus::NeedsMoreInfo,
        ] {
            assert_eq!(ExplanationStatus::parse(status.as_str()), Some(status));
        }
    }
}
