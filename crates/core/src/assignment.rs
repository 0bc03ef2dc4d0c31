//! Shift assignment status machine and check-out arithmetic.
//!
//! The lifecycle is `SCHEDULED -> CHECKED_IN -> CHECKED_OUT -> COMPLETED`,
//! with `NO_SHOW` reached from `SCHEDULED` by the grace-deadline sweep and
//! `CANCELLED` reachable from any non-terminal state. Assignments are never
//! physically deleted once checked in; cancellation is the only exit.

use crate::error::CoreError;
use crate::shift_time::{self, MinuteSplit};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Status machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStatus {
    Scheduled,
    CheckedIn,
    CheckedOut,
    Completed,
    Cancelled,
    NoShow,
}

impl AssignmentStatus {
    pub fn parse(s: &str) -> Option<AssignmentStatus> {
        match s {
            "SCHEDULED" => Some(AssignmentStatus::Scheduled),
            "CHECKED_IN" => Some(AssignmentStatus::CheckedIn),
            "CHECKED_OUT" => Some(AssignmentStatus::CheckedOut),
            "COMPLETED" => Some(AssignmentStatus::Completed),
            "CANCELLED" => Some(AssignmentStatus::Cancelled),
            "NO_SHOW" => Some(AssignmentStatus::NoShow),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Scheduled => "SCHEDULED",
            AssignmentStatus::CheckedIn => "CHECKED_IN",
            AssignmentStatus::CheckedOut => "CHECKED_OUT",
            AssignmentStatus::Completed => "COMPLETED",
            AssignmentStatus::Cancelled => "CANCELLED",
            AssignmentStatus::NoShow => "NO_SHOW",
        }
    }

    /// Valid target statuses reachable from `self`.
    ///
    /// Terminal states (Completed, Cancelled, NoShow) return an empty slice.
    pub fn valid_transitions(&self) -> &'static [AssignmentStatus] {
        use AssignmentStatus::*;
        match self {
            Scheduled => &[CheckedIn, NoShow, Cancelled],
            CheckedIn => &[CheckedOut, Cancelled],
            CheckedOut => &[Completed, Cancelled],
            Completed | Cancelled | NoShow => &[],
        }
    }

    pub fn can_transition(&self, to: AssignmentStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Validate a transition, producing a typed error for invalid ones.
    pub fn validate_transition(&self, to: AssignmentStatus) -> Result<(), CoreError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition(format!(
                "Assignment cannot move from {} to {}",
                self.as_str(),
                to.as_str()
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Check-out computation
// ---------------------------------------------------------------------------

/// Derived figures produced when a shift is closed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOut {
    pub worked_minutes: i64,
    pub regular_minutes: i64,
    pub overtime_minutes: i64,
    pub is_overtime: bool,
}

/// Compute worked minutes and the overtime split at check-out time.
///
/// `template_regular` is the template's planned working minutes net of its
/// break; `break_minutes` is subtracted from the raw check-in/out span.
pub fn close_out(
    check_in: Timestamp,
    check_out: Timestamp,
    break_minutes: i32,
    template_regular: i64,
    overtime_eligible: bool,
) -> Result<CloseOut, CoreError> {
    if check_out <= check_in {
        return Err(CoreError::Validation(format!(
            "Check-out {check_out} must be after check-in {check_in}"
        )));
    }
    let worked = shift_time::worked_minutes(check_in, check_out, break_minutes);
    let MinuteSplit { regular, overtime } =
        shift_time::split_overtime(worked, template_regular, overtime_eligible);
    Ok(CloseOut {
        worked_minutes: worked,
        regular_minutes: regular,
        overtime_minutes: overtime,
        is_overtime: overtime > 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    // -----------------------------------------------------------------------
    // Valid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn scheduled_to_checked_in() {
        assert!(AssignmentStatus::Scheduled.can_transition(AssignmentStatus::CheckedIn));
    }

    #[test]
    fn scheduled_to_no_show() {
        assert!(AssignmentStatus::Scheduled.can_transition(AssignmentStatus::NoShow));
    }

    #[test]
    fn checked_in_to_checked_out() {
        assert!(AssignmentStatus::CheckedIn.can_transition(AssignmentStatus::CheckedOut));
    }

    #[test]
    fn checked_out_to_completed() {
        assert!(AssignmentStatus::CheckedOut.can_transition(AssignmentStatus::Completed));
    }

    #[test]
    fn every_non_terminal_state_can_cancel() {
        for status in [
            AssignmentStatus::Scheduled,
            AssignmentStatus::CheckedIn,
            AssignmentStatus::CheckedOut,
        ] {
            assert!(status.can_transition(AssignmentStatus::Cancelled));
        }
    }

    // -----------------------------------------------------------------------
    // Invalid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn cannot_check_out_before_check_in() {
        assert!(!AssignmentStatus::Scheduled.can_transition(AssignmentStatus::CheckedOut));
    }

    #[test]
    fn cannot_skip_to_completed() {
        assert!(!AssignmentStatus::Scheduled.can_transition(AssignmentStatus::Completed));
        assert!(!AssignmentStatus::CheckedIn.can_transition(AssignmentStatus::Completed));
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        assert!(AssignmentStatus::Completed.is_terminal());
        assert!(AssignmentStatus::Cancelled.is_terminal());
        assert!(AssignmentStatus::NoShow.is_terminal());
    }

    #[test]
    fn validate_transition_reports_both_states() {
        let err = AssignmentStatus::Completed
            .validate_transition(AssignmentStatus::CheckedIn)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("COMPLETED"));
        assert!(msg.contains("CHECKED_IN"));
    }

    // -----------------------------------------------------------------------
    // Round-trip of status names
    // -----------------------------------------------------------------------

    #[test]
    fn status_names_round_trip() {
        for status in [
            AssignmentStatus::Scheduled,
            AssignmentStatus::CheckedIn,
            AssignmentStatus::CheckedOut,
            AssignmentStatus::Completed,
            AssignmentStatus::Cancelled,
            AssignmentStatus::NoShow,
        ] {
            assert_eq!(AssignmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AssignmentStatus::parse("UNKNOWN"), None);
    }

    // -----------------------------------------------------------------------
    // Close-out arithmetic
    // -----------------------------------------------------------------------

    #[test]
    fn close_out_computes_worked_minutes() {
        let check_in = Utc.with_ymd_and_hms(2024, 3, 1, 8, 20, 0).unwrap();
        let check_out = Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap();
        let out = close_out(check_in, check_out, 0, 480, true).unwrap();
        assert_eq!(out.worked_minutes, 460);
        assert_eq!(out.regular_minutes, 460);
        assert_eq!(out.overtime_minutes, 0);
        assert!(!out.is_overtime);
    }

    #[test]
    fn close_out_flags_overtime_on_eligible_template() {
        let check_in = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let check_out = Utc.with_ymd_and_hms(2024, 3, 1, 17, 30, 0).unwrap();
        let out = close_out(check_in, check_out, 0, 480, true).unwrap();
        assert_eq!(out.worked_minutes, 570);
        assert_eq!(out.regular_minutes, 480);
        assert_eq!(out.overtime_minutes, 90);
        assert!(out.is_overtime);
    }

    #[test]
    fn close_out_ignores_overtime_when_ineligible() {
        let check_in = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let check_out = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap();
        let out = close_out(check_in, check_out, 0, 480, false).unwrap();
        assert_eq!(out.overtime_minutes, 0);
        assert!(!out.is_overtime);
    }

    #[test]
    fn close_out_subtracts_template_break() {
        let check_in = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let check_out = Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap();
        let out = close_out(check_in, check_out, 60, 420, true).unwrap();
        assert_eq!(out.worked_minutes, 420);
    }

    #[test]
    fn close_out_rejects_inverted_timestamps() {
        let check_in = Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap();
        let check_out = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        assert!(close_out(check_in, check_out, 0, 480, true).is_err());
    }
}
