//! Attendance violation vocabulary, status machine, and detection rules.
//!
//! Detection is a pure function over a completed/no-show assignment snapshot
//! so it can be exercised without a database. Idempotence (at most one
//! violation per assignment per rule) is enforced by the repository's unique
//! constraint; re-running detection over the same inputs yields the same
//! rule hits.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

use crate::assignment::AssignmentStatus;
use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationType {
    Late,
    Absent,
    EarlyLeave,
    NoShow,
}

impl ViolationType {
    pub fn parse(s: &str) -> Option<ViolationType> {
        match s {
            "LATE" => Some(ViolationType::Late),
            "ABSENT" => Some(ViolationType::Absent),
            "EARLY_LEAVE" => Some(ViolationType::EarlyLeave),
            "NO_SHOW" => Some(ViolationType::NoShow),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::Late => "LATE",
            ViolationType::Absent => "ABSENT",
            ViolationType::EarlyLeave => "EARLY_LEAVE",
            ViolationType::NoShow => "NO_SHOW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationSeverity {
    Minor,
    Moderate,
    Serious,
}

impl ViolationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationSeverity::Minor => "MINOR",
            ViolationSeverity::Moderate => "MODERATE",
            ViolationSeverity::Serious => "SERIOUS",
        }
    }

    pub fn parse(s: &str) -> Option<ViolationSeverity> {
        match s {
            "MINOR" => Some(ViolationSeverity::Minor),
            "MODERATE" => Some(ViolationSeverity::Moderate),
            "SERIOUS" => Some(ViolationSeverity::Serious),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Status machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationStatus {
    Open,
    PendingExplanation,
    PendingReview,
    Resolved,
    Escalated,
}

impl ViolationStatus {
    pub fn parse(s: &str) -> Option<ViolationStatus> {
        match s {
            "OPEN" => Some(ViolationStatus::Open),
            "PENDING_EXPLANATION" => Some(ViolationStatus::PendingExplanation),
            "PENDING_REVIEW" => Some(ViolationStatus::PendingReview),
            "RESOLVED" => Some(ViolationStatus::Resolved),
            "ESCALATED" => Some(ViolationStatus::Escalated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationStatus::Open => "OPEN",
            ViolationStatus::PendingExplanation => "PENDING_EXPLANATION",
            ViolationStatus::PendingReview => "PENDING_REVIEW",
            ViolationStatus::Resolved => "RESOLVED",
            ViolationStatus::Escalated => "ESCALATED",
        }
    }

    /// Valid target statuses reachable from `self`.
    ///
    /// An explanation may arrive before the violation was surfaced, so OPEN
    /// can reach PENDING_REVIEW directly. Rejection and needs-more-info send
    /// a violation back to PENDING_EXPLANATION so the employee can resubmit;
    /// RESOLVED is terminal.
    pub fn valid_transitions(&self) -> &'static [ViolationStatus] {
        use ViolationStatus::*;
        match self {
            Open => &[PendingExplanation, PendingReview, Resolved, Escalated],
            PendingExplanation => &[PendingReview, Resolved, Escalated],
            PendingReview => &[PendingExplanation, Resolved, Escalated],
            Escalated => &[Resolved],
            Resolved => &[],
        }
    }

    pub fn can_transition(&self, to: ViolationStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    pub fn validate_transition(&self, to: ViolationStatus) -> Result<(), CoreError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition(format!(
                "Violation cannot move from {} to {}",
                self.as_str(),
                to.as_str()
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Tolerances and severity thresholds used by detection.
#[derive(Debug, Clone, Copy)]
pub struct DetectionPolicy {
    pub late_tolerance_minutes: i64,
    pub early_leave_tolerance_minutes: i64,
    /// Deviations at or past this are MODERATE.
    pub moderate_threshold_minutes: i64,
    /// Deviations at or past this are SERIOUS.
    pub serious_threshold_minutes: i64,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        DetectionPolicy {
            late_tolerance_minutes: 10,
            early_leave_tolerance_minutes: 10,
            moderate_threshold_minutes: 30,
            serious_threshold_minutes: 120,
        }
    }
}

impl DetectionPolicy {
    pub fn severity(&self, deviation_minutes: i64) -> ViolationSeverity {
        if deviation_minutes >= self.serious_threshold_minutes {
            ViolationSeverity::Serious
        } else if deviation_minutes >= self.moderate_threshold_minutes {
            ViolationSeverity::Moderate
        } else {
            ViolationSeverity::Minor
        }
    }
}

/// The slice of an assignment that detection needs.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentSnapshot {
    pub status: AssignmentStatus,
    pub date: NaiveDate,
    pub planned_start: NaiveTime,
    pub planned_end: NaiveTime,
    pub check_in: Option<Timestamp>,
    pub check_out: Option<Timestamp>,
}

/// One rule hit produced by detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedViolation {
    pub violation_type: ViolationType,
    pub deviation_minutes: i64,
    pub severity: ViolationSeverity,
}

/// Run the detection rules over one assignment.
///
/// Only COMPLETED and NO_SHOW assignments produce violations; everything
/// else returns an empty set. A NO_SHOW assignment yields one ABSENT
/// violation charged with the full planned window.
pub fn detect(snapshot: &AssignmentSnapshot, policy: &DetectionPolicy) -> Vec<DetectedViolation> {
    let mut hits = Vec::new();
    let planned_minutes = (snapshot.planned_end - snapshot.planned_start).num_minutes();

    match snapshot.status {
        AssignmentStatus::NoShow => {
            hits.push(DetectedViolation {
                violation_type: ViolationType::Absent,
                deviation_minutes: planned_minutes,
                severity: policy.severity(planned_minutes),
            });
        }
        AssignmentStatus::Completed => {
            if let Some(check_in) = snapshot.check_in {
                let planned_start = Utc
                    .from_utc_datetime(&snapshot.date.and_time(snapshot.planned_start));
                let late_by = (check_in - planned_start).num_minutes();
                if late_by > policy.late_tolerance_minutes {
                    hits.push(DetectedViolation {
                        violation_type: ViolationType::Late,
                        deviation_minutes: late_by,
                        severity: policy.severity(late_by),
                    });
                }
            }
            if let Some(check_out) = snapshot.check_out {
                let planned_end =
                    Utc.from_utc_datetime(&snapshot.date.and_time(snapshot.planned_end));
                let early_by = (planned_end - check_out).num_minutes();
                if early_by > policy.early_leave_tolerance_minutes {
                    hits.push(DetectedViolation {
                        violation_type: ViolationType::EarlyLeave,
                        deviation_minutes: early_by,
                        severity: policy.severity(early_by),
                    });
                }
            }
        }
        _ => {}
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(h: u32, m: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    fn completed(check_in: Timestamp, check_out: Timestamp) -> AssignmentSnapshot {
        AssignmentSnapshot {
            status: AssignmentStatus::Completed,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            planned_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            planned_end: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            check_in: Some(check_in),
            check_out: Some(check_out),
        }
    }

    // -----------------------------------------------------------------------
    // Detection rules
    // -----------------------------------------------------------------------

    #[test]
    fn late_check_in_past_tolerance_is_flagged() {
        let policy = DetectionPolicy::default();
        let hits = detect(&completed(ts(8, 20), ts(16, 0)), &policy);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].violation_type, ViolationType::Late);
        assert_eq!(hits[0].deviation_minutes, 20);
    }

    #[test]
    fn check_in_within_tolerance_is_clean() {
        let policy = DetectionPolicy::default();
        let hits = detect(&completed(ts(8, 10), ts(16, 0)), &policy);
        assert!(hits.is_empty());
    }

    #[test]
    fn early_leave_past_tolerance_is_flagged() {
        let policy = DetectionPolicy::default();
        let hits = detect(&completed(ts(8, 0), ts(15, 30)), &policy);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].violation_type, ViolationType::EarlyLeave);
        assert_eq!(hits[0].deviation_minutes, 30);
        assert_eq!(hits[0].severity, ViolationSeverity::Moderate);
    }

    #[test]
    fn late_and_early_can_both_fire() {
        let policy = DetectionPolicy::default();
        let hits = detect(&completed(ts(9, 0), ts(14, 0)), &policy);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].violation_type, ViolationType::Late);
        assert_eq!(hits[1].violation_type, ViolationType::EarlyLeave);
    }

    #[test]
    fn no_show_yields_absent_for_full_window() {
        let policy = DetectionPolicy::default();
        let snapshot = AssignmentSnapshot {
            status: AssignmentStatus::NoShow,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            planned_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            planned_end: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            check_in: None,
            check_out: None,
        };
        let hits = detect(&snapshot, &policy);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].violation_type, ViolationType::Absent);
        assert_eq!(hits[0].deviation_minutes, 480);
        assert_eq!(hits[0].severity, ViolationSeverity::Serious);
    }

    #[test]
    fn non_terminal_assignments_are_skipped() {
        let policy = DetectionPolicy::default();
        let mut snapshot = completed(ts(9, 0), ts(14, 0));
        snapshot.status = AssignmentStatus::CheckedIn;
        assert!(detect(&snapshot, &policy).is_empty());
        snapshot.status = AssignmentStatus::Cancelled;
        assert!(detect(&snapshot, &policy).is_empty());
    }

    #[test]
    fn detection_is_deterministic() {
        let policy = DetectionPolicy::default();
        let snapshot = completed(ts(8, 20), ts(16, 0));
        assert_eq!(detect(&snapshot, &policy), detect(&snapshot, &policy));
    }

    // -----------------------------------------------------------------------
    // Severity thresholds
    // -----------------------------------------------------------------------

    #[test]
    fn severity_follows_thresholds() {
        let policy = DetectionPolicy::default();
        assert_eq!(policy.severity(15), ViolationSeverity::Minor);
        assert_eq!(policy.severity(30), ViolationSeverity::Moderate);
        assert_eq!(policy.severity(120), ViolationSeverity::Serious);
    }

    // -----------------------------------------------------------------------
    // Status machine
    // -----------------------------------------------------------------------

    #[test]
    fn open_violation_can_request_explanation() {
        assert!(ViolationStatus::Open.can_transition(ViolationStatus::PendingExplanation));
    }

    #[test]
    fn open_violation_accepts_direct_submission() {
        assert!(ViolationStatus::Open.can_transition(ViolationStatus::PendingReview));
    }

    #[test]
    fn rejection_returns_to_pending_explanation() {
        assert!(
            ViolationStatus::PendingReview.can_transition(ViolationStatus::PendingExplanation)
        );
    }

    #[test]
    fn resolved_is_terminal() {
        assert!(ViolationStatus::Resolved.valid_transitions().is_empty());
    }

    #[test]
    fn escalated_can_only_resolve() {
        assert_eq!(
            ViolationStatus::Escalated.valid_transitions(),
            &[ViolationStatus::Resolved]
        );
    }

    #[test]
    fn invalid_transition_is_typed() {
        let err = ViolationStatus::Resolved
            .validate_transition(ViolationStatus::Open)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition(_)));
    }
}
