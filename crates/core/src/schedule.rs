//! Schedule lifecycle machine and bulk assignment expansion.
//!
//! Only DRAFT schedules are mutable; publishing freezes the structure, after
//! which individual assignments may only be cancelled. ARCHIVED and
//! CANCELLED are terminal.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Status machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStatus {
    Draft,
    Published,
    Archived,
    Cancelled,
}

impl ScheduleStatus {
    pub fn parse(s: &str) -> Option<ScheduleStatus> {
        match s {
            "DRAFT" => Some(ScheduleStatus::Draft),
            "PUBLISHED" => Some(ScheduleStatus::Published),
            "ARCHIVED" => Some(ScheduleStatus::Archived),
            "CANCELLED" => Some(ScheduleStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Draft => "DRAFT",
            ScheduleStatus::Published => "PUBLISHED",
            ScheduleStatus::Archived => "ARCHIVED",
            ScheduleStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn valid_transitions(&self) -> &'static [ScheduleStatus] {
        use ScheduleStatus::*;
        match self {
            Draft => &[Published, Cancelled],
            Published => &[Archived, Cancelled],
            Archived | Cancelled => &[],
        }
    }

    pub fn can_transition(&self, to: ScheduleStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    pub fn validate_transition(&self, to: ScheduleStatus) -> Result<(), CoreError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition(format!(
                "Schedule cannot move from {} to {}",
                self.as_str(),
                to.as_str()
            )))
        }
    }

    /// Structural edits (and deletion) are only allowed while DRAFT.
    pub fn is_editable(&self) -> bool {
        matches!(self, ScheduleStatus::Draft)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleType {
    Weekly,
    Monthly,
    Custom,
}

impl ScheduleType {
    pub fn parse(s: &str) -> Option<ScheduleType> {
        match s {
            "WEEKLY" => Some(ScheduleType::Weekly),
            "MONTHLY" => Some(ScheduleType::Monthly),
            "CUSTOM" => Some(ScheduleType::Custom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Weekly => "WEEKLY",
            ScheduleType::Monthly => "MONTHLY",
            ScheduleType::Custom => "CUSTOM",
        }
    }
}

// ---------------------------------------------------------------------------
// Bulk expansion
// ---------------------------------------------------------------------------

/// One rule of a template-to-weekday mapping: employee works `template_id`
/// shifts on every `weekday` inside the schedule's date range.
#[derive(Debug, Clone, Copy)]
pub struct WeekdayRule {
    pub employee_id: DbId,
    pub template_id: DbId,
    pub weekday: Weekday,
}

/// A concrete dated assignment produced by expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedAssignment {
    pub employee_id: DbId,
    pub template_id: DbId,
    pub date: NaiveDate,
}

/// Expand weekday rules over an inclusive date range.
///
/// Dates are emitted in ascending order, rules in their given order within a
/// date, so the output is deterministic for a given input.
pub fn expand_range(
    start: NaiveDate,
    end: NaiveDate,
    rules: &[WeekdayRule],
) -> Result<Vec<PlannedAssignment>, CoreError> {
    if end < start {
        return Err(CoreError::Validation(format!(
            "Schedule end {end} precedes start {start}"
        )));
    }
    let mut out = Vec::new();
    let mut date = start;
    while date <= end {
        for rule in rules {
            if rule.weekday == date.weekday() {
                out.push(PlannedAssignment {
                    employee_id: rule.employee_id,
                    template_id: rule.template_id,
                    date,
                });
            }
        }
        date = match date.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(out)
}

/// Inclusive date range of the week starting at `start` (seven days).
pub fn weekly_range(start: NaiveDate) -> (NaiveDate, NaiveDate) {
    (start, start + Days::new(6))
}

/// Inclusive date range of the calendar month containing `any_day`.
pub fn monthly_range(any_day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = any_day.with_day(1).expect("day 1 always exists");
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
    .expect("first of month always exists");
    (first, next_month.pred_opt().expect("month has a last day"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // -----------------------------------------------------------------------
    // Status machine
    // -----------------------------------------------------------------------

    #[test]
    fn draft_can_publish_or_cancel() {
        assert!(ScheduleStatus::Draft.can_transition(ScheduleStatus::Published));
        assert!(ScheduleStatus::Draft.can_transition(ScheduleStatus::Cancelled));
        assert!(!ScheduleStatus::Draft.can_transition(ScheduleStatus::Archived));
    }

    #[test]
    fn published_can_archive_or_cancel() {
        assert!(ScheduleStatus::Published.can_transition(ScheduleStatus::Archived));
        assert!(ScheduleStatus::Published.can_transition(ScheduleStatus::Cancelled));
        assert!(!ScheduleStatus::Published.can_transition(ScheduleStatus::Draft));
    }

    #[test]
    fn archived_and_cancelled_are_terminal() {
        assert!(ScheduleStatus::Archived.valid_transitions().is_empty());
        assert!(ScheduleStatus::Cancelled.valid_transitions().is_empty());
    }

    #[test]
    fn only_draft_is_editable() {
        assert!(ScheduleStatus::Draft.is_editable());
        assert!(!ScheduleStatus::Published.is_editable());
        assert!(!ScheduleStatus::Archived.is_editable());
        assert!(!ScheduleStatus::Cancelled.is_editable());
    }

    // -----------------------------------------------------------------------
    // Expansion
    // -----------------------------------------------------------------------

    #[test]
    fn expands_each_matching_weekday() {
        // 2024-03-04 is a Monday.
        let rules = [
            WeekdayRule {
                employee_id: 1,
                template_id: 10,
                weekday: Weekday::Mon,
            },
            WeekdayRule {
                employee_id: 1,
                template_id: 11,
                weekday: Weekday::Wed,
            },
        ];
        let (start, end) = weekly_range(d(2024, 3, 4));
        let planned = expand_range(start, end, &rules).unwrap();
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].date, d(2024, 3, 4));
        assert_eq!(planned[0].template_id, 10);
        assert_eq!(planned[1].date, d(2024, 3, 6));
        assert_eq!(planned[1].template_id, 11);
    }

    #[test]
    fn monthly_range_covers_whole_month() {
        let (start, end) = monthly_range(d(2024, 2, 14));
        assert_eq!(start, d(2024, 2, 1));
        assert_eq!(end, d(2024, 2, 29)); // leap year

        let (start, end) = monthly_range(d(2023, 12, 25));
        assert_eq!(start, d(2023, 12, 1));
        assert_eq!(end, d(2023, 12, 31));
    }

    #[test]
    fn expansion_rejects_inverted_range() {
        assert!(expand_range(d(2024, 3, 10), d(2024, 3, 1), &[]).is_err());
    }

    #[test]
    fn same_weekday_repeats_across_month() {
        let rules = [WeekdayRule {
            employee_id: 2,
            template_id: 10,
            weekday: Weekday::Fri,
        }];
        let (start, end) = monthly_range(d(2024, 3, 1));
        let planned = expand_range(start, end, &rules).unwrap();
        // March 2024 has five Fridays.
        assert_eq!(planned.len(), 5);
        assert!(planned.iter().all(|p| p.employee_id == 2));
    }
}
