//! Time-window arithmetic for planned shifts.
//!
//! Windows are half-open `[start, end)` within a single day: two windows
//! conflict iff `a.start < b.end && b.start < a.end`, so back-to-back
//! shifts that touch at a boundary do not conflict.

use chrono::{NaiveDate, NaiveTime};

use crate::error::CoreError;
use crate::types::Timestamp;

/// A half-open `[start, end)` time window within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Build a window, rejecting `start >= end` (windows never span midnight).
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<TimeWindow, CoreError> {
        if start >= end {
            return Err(CoreError::Validation(format!(
                "Window start {start} must be before end {end}"
            )));
        }
        Ok(TimeWindow { start, end })
    }

    /// Half-open overlap test. Touching boundaries do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Window length in whole minutes.
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Whether an inclusive `[start, end]` absence date range covers `date`.
///
/// An approved absence covering the date is treated as a full-day conflict,
/// regardless of the proposed window's times.
pub fn absence_covers(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    start <= date && date <= end
}

/// Minutes actually worked between check-in and check-out, minus the
/// template's break when one is defined. Never negative.
pub fn worked_minutes(check_in: Timestamp, check_out: Timestamp, break_minutes: i32) -> i64 {
    let raw = (check_out - check_in).num_minutes() - i64::from(break_minutes);
    raw.max(0)
}

/// Regular/overtime split of a worked duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteSplit {
    pub regular: i64,
    pub overtime: i64,
}

/// Split `worked` minutes against the template's regular minutes.
///
/// Overtime accrues only past the template's regular length and only when
/// the template is overtime-eligible; otherwise every minute is regular.
pub fn split_overtime(worked: i64, template_regular: i64, overtime_eligible: bool) -> MinuteSplit {
    let overtime = if overtime_eligible {
        (worked - template_regular).max(0)
    } else {
        0
    };
    MinuteSplit {
        regular: worked - overtime,
        overtime,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn window(h1: u32, m1: u32, h2: u32, m2: u32) -> TimeWindow {
        TimeWindow::new(t(h1, m1), t(h2, m2)).unwrap()
    }

    // -----------------------------------------------------------------------
    // Window construction
    // -----------------------------------------------------------------------

    #[test]
    fn start_must_precede_end() {
        assert!(TimeWindow::new(t(9, 0), t(8, 0)).is_err());
        assert!(TimeWindow::new(t(9, 0), t(9, 0)).is_err());
        assert!(TimeWindow::new(t(8, 0), t(9, 0)).is_ok());
    }

    // -----------------------------------------------------------------------
    // Overlap rule
    // -----------------------------------------------------------------------

    #[test]
    fn touching_boundaries_do_not_overlap() {
        let morning = window(8, 0, 12, 0);
        let afternoon = window(12, 0, 16, 0);
        assert!(!morning.overlaps(&afternoon));
        assert!(!afternoon.overlaps(&morning));
    }

    #[test]
    fn straddling_window_overlaps_both() {
        let morning = window(8, 0, 12, 0);
        let afternoon = window(12, 0, 16, 0);
        let straddle = window(11, 0, 13, 0);
        assert!(straddle.overlaps(&morning));
        assert!(straddle.overlaps(&afternoon));
    }

    #[test]
    fn contained_window_overlaps() {
        let outer = window(8, 0, 16, 0);
        let inner = window(10, 0, 11, 0);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn disjoint_windows_do_not_overlap() {
        assert!(!window(8, 0, 10, 0).overlaps(&window(11, 0, 12, 0)));
    }

    #[test]
    fn window_length() {
        assert_eq!(window(8, 0, 16, 0).minutes(), 480);
        assert_eq!(window(8, 30, 9, 0).minutes(), 30);
    }

    // -----------------------------------------------------------------------
    // Absence coverage
    // -----------------------------------------------------------------------

    #[test]
    fn absence_range_is_inclusive() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        assert!(absence_covers(d(1), d(1), d(3)));
        assert!(absence_covers(d(3), d(1), d(3)));
        assert!(!absence_covers(d(4), d(1), d(3)));
    }

    // -----------------------------------------------------------------------
    // Worked minutes and overtime split
    // -----------------------------------------------------------------------

    #[test]
    fn worked_minutes_subtracts_break() {
        let check_in = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let check_out = Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap();
        assert_eq!(worked_minutes(check_in, check_out, 0), 480);
        assert_eq!(worked_minutes(check_in, check_out, 60), 420);
    }

    #[test]
    fn worked_minutes_never_negative() {
        let check_in = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let check_out = Utc.with_ymd_and_hms(2024, 3, 1, 8, 10, 0).unwrap();
        assert_eq!(worked_minutes(check_in, check_out, 30), 0);
    }

    #[test]
    fn overtime_only_when_eligible() {
        let split = split_overtime(540, 480, true);
        assert_eq!(split.regular, 480);
        assert_eq!(split.overtime, 60);

        let split = split_overtime(540, 480, false);
        assert_eq!(split.regular, 540);
        assert_eq!(split.overtime, 0);
    }

    #[test]
    fn under_regular_length_is_all_regular() {
        let split = split_overtime(400, 480, true);
        assert_eq!(split.regular, 400);
        assert_eq!(split.overtime, 0);
    }
}
