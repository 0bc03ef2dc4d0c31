//! Shift template validation rules.

use chrono::NaiveTime;

use crate::error::CoreError;
use crate::shift_time::TimeWindow;

/// Validate a template's time shape.
///
/// Templates never span midnight, so `start < end` within one day. A break,
/// when present, must be strictly shorter than the window itself.
pub fn validate_shape(
    start: NaiveTime,
    end: NaiveTime,
    has_break: bool,
    break_minutes: Option<i32>,
) -> Result<(), CoreError> {
    let window = TimeWindow::new(start, end)?;
    if has_break {
        let span = window.minutes();
        match break_minutes {
            None => {
                return Err(CoreError::Validation(
                    "Template declares a break but no break minutes".into(),
                ))
            }
            Some(b) if b <= 0 => {
                return Err(CoreError::Validation(
                    "Break minutes must be positive".into(),
                ))
            }
            Some(b) if i64::from(b) >= span => {
                return Err(CoreError::Validation(format!(
                    "Break of {b} minutes does not fit in a {span}-minute shift"
                )))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Working minutes a template plans for, net of its break.
pub fn regular_minutes(
    start: NaiveTime,
    end: NaiveTime,
    has_break: bool,
    break_minutes: Option<i32>,
) -> i64 {
    let span = (end - start).num_minutes();
    if has_break {
        span - i64::from(break_minutes.unwrap_or(0))
    } else {
        span
    }
}
