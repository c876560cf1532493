//! Start time, end time, and duration are three views of the same span, and
//! editing any one of them has to keep the other two coherent. This is the
//! whole binding as one pure function, kept away from any form handling.

use chrono::NaiveTime;

use crate::utils::time::{duration_to_hours, hours_to_duration};

/// Which of the three bound fields the user just edited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditedField {
    StartTime,
    EndTime,
    Duration,
}

/// Recomputes `(start, end, duration)` after one field changed.
///
/// Clamping rules:
/// - end can never precede start; the edited endpoint wins and the other one
///   is clamped onto it, which can collapse the span to zero hours;
/// - editing the duration recomputes end from start (wrapping on the clock
///   face past midnight);
/// - a non-finite or negative duration input is treated as zero.
///
/// A collapsed span means `duration == 0.0`, which the store's validation
/// rejects on submit. That is intentional: reconciliation keeps the form
/// coherent, validation decides what may be saved.
pub fn reconcile(
    start: NaiveTime,
    end: NaiveTime,
    duration: f64,
    edited: EditedField,
) -> (NaiveTime, NaiveTime, f64) {
    match edited {
        EditedField::StartTime => {
            let start = if start > end { end } else { start };
            (start, end, hours_between(start, end))
        }
        EditedField::EndTime => {
            let end = if end < start { start } else { end };
            (start, end, hours_between(start, end))
        }
        EditedField::Duration => {
            let duration = if duration.is_finite() && duration > 0.0 {
                duration
            } else {
                0.0
            };
            let end = start + hours_to_duration(duration);
            (start, end, duration)
        }
    }
}

fn hours_between(start: NaiveTime, end: NaiveTime) -> f64 {
    duration_to_hours(end - start)
}
