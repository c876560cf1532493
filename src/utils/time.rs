use std::fmt::Display;

use chrono::{DateTime, Duration, NaiveDate, TimeZone};

/// This is the standard way of converting a date to a string in checkin.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Formats the wall-clock time of `moment` in its own timezone.
pub fn format_time_of_day<Tz: TimeZone>(moment: DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    moment.format("%H:%M").to_string()
}

/// Converts a duration in hours into a chrono duration, rounded to whole
/// milliseconds.
pub fn hours_to_duration(hours: f64) -> Duration {
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

/// Converts a chrono duration back into fractional hours.
pub fn duration_to_hours(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}
