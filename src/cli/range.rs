use anyhow::{anyhow, bail, Result};
use chrono::{Local, NaiveDate};
use chrono_english::{parse_date_string, Dialect};
use clap::{Args, ValueEnum};
use now::DateTimeNow;

use crate::views::DateRange;

/// Period presets mirroring the view selector: today, this week, or this
/// month, always up to today.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Period {
    Today,
    Week,
    Month,
}

#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    #[arg(
        long = "start",
        short,
        help = "Start of the range. Examples are \"yesterday\", \"15/03/2025\", \"3 days ago\""
    )]
    start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "End of the range. Examples are \"yesterday\", \"15/03/2025\", \"3 days ago\""
    )]
    end_date: Option<String>,
    #[arg(
        long,
        value_enum,
        conflicts_with_all = ["start_date", "end_date"],
        help = "Period preset instead of explicit dates"
    )]
    period: Option<Period>,
}

/// Turns CLI range input into an inclusive date range. With no input at all
/// the range is just today.
pub fn resolve_range(args: &RangeArgs) -> Result<DateRange> {
    let now = Local::now();
    let today = now.date_naive();

    if let Some(period) = args.period {
        let start = match period {
            Period::Today => today,
            Period::Week => now.beginning_of_week().date_naive(),
            Period::Month => now.beginning_of_month().date_naive(),
        };
        return Ok(DateRange { start, end: today });
    }

    let start = match &args.start_date {
        Some(input) => parse_input_date(input)?,
        None => today,
    };
    let end = match &args.end_date {
        Some(input) => parse_input_date(input)?,
        None => today,
    };
    if end < start {
        bail!("end date {end} precedes start date {start}");
    }
    Ok(DateRange { start, end })
}

fn parse_input_date(input: &str) -> Result<NaiveDate> {
    parse_date_string(input, Local::now(), Dialect::Uk)
        .map(|moment| moment.date_naive())
        .map_err(|e| anyhow!("couldn't parse date {input:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn args(start: Option<&str>, end: Option<&str>, period: Option<Period>) -> RangeArgs {
        RangeArgs {
            start_date: start.map(Into::into),
            end_date: end.map(Into::into),
            period,
        }
    }

    #[test]
    fn defaults_to_today() {
        let range = resolve_range(&args(None, None, None)).unwrap();
        let today = Local::now().date_naive();
        assert_eq!(range, DateRange::single_day(today));
    }

    #[test]
    fn period_presets_end_today() {
        let today = Local::now().date_naive();
        for period in [Period::Today, Period::Week, Period::Month] {
            let range = resolve_range(&args(None, None, Some(period))).unwrap();
            assert_eq!(range.end, today);
            assert!(range.start <= today);
        }
    }

    #[test]
    fn parses_relative_dates() {
        let range = resolve_range(&args(Some("yesterday"), None, None)).unwrap();
        let today = Local::now().date_naive();
        assert_eq!(range.start, today - Duration::days(1));
        assert_eq!(range.end, today);
    }

    #[test]
    fn rejects_inverted_ranges() {
        assert!(resolve_range(&args(Some("today"), Some("yesterday"), None)).is_err());
    }

    #[test]
    fn rejects_unparseable_dates() {
        assert!(resolve_range(&args(Some("not a date"), None, None)).is_err());
    }
}
