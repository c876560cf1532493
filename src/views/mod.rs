//! The concrete consumers of the query engine: paginated listing, grouped
//! daily text log, per-tag statistics, and the distinct-tag cache. Each view
//! is a fixed query shape plus a reshaping of the raw rows into something the
//! presentation layer can display directly.

pub mod listing;
pub mod stats;
pub mod tag_cache;
pub mod text_log;

use chrono::NaiveDate;

use crate::query::Filter;

/// Inclusive calendar-date range supplied by the routing layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn single_day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn filters(&self) -> Vec<Filter> {
        vec![
            Filter::DateOnOrAfter(self.start),
            Filter::DateOnOrBefore(self.end),
        ]
    }
}
