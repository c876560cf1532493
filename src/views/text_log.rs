use std::{collections::BTreeMap, fmt::Write, sync::Arc};

use chrono::NaiveDate;

use crate::{
    query::{
        eval::evaluate_groups,
        live::{subscribe, LiveQueryHandle},
        Aggregate, Direction, Field, GroupQuery, GroupRow, GroupSortBy, GroupSortKey,
    },
    store::{checkin::Checkin, collection::CheckinCollection},
    utils::time::format_date,
};

use super::DateRange;

/// Hours in a standard working day, used for the going/remaining summary.
pub const FULL_DAY_HOURS: f64 = 8.0;

/// One line of a day's log: every check-in of the day sharing the same tag and
/// activities text, collapsed into a single entry.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub tag: String,
    pub duration: f64,
    pub activities: Vec<String>,
}

/// Date mapped to that day's entries, ordered by earliest start time.
pub type DailyLog = BTreeMap<NaiveDate, Vec<LogEntry>>;

pub fn log_query(range: DateRange) -> GroupQuery {
    GroupQuery {
        filters: range.filters(),
        keys: vec![Field::RecordDate, Field::Tag, Field::Activities],
        aggregates: vec![Aggregate::SumDuration, Aggregate::MinStartTime],
        order: vec![
            GroupSortKey {
                by: GroupSortBy::Key(Field::RecordDate),
                direction: Direction::Ascending,
            },
            GroupSortKey {
                by: GroupSortBy::Aggregate(Aggregate::MinStartTime),
                direction: Direction::Ascending,
            },
        ],
    }
}

pub fn reshape(rows: &[GroupRow]) -> DailyLog {
    let mut log = DailyLog::new();
    for row in rows {
        let (Some(date), Some(tag), Some(activities), Some(duration)) = (
            row.key[0].as_date(),
            row.key[1].as_text(),
            row.key[2].as_text(),
            row.aggregates[0].as_number(),
        ) else {
            continue;
        };
        log.entry(date).or_default().push(LogEntry {
            tag: tag.to_owned(),
            duration,
            activities: activities
                .split(',')
                .map(|a| a.trim().to_owned())
                .filter(|a| !a.is_empty())
                .collect(),
        });
    }
    log
}

pub fn evaluate(query: &GroupQuery, snapshot: &[Checkin]) -> DailyLog {
    reshape(&evaluate_groups(query, snapshot))
}

pub async fn subscribe_log(
    collection: Arc<CheckinCollection>,
    range: DateRange,
) -> LiveQueryHandle<DailyLog> {
    let query = log_query(range);
    subscribe(collection, move |snapshot| evaluate(&query, snapshot)).await
}

pub fn total_hours(log: &DailyLog) -> f64 {
    log.values()
        .flatten()
        .map(|entry| entry.duration)
        .sum()
}

/// The copy-pasteable plain-text form of the log.
pub fn render(log: &DailyLog) -> String {
    let mut text = String::new();
    for (date, entries) in log {
        if entries.is_empty() {
            continue;
        }
        let _ = write!(text, "checkin {}", format_date(*date));
        for entry in entries {
            let _ = write!(
                text,
                "\n  \u{2022} {:.2} {} #{} {}",
                entry.duration,
                if entry.duration == 1.0 { "hr" } else { "hrs" },
                entry.tag,
                entry.activities.join(", "),
            );
        }
        text.push_str("\n\n");
    }
    text
}
