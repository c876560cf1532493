use std::sync::Arc;

use crate::{
    query::{
        eval::evaluate_groups,
        live::{subscribe, LiveQueryHandle},
        Aggregate, Direction, Field, GroupQuery, GroupRow, GroupSortBy, GroupSortKey,
    },
    store::{checkin::Checkin, collection::CheckinCollection},
};

use super::DateRange;

/// One chart point: label is the tag, value the total hours rounded to two
/// decimal places.
#[derive(Clone, Debug, PartialEq)]
pub struct TagStat {
    pub tag: String,
    pub hours: f64,
}

pub fn stats_query(range: DateRange) -> GroupQuery {
    GroupQuery {
        filters: range.filters(),
        keys: vec![Field::Tag],
        aggregates: vec![Aggregate::SumDuration],
        order: vec![GroupSortKey {
            by: GroupSortBy::Aggregate(Aggregate::SumDuration),
            direction: Direction::Ascending,
        }],
    }
}

pub fn reshape(rows: &[GroupRow]) -> Vec<TagStat> {
    rows.iter()
        .filter_map(|row| {
            let tag = row.key[0].as_text()?;
            let hours = row.aggregates[0].as_number()?;
            Some(TagStat {
                tag: tag.to_owned(),
                hours: (hours * 100.0).round() / 100.0,
            })
        })
        .collect()
}

pub fn evaluate(query: &GroupQuery, snapshot: &[Checkin]) -> Vec<TagStat> {
    reshape(&evaluate_groups(query, snapshot))
}

pub async fn subscribe_stats(
    collection: Arc<CheckinCollection>,
    range: DateRange,
) -> LiveQueryHandle<Vec<TagStat>> {
    let query = stats_query(range);
    subscribe(collection, move |snapshot| evaluate(&query, snapshot)).await
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::store::checkin::CheckinId;

    use super::*;

    fn checkin(duration: f64, tag: &str) -> Checkin {
        Checkin {
            id: CheckinId::generate(),
            created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            modified: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            duration,
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            record_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            tag: tag.into(),
            activities: "things".into(),
        }
    }

    #[test]
    fn sums_per_tag_ordered_by_ascending_duration() {
        let snapshot = vec![
            checkin(2.0, "work"),
            checkin(1.5, "work"),
            checkin(1.0, "rest"),
        ];
        let range = DateRange::single_day(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let stats = evaluate(&stats_query(range), &snapshot);
        assert_eq!(
            stats,
            vec![
                TagStat { tag: "rest".into(), hours: 1.0 },
                TagStat { tag: "work".into(), hours: 3.5 },
            ]
        );
    }

    #[test]
    fn rounds_to_two_decimal_places() {
        let snapshot = vec![checkin(1.0 / 3.0, "work")];
        let range = DateRange::single_day(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let stats = evaluate(&stats_query(range), &snapshot);
        assert_eq!(stats[0].hours, 0.33);
    }

    #[test]
    fn empty_period_yields_no_stats() {
        let range = DateRange::single_day(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert!(evaluate(&stats_query(range), &[checkin(1.0, "work")]).is_empty());
    }
}
