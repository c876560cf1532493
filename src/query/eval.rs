//! Snapshot evaluation of query descriptors. Always the same pipeline:
//! filter, group, aggregate, order, slice.

use std::collections::BTreeMap;

use crate::store::checkin::Checkin;

use super::{
    Aggregate, DistinctQuery, Field, Filter, GroupQuery, GroupRow, GroupSortBy, RecordQuery,
    RecordSet, Value,
};

pub fn matches(filters: &[Filter], checkin: &Checkin) -> bool {
    filters.iter().all(|filter| match filter {
        Filter::DateOnOrAfter(date) => checkin.record_date >= *date,
        Filter::DateOnOrBefore(date) => checkin.record_date <= *date,
        Filter::TagEquals(tag) => checkin.tag == *tag,
    })
}

fn field_value(checkin: &Checkin, field: Field) -> Value {
    match field {
        Field::RecordDate => Value::Date(checkin.record_date),
        Field::StartTime => Value::Time(checkin.start_time),
        Field::Duration => Value::Number(checkin.duration),
        Field::Tag => Value::Text(checkin.tag.clone()),
        Field::Activities => Value::Text(checkin.activities.clone()),
    }
}

pub fn evaluate_records(query: &RecordQuery, snapshot: &[Checkin]) -> RecordSet {
    let mut filtered: Vec<&Checkin> = snapshot
        .iter()
        .filter(|c| matches(&query.filters, c))
        .collect();
    let total = filtered.len();

    // sort_by is stable, ties keep their relative order
    filtered.sort_by(|a, b| {
        query
            .order
            .iter()
            .map(|(field, direction)| {
                direction.apply(field_value(a, *field).cmp(&field_value(b, *field)))
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let records = match query.page {
        Some(page) => filtered
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect(),
        None => filtered.into_iter().cloned().collect(),
    };

    RecordSet { total, records }
}

pub fn evaluate_groups(query: &GroupQuery, snapshot: &[Checkin]) -> Vec<GroupRow> {
    let mut groups: BTreeMap<Vec<Value>, Vec<&Checkin>> = BTreeMap::new();
    for checkin in snapshot.iter().filter(|c| matches(&query.filters, c)) {
        let key: Vec<Value> = query
            .keys
            .iter()
            .map(|field| field_value(checkin, *field))
            .collect();
        groups.entry(key).or_default().push(checkin);
    }

    let mut rows: Vec<GroupRow> = groups
        .into_iter()
        .map(|(key, members)| GroupRow {
            key,
            aggregates: query
                .aggregates
                .iter()
                .map(|aggregate| evaluate_aggregate(*aggregate, &members))
                .collect(),
        })
        .collect();

    rows.sort_by(|a, b| {
        query
            .order
            .iter()
            .map(|sort| {
                let ordering = match sort.by {
                    GroupSortBy::Key(field) => {
                        match query.keys.iter().position(|k| *k == field) {
                            Some(i) => a.key[i].cmp(&b.key[i]),
                            None => std::cmp::Ordering::Equal,
                        }
                    }
                    GroupSortBy::Aggregate(aggregate) => {
                        match query.aggregates.iter().position(|k| *k == aggregate) {
                            Some(i) => a.aggregates[i].cmp(&b.aggregates[i]),
                            None => std::cmp::Ordering::Equal,
                        }
                    }
                };
                sort.direction.apply(ordering)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    rows
}

fn evaluate_aggregate(aggregate: Aggregate, members: &[&Checkin]) -> Value {
    match aggregate {
        Aggregate::SumDuration => {
            Value::Number(members.iter().map(|c| c.duration).sum())
        }
        Aggregate::MinStartTime => Value::Time(
            members
                .iter()
                .map(|c| c.start_time)
                .min()
                .expect("groups are built from at least one record"),
        ),
    }
}

pub fn evaluate_distinct(query: &DistinctQuery, snapshot: &[Checkin]) -> Vec<Value> {
    let mut values: Vec<Value> = snapshot
        .iter()
        .filter(|c| matches(&query.filters, c))
        .map(|c| field_value(c, query.field))
        .collect();
    values.sort();
    values.dedup();
    values
}
