//! Declarative queries over the check-in collection.
//!
//! A query names its filters, shape, and ordering up front; [eval] turns a
//! descriptor plus a store snapshot into a result, and [live] keeps a result
//! continuously up to date as the store mutates.

pub mod eval;
pub mod live;

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};

use crate::store::checkin::Checkin;

/// A raw record field a query can reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    RecordDate,
    StartTime,
    Duration,
    Tag,
    Activities,
}

/// Conjunctive filter predicates, evaluated on raw record fields.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    DateOnOrAfter(NaiveDate),
    DateOnOrBefore(NaiveDate),
    TagEquals(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

/// Aggregate functions applied per group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregate {
    SumDuration,
    MinStartTime,
}

/// Sort key of a grouped query: either one of the grouping key fields or one
/// of the computed aggregates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupSortBy {
    Key(Field),
    Aggregate(Aggregate),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupSortKey {
    pub by: GroupSortBy,
    pub direction: Direction,
}

/// Final slicing step of a record query, applied after ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

/// Filtered, ordered, optionally paginated whole-record query.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordQuery {
    pub filters: Vec<Filter>,
    pub order: Vec<(Field, Direction)>,
    pub page: Option<Page>,
}

/// Filtered query partitioned by a key tuple, with per-group aggregates.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupQuery {
    pub filters: Vec<Filter>,
    pub keys: Vec<Field>,
    pub aggregates: Vec<Aggregate>,
    pub order: Vec<GroupSortKey>,
}

/// Deduplicated projection of a single column across the filtered set.
#[derive(Clone, Debug, PartialEq)]
pub struct DistinctQuery {
    pub filters: Vec<Filter>,
    pub field: Field,
}

/// A projected or aggregated column value. Orderable across values of the
/// same variant; the engine never compares values of different variants
/// within one query.
#[derive(Clone, Debug)]
pub enum Value {
    Date(NaiveDate),
    Time(DateTime<Utc>),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Time(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Date(_) => 0,
            Value::Time(_) => 1,
            Value::Number(_) => 2,
            Value::Text(_) => 3,
        }
    }
}

// equality must agree with the total order below, which a derived f64 `==`
// would not for NaN
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One result row of a [GroupQuery]: the group's key values in declaration
/// order, followed by its aggregate values in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupRow {
    pub key: Vec<Value>,
    pub aggregates: Vec<Value>,
}

/// Result of a [RecordQuery]. `total` counts the filtered set before
/// pagination, which is what drives page-count displays.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSet {
    pub total: usize,
    pub records: Vec<Checkin>,
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::Value;

    #[test]
    fn value_equality_agrees_with_its_ordering() {
        let nan = Value::Number(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(nan.cmp(&Value::Number(1.0)), Ordering::Greater);
        // total_cmp distinguishes the zero signs
        assert_ne!(Value::Number(-0.0), Value::Number(0.0));
    }
}
