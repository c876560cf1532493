use std::sync::Arc;

use crate::{
    query::{
        eval::evaluate_records,
        live::{subscribe, LiveQueryHandle},
        Direction, Field, Filter, Page, RecordQuery,
    },
    store::{checkin::Checkin, collection::CheckinCollection},
};

use super::DateRange;

pub const PAGE_SIZE: usize = 10;

/// One page of check-ins, newest start time first. `count` is the size of the
/// whole filtered set, not of this page.
#[derive(Clone, Debug, PartialEq)]
pub struct Listing {
    pub count: usize,
    pub results: Vec<Checkin>,
}

impl Listing {
    pub fn page_count(&self) -> usize {
        self.count.div_ceil(PAGE_SIZE)
    }
}

/// `page` is 1-based, matching what the routing layer supplies.
pub fn listing_query(range: DateRange, tag: Option<&str>, page: usize) -> RecordQuery {
    let mut filters = range.filters();
    if let Some(tag) = tag {
        filters.push(Filter::TagEquals(tag.to_owned()));
    }
    RecordQuery {
        filters,
        order: vec![(Field::StartTime, Direction::Descending)],
        page: Some(Page {
            limit: PAGE_SIZE,
            offset: page.saturating_sub(1) * PAGE_SIZE,
        }),
    }
}

pub fn evaluate(query: &RecordQuery, snapshot: &[Checkin]) -> Listing {
    let set = evaluate_records(query, snapshot);
    Listing {
        count: set.total,
        results: set.records,
    }
}

pub async fn subscribe_listing(
    collection: Arc<CheckinCollection>,
    range: DateRange,
    tag: Option<&str>,
    page: usize,
) -> LiveQueryHandle<Listing> {
    let query = listing_query(range, tag, page);
    subscribe(collection, move |snapshot| evaluate(&query, snapshot)).await
}
