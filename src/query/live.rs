//! Live subscriptions: a query result that recomputes itself whenever the
//! collection changes.
//!
//! Each subscription owns an independent materialized result. The store only
//! keeps a broadcast sender towards subscribers, never a reference to them, so
//! dropping the last handle tears the recomputation task down.

use std::sync::Arc;

use tokio::sync::{broadcast::error::RecvError, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use crate::store::{checkin::Checkin, collection::CheckinCollection};

use super::{
    eval::{evaluate_distinct, evaluate_groups, evaluate_records},
    DistinctQuery, GroupQuery, GroupRow, RecordQuery, RecordSet, Value,
};

/// Handle to a continuously updated query result. Every published snapshot is
/// complete and internally consistent; readers never observe a state older
/// than the mutation that triggered the recomputation they were woken for.
#[derive(Clone)]
pub struct LiveQueryHandle<T> {
    rx: watch::Receiver<Arc<T>>,
}

impl<T: Send + Sync + 'static> LiveQueryHandle<T> {
    /// The most recently published result.
    pub fn current(&self) -> Arc<T> {
        self.rx.borrow().clone()
    }

    /// Waits for the next recomputed result. Returns `false` once the
    /// recomputation task has stopped.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// The handle as a stream of result snapshots, starting from the current
    /// one.
    pub fn into_stream(self) -> WatchStream<Arc<T>> {
        WatchStream::new(self.rx)
    }
}

/// Evaluates `evaluate` against the current snapshot, then re-evaluates on
/// every store change, publishing each complete result.
pub async fn subscribe<T, F>(
    collection: Arc<CheckinCollection>,
    evaluate: F,
) -> LiveQueryHandle<T>
where
    T: Send + Sync + 'static,
    F: Fn(&[Checkin]) -> T + Send + 'static,
{
    let mut changes = collection.changes();
    let initial = Arc::new(evaluate(&collection.snapshot().await));
    let (tx, rx) = watch::channel(initial);

    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(event) => debug!("Recomputing live query after {event:?}"),
                Err(RecvError::Lagged(skipped)) => {
                    // fell behind, the latest snapshot still covers everything
                    warn!("Live query lagged behind {skipped} change notifications");
                }
                Err(RecvError::Closed) => break,
            }
            let snapshot = collection.snapshot().await;
            let next = Arc::new(evaluate(&snapshot));
            if tx.send(next).is_err() {
                // every handle is gone
                break;
            }
        }
    });

    LiveQueryHandle { rx }
}

pub async fn subscribe_records(
    collection: Arc<CheckinCollection>,
    query: RecordQuery,
) -> LiveQueryHandle<RecordSet> {
    subscribe(collection, move |snapshot| evaluate_records(&query, snapshot)).await
}

pub async fn subscribe_groups(
    collection: Arc<CheckinCollection>,
    query: GroupQuery,
) -> LiveQueryHandle<Vec<GroupRow>> {
    subscribe(collection, move |snapshot| evaluate_groups(&query, snapshot)).await
}

pub async fn subscribe_distinct(
    collection: Arc<CheckinCollection>,
    query: DistinctQuery,
) -> LiveQueryHandle<Vec<Value>> {
    subscribe(collection, move |snapshot| evaluate_distinct(&query, snapshot)).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use futures::StreamExt;
    use tempfile::tempdir;

    use crate::{
        query::{Direction, Field, Filter, RecordQuery},
        store::{
            checkin::CheckinFields,
            collection::CheckinCollection,
            persist::JsonFileStorage,
        },
        utils::{clock::Clock, logging::TEST_LOGGING},
    };

    use super::*;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn time(&self) -> DateTime<Utc> {
            self.0
        }
    }

    async fn open_collection(dir: &std::path::Path) -> Arc<CheckinCollection> {
        Arc::new(
            CheckinCollection::open(
                Box::new(JsonFileStorage::new(dir).unwrap()),
                Box::new(FixedClock(
                    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
                )),
            )
            .await
            .unwrap(),
        )
    }

    fn fields(tag: &str, hour: u32) -> CheckinFields {
        CheckinFields {
            duration: 1.0,
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            record_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            tag: tag.into(),
            activities: "things".into(),
        }
    }

    fn all_records() -> RecordQuery {
        RecordQuery {
            filters: vec![],
            order: vec![(Field::StartTime, Direction::Descending)],
            page: None,
        }
    }

    #[tokio::test]
    async fn insert_becomes_visible_to_matching_query() {
        *TEST_LOGGING;
        let dir = tempdir().unwrap();
        let collection = open_collection(dir.path()).await;

        let mut handle = subscribe_records(collection.clone(), all_records()).await;
        assert!(handle.current().records.is_empty());

        let id = collection.insert(fields("work", 9)).await.unwrap();
        assert!(handle.changed().await);
        let set = handle.current();
        assert_eq!(set.total, 1);
        assert_eq!(set.records[0].id, id);
    }

    #[tokio::test]
    async fn filtered_query_ignores_non_matching_mutations() {
        let dir = tempdir().unwrap();
        let collection = open_collection(dir.path()).await;

        let query = RecordQuery {
            filters: vec![Filter::TagEquals("work".into())],
            ..all_records()
        };
        let mut handle = subscribe_records(collection.clone(), query).await;

        collection.insert(fields("rest", 9)).await.unwrap();
        // the query still recomputes, the result just stays empty
        assert!(handle.changed().await);
        assert!(handle.current().records.is_empty());
    }

    #[tokio::test]
    async fn delete_disappears_within_one_recomputation() {
        let dir = tempdir().unwrap();
        let collection = open_collection(dir.path()).await;
        let id = collection.insert(fields("work", 9)).await.unwrap();

        let mut handle = subscribe_records(collection.clone(), all_records()).await;
        assert_eq!(handle.current().total, 1);

        collection.delete(&id).await.unwrap();
        assert!(handle.changed().await);
        assert!(handle.current().records.is_empty());
    }

    #[tokio::test]
    async fn stream_yields_current_then_updates() {
        let dir = tempdir().unwrap();
        let collection = open_collection(dir.path()).await;

        let handle = subscribe_records(collection.clone(), all_records()).await;
        let mut stream = handle.into_stream();

        let first = stream.next().await.unwrap();
        assert!(first.records.is_empty());

        collection.insert(fields("work", 9)).await.unwrap();
        let second = stream.next().await.unwrap();
        assert_eq!(second.total, 1);
    }

    #[tokio::test]
    async fn handles_are_independent_snapshots() {
        let dir = tempdir().unwrap();
        let collection = open_collection(dir.path()).await;

        let mut everything = subscribe_records(collection.clone(), all_records()).await;
        let mut only_rest = subscribe_records(
            collection.clone(),
            RecordQuery {
                filters: vec![Filter::TagEquals("rest".into())],
                ..all_records()
            },
        )
        .await;

        collection.insert(fields("work", 9)).await.unwrap();
        collection.insert(fields("rest", 10)).await.unwrap();

        // both mutations may land in a single recomputation or two
        while everything.current().total < 2 {
            assert!(everything.changed().await);
        }
        while only_rest.current().total < 1 {
            assert!(only_rest.changed().await);
        }
        let rest = only_rest.current();
        assert_eq!(rest.total, 1);
        assert_eq!(rest.records[0].tag, "rest");
    }
}
