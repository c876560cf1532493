use std::sync::Arc;

use crate::{
    query::{
        eval::evaluate_distinct,
        live::{subscribe, LiveQueryHandle},
        DistinctQuery, Field,
    },
    store::{checkin::Checkin, collection::CheckinCollection},
};

/// Every tag ever used, alphabetical. Backs tag autocompletion, so it has to
/// pick up a new tag the moment a record using it is committed.
pub fn tag_query() -> DistinctQuery {
    DistinctQuery {
        filters: vec![],
        field: Field::Tag,
    }
}

pub fn evaluate(snapshot: &[Checkin]) -> Vec<String> {
    evaluate_distinct(&tag_query(), snapshot)
        .into_iter()
        .filter_map(|value| value.as_text().map(str::to_owned))
        .collect()
}

pub async fn subscribe_tags(collection: Arc<CheckinCollection>) -> LiveQueryHandle<Vec<String>> {
    subscribe(collection, |snapshot| evaluate(snapshot)).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::{
        gateway::normalize_tag,
        store::{
            checkin::CheckinFields,
            collection::CheckinCollection,
            persist::JsonFileStorage,
        },
        utils::clock::Clock,
    };

    use super::*;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn time(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[tokio::test]
    async fn reflects_normalized_tags_as_soon_as_committed() {
        let dir = tempdir().unwrap();
        let collection = Arc::new(
            CheckinCollection::open(
                Box::new(JsonFileStorage::new(dir.path()).unwrap()),
                Box::new(FixedClock(
                    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
                )),
            )
            .await
            .unwrap(),
        );

        let mut handle = subscribe_tags(collection.clone()).await;
        assert!(handle.current().is_empty());

        collection
            .insert(CheckinFields {
                duration: 1.0,
                start_time: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
                record_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                tag: normalize_tag("personal time"),
                activities: "reading".into(),
            })
            .await
            .unwrap();

        assert!(handle.changed().await);
        assert_eq!(*handle.current(), vec!["personal-time".to_owned()]);
    }

    #[test]
    fn deduplicates_and_sorts_alphabetically() {
        use crate::store::checkin::{Checkin, CheckinId};

        let checkin = |tag: &str| Checkin {
            id: CheckinId::generate(),
            created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            modified: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            duration: 1.0,
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            record_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            tag: tag.into(),
            activities: "things".into(),
        };

        let snapshot = vec![checkin("work"), checkin("rest"), checkin("work")];
        assert_eq!(evaluate(&snapshot), vec!["rest".to_owned(), "work".to_owned()]);
    }
}
